//! Per-file detect-then-correct loop.
//!
//! Each file moves `Pending -> Predicted -> {Skipped | Corrected | Failed}`.
//! Detection failures degrade to an upright prediction; correction failures are
//! recorded against the file and the run carries on.

use crate::classifier::{ClassifierError, OrientationClassifier};
use crate::operations::{apply_correction, MutationError};
use crate::reporting::{ReportLine, RunReporter, RunSummary};
use crate::rotation::Rotation;
use indicatif::ProgressBar;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Parameters that control how the pipeline treats each file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PipelineConfig {
    pub backup: bool,
    pub dry_run: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            backup: true,
            dry_run: false,
        }
    }
}

impl PipelineConfig {
    pub fn with_backup(mut self, enabled: bool) -> Self {
        self.backup = enabled;
        self
    }

    pub fn with_dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }
}

/// Terminal state of one file.
#[derive(Debug)]
pub enum FileState {
    /// Nothing written: the prediction was upright or the run is a dry run.
    Skipped,
    Corrected,
    Failed(MutationError),
}

#[derive(Debug)]
pub struct ProcessingOutcome {
    pub rotation: Rotation,
    pub state: FileState,
    /// Set when the classifier failed and the file was treated as upright.
    pub detection_error: Option<ClassifierError>,
}

impl ProcessingOutcome {
    pub fn success(&self) -> bool {
        !matches!(self.state, FileState::Failed(_))
    }
}

pub struct RotationPipeline<C> {
    classifier: C,
    config: PipelineConfig,
}

impl<C: OrientationClassifier> RotationPipeline<C> {
    pub fn new(classifier: C, config: PipelineConfig) -> Self {
        Self { classifier, config }
    }

    /// Detects and, unless told otherwise, fixes the orientation of `path`.
    pub fn process(&mut self, path: &Path) -> ProcessingOutcome {
        let (rotation, detection_error) = match self.classifier.classify(path) {
            Ok(rotation) => (rotation, None),
            Err(error) => {
                debug!("treating {} as upright: {}", path.display(), error);
                (Rotation::Upright, Some(error))
            }
        };

        let state = if rotation.is_upright() || self.config.dry_run {
            FileState::Skipped
        } else {
            match apply_correction(path, rotation, self.config.backup) {
                Ok(()) => FileState::Corrected,
                Err(error) => {
                    debug!("failed to correct {}: {}", path.display(), error);
                    FileState::Failed(error)
                }
            }
        };

        debug!("{}: predicted {}, {:?}", path.display(), rotation, state);
        ProcessingOutcome {
            rotation,
            state,
            detection_error,
        }
    }

    /// Processes `paths` in order, one at a time, and returns the totals.
    ///
    /// Per-file failures reach the user only through `reporter`, printed with the
    /// bar suspended.
    pub fn run(
        &mut self,
        paths: &[PathBuf],
        mut reporter: RunReporter,
        progress_bar: &ProgressBar,
    ) -> RunSummary {
        for path in paths {
            let name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            progress_bar.set_message(format!("Processing {}", name));

            let outcome = self.process(path);
            for line in reporter.record(path, &outcome) {
                progress_bar.suspend(|| match line {
                    ReportLine::Stdout(text) => println!("{}", text),
                    ReportLine::Stderr(text) => eprintln!("{}", text),
                });
            }
            progress_bar.inc(1);
        }
        reporter.finish()
    }
}
