use crate::pipeline::{FileState, ProcessingOutcome};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use thiserror::Error;

/// Totals for one run, suitable for serialisation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub processed: usize,
    pub rotated: usize,
    pub errors: usize,
    pub dry_run: bool,
}

impl RunSummary {
    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }
}

/// A line destined for the user, split by stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReportLine {
    Stdout(String),
    Stderr(String),
}

/// Accumulates per-file outcomes into a [`RunSummary`].
#[derive(Debug)]
pub struct RunReporter {
    summary: RunSummary,
    verbose: bool,
}

impl RunReporter {
    pub fn new(total: usize, dry_run: bool, verbose: bool) -> Self {
        Self {
            summary: RunSummary {
                total,
                dry_run,
                ..RunSummary::default()
            },
            verbose,
        }
    }

    /// Tallies `outcome` and returns the lines to show for it.
    pub fn record(&mut self, path: &Path, outcome: &ProcessingOutcome) -> Vec<ReportLine> {
        let mut lines = Vec::new();
        if let Some(error) = &outcome.detection_error {
            lines.push(ReportLine::Stderr(format!(
                "Error detecting rotation for {}: {}",
                path.display(),
                error
            )));
        }

        match &outcome.state {
            FileState::Failed(error) => {
                self.summary.errors += 1;
                lines.push(ReportLine::Stderr(format!(
                    "Error rotating {}: {}",
                    path.display(),
                    error
                )));
            }
            FileState::Skipped | FileState::Corrected => {
                self.summary.processed += 1;
                if !outcome.rotation.is_upright() {
                    self.summary.rotated += 1;
                    if self.verbose || self.summary.dry_run {
                        let action = if self.summary.dry_run {
                            "Would rotate"
                        } else {
                            "Rotated"
                        };
                        let name = path
                            .file_name()
                            .map(|name| name.to_string_lossy().into_owned())
                            .unwrap_or_else(|| path.display().to_string());
                        lines.push(ReportLine::Stdout(format!(
                            "  {} {} by {}",
                            action, name, outcome.rotation
                        )));
                    }
                }
            }
        }
        lines
    }

    pub fn finish(self) -> RunSummary {
        self.summary
    }
}

pub fn print_summary(summary: &RunSummary) {
    println!();
    println!("Summary:");
    println!("  Processed: {}/{}", summary.processed, summary.total);
    println!("  Rotated: {}", summary.rotated);
    println!("  Errors: {}", summary.errors);

    if summary.has_errors() {
        println!("{} error(s) occurred during processing", summary.errors);
    } else {
        let action = if summary.dry_run { "would be" } else { "were" };
        println!("{} image(s) {} rotated successfully", summary.rotated, action);
    }
}

#[derive(Serialize)]
struct RunReport<'a> {
    model: &'a str,
    #[serde(flatten)]
    summary: &'a RunSummary,
}

#[derive(Debug, Error)]
pub enum ReportingError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub fn write_json(
    summary: &RunSummary,
    model: &str,
    output_path: &Path,
) -> Result<(), ReportingError> {
    let file = File::create(output_path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, &RunReport { model, summary })?;
    Ok(())
}
