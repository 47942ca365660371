//! Core orientation-fixing engine for rotator.
//!
//! This crate exposes discovery, classification, correction and reporting
//! used by the CLI. The pipeline depends only on the
//! [`OrientationClassifier`] trait so the model can be swapped or stubbed.

pub mod classifier;
pub mod discovery;
pub mod operations;
pub mod pipeline;
pub mod progress;
pub mod reporting;
pub mod rotation;

pub use classifier::{
    ClassifierError, ConfigError, ModelConfig, ModelInputSpec, OrientationClassifier,
    RotatorConfig, DEFAULT_MODEL_ID,
};
pub use discovery::{
    discover, is_supported_image, DiscoveryConfig, DiscoveryError, ImageFile, SUPPORTED_EXTENSIONS,
};
pub use operations::{apply_correction, backup_path, is_backup_path, MutationError};
pub use pipeline::{FileState, PipelineConfig, ProcessingOutcome, RotationPipeline};
pub use reporting::{
    print_summary, write_json, ReportLine, ReportingError, RunReporter, RunSummary,
};
pub use rotation::Rotation;

#[cfg(feature = "onnx")]
pub use classifier::{init_ort_runtime, OnnxOrientationClassifier};
