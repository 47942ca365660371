//! Orientation classification.
//!
//! The pipeline only depends on [`OrientationClassifier`]; the ONNX-backed
//! implementation lives behind the `onnx` feature.
//!
//! # Configuration
//!
//! Models can be configured via a TOML file (`rotator.toml`):
//!
//! ```toml
//! models_dir = ".vendor/models"
//! default_model = "swsl_resnext50_32x4d"
//!
//! [models.swsl_resnext50_32x4d]
//! name = "ResNeXt50 32x4d (SWSL)"
//! path = "swsl_resnext50_32x4d.onnx"
//! ```
//!
//! # Runtime Initialization
//!
//! The ONNX Runtime library is loaded dynamically. [`init_ort_runtime`] must
//! succeed once before an [`OnnxOrientationClassifier`] is built; the
//! constructor takes care of that when given a [`RotatorConfig`].

mod config;
mod models;
#[cfg(feature = "onnx")]
mod orientation;
#[cfg(feature = "onnx")]
mod runtime;

pub use config::{ConfigError, ModelConfig, ModelInputSpec, RotatorConfig, DEFAULT_CONFIG_FILE};
pub use models::{builtin_model_registry, DEFAULT_MODEL_ID};
#[cfg(feature = "onnx")]
pub use orientation::OnnxOrientationClassifier;
#[cfg(feature = "onnx")]
pub use runtime::{init_ort_runtime, load_session, preprocess_image};

use crate::rotation::Rotation;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Predicts how far an image is turned away from upright.
pub trait OrientationClassifier {
    fn classify(&mut self, image_path: &Path) -> Result<Rotation, ClassifierError>;
}

/// Errors that can occur while loading or running a classifier.
#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("model not found: {}", .0.display())]
    ModelNotFound(PathBuf),
    #[error("ONNX Runtime library not found at {}", .0.display())]
    RuntimeNotFound(PathBuf),
    #[error("failed to decode {}: {source}", .path.display())]
    Decode {
        source: image::ImageError,
        path: PathBuf,
    },
    #[error("model produced {actual} scores, expected {expected}")]
    UnexpectedOutput { expected: usize, actual: usize },
    #[error("ONNX runtime error: {0}")]
    Runtime(String),
    #[error("processing error: {0}")]
    Processing(String),
}

/// Maps raw model scores to a rotation by picking the highest-scoring class.
pub fn rotation_from_scores(scores: &[f32]) -> Result<Rotation, ClassifierError> {
    if scores.len() != Rotation::CLASSES.len() {
        return Err(ClassifierError::UnexpectedOutput {
            expected: Rotation::CLASSES.len(),
            actual: scores.len(),
        });
    }
    let index = argmax(scores).ok_or_else(|| {
        ClassifierError::Processing("model scores contain no comparable values".to_string())
    })?;
    Rotation::from_class_index(index).ok_or(ClassifierError::UnexpectedOutput {
        expected: Rotation::CLASSES.len(),
        actual: index + 1,
    })
}

fn argmax(scores: &[f32]) -> Option<usize> {
    scores
        .iter()
        .enumerate()
        .filter(|(_, score)| !score.is_nan())
        .fold(None, |best: Option<(usize, f32)>, (index, &score)| match best {
            Some((_, top)) if top >= score => best,
            _ => Some((index, score)),
        })
        .map(|(index, _)| index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn highest_score_selects_rotation() {
        assert_eq!(
            rotation_from_scores(&[0.1, 0.7, 0.1, 0.1]).unwrap(),
            Rotation::Clockwise90
        );
        assert_eq!(
            rotation_from_scores(&[-2.0, -1.0, -3.0, 4.5]).unwrap(),
            Rotation::Clockwise270
        );
    }

    #[test]
    fn ties_resolve_to_lowest_class() {
        assert_eq!(
            rotation_from_scores(&[0.5, 0.5, 0.0, 0.0]).unwrap(),
            Rotation::Upright
        );
    }

    #[test]
    fn wrong_score_count_is_rejected() {
        let error = rotation_from_scores(&[0.2, 0.8]).unwrap_err();
        assert!(matches!(
            error,
            ClassifierError::UnexpectedOutput {
                expected: 4,
                actual: 2
            }
        ));
    }

    #[test]
    fn nan_scores_are_ignored() {
        assert_eq!(
            rotation_from_scores(&[f32::NAN, 0.1, 0.9, 0.0]).unwrap(),
            Rotation::Clockwise180
        );
        assert!(rotation_from_scores(&[f32::NAN; 4]).is_err());
    }
}
