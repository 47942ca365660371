//! Rotation detection with a 4-class ONNX model.

use super::config::{ModelConfig, ModelInputSpec, RotatorConfig};
use super::runtime::{init_ort_runtime, load_session, preprocess_image};
use super::{rotation_from_scores, ClassifierError, OrientationClassifier};
use crate::rotation::Rotation;
use ort::session::Session;
use std::path::Path;
use tracing::{debug, info};

/// Orientation classifier backed by an ONNX Runtime session.
pub struct OnnxOrientationClassifier {
    session: Session,
    input: ModelInputSpec,
}

impl OnnxOrientationClassifier {
    /// Load the classifier from an ONNX model file.
    pub fn new(model_path: &Path, input: ModelInputSpec) -> Result<Self, ClassifierError> {
        let session = load_session(model_path)?;
        Ok(Self { session, input })
    }

    /// Initialize the runtime named by `config` and load `model`.
    pub fn from_config(
        config: &RotatorConfig,
        model: &ModelConfig,
    ) -> Result<Self, ClassifierError> {
        init_ort_runtime(&config.ort_library)?;
        let model_path = config.model_path(model);
        let classifier = Self::new(&model_path, model.input.clone())?;
        info!("loaded orientation model {} from {}", model.name, model_path.display());
        Ok(classifier)
    }
}

impl OrientationClassifier for OnnxOrientationClassifier {
    fn classify(&mut self, image_path: &Path) -> Result<Rotation, ClassifierError> {
        let input = preprocess_image(image_path, &self.input)?;

        // Get input name from model
        let input_name = self
            .session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "input".to_string());

        let input_tensor =
            ort::value::Tensor::from_array(input).map_err(ClassifierError::from)?;

        let outputs = self
            .session
            .run(ort::inputs![input_name => input_tensor])
            .map_err(ClassifierError::from)?;

        let output = outputs
            .values()
            .next()
            .ok_or_else(|| ClassifierError::Processing("no output tensor found".into()))?;

        // Output is [1, 4]; softmax would not change the arg-max
        let (_, scores) = output
            .try_extract_tensor::<f32>()
            .map_err(ClassifierError::from)?;

        let rotation = rotation_from_scores(scores)?;
        debug!("{} classified as {}", image_path.display(), rotation);
        Ok(rotation)
    }
}
