//! Built-in orientation model registry.

use super::config::{ModelConfig, ModelInputSpec};
use std::collections::HashMap;
use std::path::PathBuf;

/// Model selected when neither the command line nor the config names one.
pub const DEFAULT_MODEL_ID: &str = "swsl_resnext50_32x4d";

/// Build the registry of models known without a config file.
pub fn builtin_model_registry() -> HashMap<String, ModelConfig> {
    builtin_models()
        .into_iter()
        .map(|(id, config)| (id.to_string(), config))
        .collect()
}

fn builtin_models() -> Vec<(&'static str, ModelConfig)> {
    vec![swsl_resnext50_32x4d()]
}

/// ResNeXt50 32x4d fine-tuned for 4-way rotation (0/90/180/270)
fn swsl_resnext50_32x4d() -> (&'static str, ModelConfig) {
    (
        DEFAULT_MODEL_ID,
        ModelConfig {
            name: "ResNeXt50 32x4d (SWSL)".to_string(),
            path: PathBuf::from("swsl_resnext50_32x4d.onnx"),
            input: ModelInputSpec::default(),
            description: "4-class rotation classifier, 224x224 RGB, ImageNet normalization"
                .to_string(),
        },
    )
}
