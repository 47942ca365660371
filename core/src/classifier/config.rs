//! Configuration for orientation models.
//!
//! Supports loading model configurations from TOML files to allow
//! switching between different exports without recompiling.

use super::models::{builtin_model_registry, DEFAULT_MODEL_ID};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "rotator.toml";

/// Default ImageNet normalization mean (RGB order).
pub const IMAGE_NET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];

/// Default ImageNet normalization standard deviation (RGB order).
pub const IMAGE_NET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Input format requirements for a model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelInputSpec {
    /// Side of the square input in pixels
    #[serde(default = "default_input_size")]
    pub size: u32,
    #[serde(default = "default_mean")]
    pub mean: [f32; 3],
    #[serde(default = "default_std")]
    pub std: [f32; 3],
}

fn default_input_size() -> u32 {
    224
}

fn default_mean() -> [f32; 3] {
    IMAGE_NET_MEAN
}

fn default_std() -> [f32; 3] {
    IMAGE_NET_STD
}

impl Default for ModelInputSpec {
    fn default() -> Self {
        Self {
            size: default_input_size(),
            mean: IMAGE_NET_MEAN,
            std: IMAGE_NET_STD,
        }
    }
}

/// Configuration for a single model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Display name for the model
    pub name: String,
    /// Path to the ONNX model file (relative to models_dir or absolute)
    pub path: PathBuf,
    #[serde(default)]
    pub input: ModelInputSpec,
    #[serde(default)]
    pub description: String,
}

/// Root configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RotatorConfig {
    /// Base directory for model files (default: .vendor/models)
    #[serde(default = "default_models_dir")]
    pub models_dir: PathBuf,

    /// Path to ONNX Runtime library
    #[serde(default = "default_ort_lib")]
    pub ort_library: PathBuf,

    /// Model used when none is given on the command line
    #[serde(default = "default_model_id")]
    pub default_model: String,

    /// Models by ID; entries here replace built-in ones with the same ID.
    #[serde(default)]
    pub models: HashMap<String, ModelConfig>,
}

fn default_models_dir() -> PathBuf {
    PathBuf::from(".vendor/models")
}

fn default_ort_lib() -> PathBuf {
    #[cfg(windows)]
    {
        PathBuf::from(".vendor/onnxruntime/lib/onnxruntime.dll")
    }
    #[cfg(not(windows))]
    {
        PathBuf::from(".vendor/onnxruntime/lib/libonnxruntime.so")
    }
}

fn default_model_id() -> String {
    DEFAULT_MODEL_ID.to_string()
}

impl Default for RotatorConfig {
    fn default() -> Self {
        Self {
            models_dir: default_models_dir(),
            ort_library: default_ort_lib(),
            default_model: default_model_id(),
            models: HashMap::new(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("invalid config TOML in {}: {source}", .path.display())]
    Parse {
        source: toml::de::Error,
        path: PathBuf,
    },
    #[error("unknown model '{id}' (available: {})", .available.join(", "))]
    UnknownModel { id: String, available: Vec<String> },
}

impl RotatorConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            source,
            path: path.to_path_buf(),
        })?;
        Self::parse(&content, path)
    }

    fn parse(content: &str, origin: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            source,
            path: origin.to_path_buf(),
        })
    }

    /// Load from the working directory, then `.vendor/`, falling back to defaults.
    ///
    /// A file that exists but does not parse is an error rather than a silent fallback.
    pub fn load_or_default() -> Result<Self, ConfigError> {
        Self::load_from_candidates(&[
            PathBuf::from(DEFAULT_CONFIG_FILE),
            PathBuf::from(".vendor").join(DEFAULT_CONFIG_FILE),
        ])
    }

    fn load_from_candidates(candidates: &[PathBuf]) -> Result<Self, ConfigError> {
        match candidates.iter().find(|path| path.is_file()) {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Built-in models overlaid with the ones from this configuration.
    pub fn registry(&self) -> HashMap<String, ModelConfig> {
        let mut models = builtin_model_registry();
        for (id, model) in &self.models {
            models.insert(id.clone(), model.clone());
        }
        models
    }

    /// Looks up a model by ID, defaulting to `default_model`.
    pub fn model(&self, id: Option<&str>) -> Result<ModelConfig, ConfigError> {
        let id = id.unwrap_or(&self.default_model);
        let mut registry = self.registry();
        registry.remove(id).ok_or_else(|| {
            let mut available: Vec<String> = registry.into_keys().collect();
            available.sort();
            ConfigError::UnknownModel {
                id: id.to_string(),
                available,
            }
        })
    }

    /// Get the full path to a model file.
    pub fn model_path(&self, model: &ModelConfig) -> PathBuf {
        if model.path.is_absolute() {
            model.path.clone()
        } else {
            self.models_dir.join(&model.path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn defaults_resolve_builtin_model() {
        let config = RotatorConfig::default();
        let model = config.model(None).unwrap();
        assert_eq!(model.input, ModelInputSpec::default());
        assert_eq!(
            config.model_path(&model),
            PathBuf::from(".vendor/models/swsl_resnext50_32x4d.onnx")
        );
    }

    #[test]
    fn unknown_model_lists_available_ids() {
        let config = RotatorConfig::default();
        let error = config.model(Some("missing")).unwrap_err();
        match error {
            ConfigError::UnknownModel { id, available } => {
                assert_eq!(id, "missing");
                assert!(available.contains(&DEFAULT_MODEL_ID.to_string()));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn toml_models_extend_registry() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        fs::write(
            &path,
            r#"
models_dir = "/opt/models"
default_model = "tiny"

[models.tiny]
name = "Tiny"
path = "tiny.onnx"

[models.tiny.input]
size = 128
"#,
        )
        .unwrap();

        let config = RotatorConfig::load(&path).unwrap();
        let model = config.model(None).unwrap();
        assert_eq!(model.input.size, 128);
        assert_eq!(model.input.mean, IMAGE_NET_MEAN);
        assert_eq!(config.model_path(&model), PathBuf::from("/opt/models/tiny.onnx"));
        assert!(config.model(Some(DEFAULT_MODEL_ID)).is_ok());
    }

    #[test]
    fn missing_candidates_fall_back_to_defaults() {
        let dir = tempdir().unwrap();
        let config =
            RotatorConfig::load_from_candidates(&[dir.path().join("absent.toml")]).unwrap();
        assert_eq!(config.default_model, DEFAULT_MODEL_ID);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        fs::write(&path, "models_dir = [").unwrap();
        assert!(matches!(
            RotatorConfig::load_from_candidates(&[path]),
            Err(ConfigError::Parse { .. })
        ));
    }
}
