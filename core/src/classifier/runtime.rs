//! ONNX Runtime wrapper and shared utilities.

use super::config::ModelInputSpec;
use super::ClassifierError;
use image::imageops::FilterType;
use image::ImageReader;
use ndarray::{Array, Array4, Axis};
use ort::session::{builder::GraphOptimizationLevel, Session};
use std::path::Path;
use std::sync::OnceLock;
use tracing::debug;

impl From<ort::Error> for ClassifierError {
    fn from(error: ort::Error) -> Self {
        Self::Runtime(error.to_string())
    }
}

/// Global flag to track if ORT runtime has been initialized.
static ORT_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize the ONNX Runtime with the path to the dynamic library.
///
/// Idempotent: later calls after a successful initialization are no-ops.
pub fn init_ort_runtime(dylib_path: impl AsRef<Path>) -> Result<(), ClassifierError> {
    let path = dylib_path.as_ref();

    if ORT_INITIALIZED.get().is_some() {
        return Ok(());
    }

    if !path.exists() {
        return Err(ClassifierError::RuntimeNotFound(path.to_path_buf()));
    }

    let path_str = path.to_str().ok_or_else(|| {
        ClassifierError::Processing("ONNX Runtime path contains invalid UTF-8".to_string())
    })?;

    ort::init_from(path_str)
        .commit()
        .map_err(ClassifierError::from)?;

    let _ = ORT_INITIALIZED.set(());
    debug!("initialized ONNX Runtime from {}", path.display());
    Ok(())
}

/// Load an ONNX session from a model file.
pub fn load_session(model_path: &Path) -> Result<Session, ClassifierError> {
    if !model_path.exists() {
        return Err(ClassifierError::ModelNotFound(model_path.to_path_buf()));
    }

    Session::builder()
        .map_err(ClassifierError::from)?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .map_err(ClassifierError::from)?
        .with_intra_threads(4)
        .map_err(ClassifierError::from)?
        .commit_from_file(model_path)
        .map_err(ClassifierError::from)
}

/// Decode an image and turn it into a normalized `[1, 3, size, size]` tensor.
pub fn preprocess_image(
    image_path: &Path,
    input: &ModelInputSpec,
) -> Result<Array4<f32>, ClassifierError> {
    let decode_error = |source: image::ImageError| ClassifierError::Decode {
        source,
        path: image_path.to_path_buf(),
    };
    let image = ImageReader::open(image_path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(|error| decode_error(image::ImageError::IoError(error)))?
        .decode()
        .map_err(decode_error)?;

    let resized = image
        .resize_exact(input.size, input.size, FilterType::Triangle)
        .to_rgb8();
    let side = input.size as usize;
    let data: Vec<f32> = resized
        .pixels()
        .flat_map(|pixel| pixel.0.map(|value| value as f32 / 255.0))
        .collect();

    tensor_from_hwc(data, side, input.mean, input.std)
}

/// Converts interleaved RGB values in [0, 1] to a normalized NCHW tensor.
fn tensor_from_hwc(
    data: Vec<f32>,
    side: usize,
    mean: [f32; 3],
    std: [f32; 3],
) -> Result<Array4<f32>, ClassifierError> {
    let hwc = Array::from_shape_vec((side, side, 3), data)
        .map_err(|e| ClassifierError::Processing(e.to_string()))?;

    // HWC -> CHW, then add the batch dimension
    let mut nchw = hwc
        .permuted_axes([2, 0, 1])
        .insert_axis(Axis(0))
        .as_standard_layout()
        .into_owned();
    for c in 0..3 {
        nchw.slice_mut(ndarray::s![0, c, .., ..])
            .mapv_inplace(|v| (v - mean[c]) / std[c]);
    }
    Ok(nchw)
}
