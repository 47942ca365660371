//! In-place orientation fixes with optional backup-before-overwrite.

use crate::rotation::Rotation;
use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, DynamicImage, ImageFormat, ImageReader};
use std::borrow::Cow;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Marker inserted before the final extension of a preserved original.
pub const BACKUP_MARKER: &str = "backup";

/// JPEG quality used when rewriting corrected images.
pub const JPEG_QUALITY: u8 = 95;

#[derive(Debug, Error)]
pub enum MutationError {
    #[error("failed to back up {} to {}: {source}", .path.display(), .backup.display())]
    Backup {
        source: std::io::Error,
        path: PathBuf,
        backup: PathBuf,
    },
    #[error("failed to decode {}: {source}", .path.display())]
    Decode {
        source: image::ImageError,
        path: PathBuf,
    },
    #[error("failed to encode {}: {source}", .path.display())]
    Encode {
        source: image::ImageError,
        path: PathBuf,
    },
    #[error("failed to write {}: {source}", .path.display())]
    Io {
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("no output format for {}", .0.display())]
    UnsupportedFormat(PathBuf),
}

/// Returns the sibling path that holds the pre-correction copy: `foo.jpg` -> `foo.backup.jpg`.
pub fn backup_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut name = format!("{}.{}", stem, BACKUP_MARKER);
    if let Some(ext) = path.extension() {
        name.push('.');
        name.push_str(&ext.to_string_lossy());
    }
    path.with_file_name(name)
}

/// Checks whether `path` is itself a backup artifact.
pub fn is_backup_path(path: &Path) -> bool {
    path.file_stem()
        .and_then(|stem| Path::new(stem).extension())
        .and_then(|marker| marker.to_str())
        .map(|marker| marker == BACKUP_MARKER)
        .unwrap_or(false)
}

/// Rewrites `path` so its content is upright.
///
/// The corrected bytes are produced before anything on disk changes, so a file
/// that cannot be decoded or re-encoded is left where it was. With `backup` set,
/// the original is then renamed to its backup path unless a backup already
/// exists, in which case the existing backup is left alone. An upright rotation
/// touches nothing.
pub fn apply_correction(
    path: &Path,
    rotation: Rotation,
    backup: bool,
) -> Result<(), MutationError> {
    if rotation.is_upright() {
        return Ok(());
    }

    let format = ImageFormat::from_path(path)
        .map_err(|_| MutationError::UnsupportedFormat(path.to_path_buf()))?;
    let image = load(path)?;
    let corrected = rotation.correct(&image);
    let bytes = encode(&corrected, format, path)?;

    if backup {
        prepare_backup(path)?;
    }
    fs::write(path, bytes).map_err(|source| MutationError::Io {
        source,
        path: path.to_path_buf(),
    })?;

    debug!(
        "rewrote {} turned {}° counter-clockwise",
        path.display(),
        rotation.correction_degrees()
    );
    Ok(())
}

fn prepare_backup(path: &Path) -> Result<(), MutationError> {
    let backup = backup_path(path);
    if backup.exists() {
        debug!("backup {} already present, keeping it", backup.display());
        return Ok(());
    }
    fs::rename(path, &backup).map_err(|source| MutationError::Backup {
        source,
        path: path.to_path_buf(),
        backup,
    })
}

fn load(source: &Path) -> Result<DynamicImage, MutationError> {
    let decode_error = |error: image::ImageError| MutationError::Decode {
        source: error,
        path: source.to_path_buf(),
    };
    ImageReader::open(source)
        .map_err(|error| MutationError::Io {
            source: error,
            path: source.to_path_buf(),
        })?
        .with_guessed_format()
        .map_err(|error| MutationError::Io {
            source: error,
            path: source.to_path_buf(),
        })?
        .decode()
        .map_err(decode_error)
}

fn encode(
    image: &DynamicImage,
    format: ImageFormat,
    path: &Path,
) -> Result<Vec<u8>, MutationError> {
    let encode_error = |error: image::ImageError| MutationError::Encode {
        source: error,
        path: path.to_path_buf(),
    };
    let mut buffer = Cursor::new(Vec::new());
    match format {
        ImageFormat::Jpeg => {
            let rgb = image.to_rgb8();
            JpegEncoder::new_with_quality(&mut buffer, JPEG_QUALITY)
                .encode_image(&rgb)
                .map_err(encode_error)?;
        }
        other => {
            let target = encodable(image, other);
            target.write_to(&mut buffer, other).map_err(encode_error)?;
        }
    }
    Ok(buffer.into_inner())
}

/// Converts `image` to a colour type the encoder for `format` accepts.
fn encodable(image: &DynamicImage, format: ImageFormat) -> Cow<'_, DynamicImage> {
    let color = image.color();
    let eight_bit = color.bytes_per_pixel() == color.channel_count();
    let float = matches!(color, ColorType::Rgb32F | ColorType::Rgba32F);

    let converted = match format {
        ImageFormat::Png | ImageFormat::Tiff if float => {
            DynamicImage::ImageRgba16(image.to_rgba16())
        }
        ImageFormat::Tiff if color == ColorType::La8 => DynamicImage::ImageRgba8(image.to_rgba8()),
        ImageFormat::Tiff if color == ColorType::La16 => {
            DynamicImage::ImageRgba16(image.to_rgba16())
        }
        ImageFormat::Png | ImageFormat::Tiff => return Cow::Borrowed(image),
        ImageFormat::Gif | ImageFormat::Ico if color != ColorType::Rgba8 => {
            DynamicImage::ImageRgba8(image.to_rgba8())
        }
        _ if !eight_bit && color.has_alpha() => DynamicImage::ImageRgba8(image.to_rgba8()),
        _ if !eight_bit => DynamicImage::ImageRgb8(image.to_rgb8()),
        _ => return Cow::Borrowed(image),
    };
    debug!("converting {:?} to {:?} for {:?}", color, converted.color(), format);
    Cow::Owned(converted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayAlphaImage, ImageBuffer, LumaA, Rgb, RgbImage, Rgba};
    use tempfile::tempdir;

    fn write_png(path: &Path, width: u32, height: u32) {
        RgbImage::from_pixel(width, height, Rgb([40, 80, 120]))
            .save(path)
            .unwrap();
    }

    #[test]
    fn backup_path_inserts_marker_before_extension() {
        assert_eq!(
            backup_path(Path::new("dir/foo.jpg")),
            PathBuf::from("dir/foo.backup.jpg")
        );
        assert_eq!(
            backup_path(Path::new("archive.tar.png")),
            PathBuf::from("archive.tar.backup.png")
        );
        assert!(is_backup_path(Path::new("dir/foo.backup.jpg")));
        assert!(!is_backup_path(Path::new("dir/foo.jpg")));
        assert!(!is_backup_path(Path::new("dir/backup.jpg")));
    }

    #[test]
    fn upright_never_touches_the_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("photo.png");
        write_png(&path, 4, 2);
        let before = fs::read(&path).unwrap();

        apply_correction(&path, Rotation::Upright, true).unwrap();

        assert_eq!(fs::read(&path).unwrap(), before);
        assert!(!backup_path(&path).exists());
    }

    #[test]
    fn correction_keeps_backup_and_rotates_original() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("photo.png");
        write_png(&path, 4, 2);
        let before = fs::read(&path).unwrap();

        apply_correction(&path, Rotation::Clockwise90, true).unwrap();

        let backup = backup_path(&path);
        assert_eq!(fs::read(&backup).unwrap(), before);
        let rotated = image::open(&path).unwrap();
        assert_eq!((rotated.width(), rotated.height()), (2, 4));
    }

    #[test]
    fn existing_backup_is_never_clobbered() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("photo.png");
        write_png(&path, 6, 2);
        let backup = backup_path(&path);
        fs::write(&backup, b"earlier backup").unwrap();

        apply_correction(&path, Rotation::Clockwise270, true).unwrap();

        assert_eq!(fs::read(&backup).unwrap(), b"earlier backup");
        let rotated = image::open(&path).unwrap();
        assert_eq!((rotated.width(), rotated.height()), (2, 6));
    }

    #[test]
    fn no_backup_mode_rewrites_in_place() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("photo.jpg");
        RgbImage::from_pixel(8, 4, Rgb([200, 10, 10])).save(&path).unwrap();

        apply_correction(&path, Rotation::Clockwise180, false).unwrap();

        assert!(!backup_path(&path).exists());
        let names: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(names.len(), 1);
        let rotated = image::open(&path).unwrap();
        assert_eq!((rotated.width(), rotated.height()), (8, 4));
    }

    #[test]
    fn undecodable_source_is_left_in_place() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.png");
        fs::write(&path, b"not an image").unwrap();

        let error = apply_correction(&path, Rotation::Clockwise90, true).unwrap_err();

        assert!(matches!(error, MutationError::Decode { .. }));
        assert_eq!(fs::read(&path).unwrap(), b"not an image");
        assert!(!backup_path(&path).exists());
    }

    #[test]
    fn grey_alpha_under_tiff_name_is_rewritten() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scan.tif");
        // PNG content decodes to La8 whatever the extension says.
        let png = dir.path().join("scan.png");
        GrayAlphaImage::from_pixel(6, 2, LumaA([120, 200]))
            .save(&png)
            .unwrap();
        fs::rename(&png, &path).unwrap();
        let before = fs::read(&path).unwrap();

        apply_correction(&path, Rotation::Clockwise90, true).unwrap();

        assert_eq!(fs::read(backup_path(&path)).unwrap(), before);
        let rotated = image::open(&path).unwrap();
        assert_eq!((rotated.width(), rotated.height()), (2, 6));
        assert_eq!(
            rotated.to_rgba8().get_pixel(0, 0),
            &Rgba([120, 120, 120, 200])
        );
    }

    #[test]
    fn encodable_only_converts_what_the_encoder_rejects() {
        let grey_alpha = DynamicImage::ImageLumaA8(GrayAlphaImage::new(2, 2));
        assert_eq!(
            encodable(&grey_alpha, ImageFormat::Tiff).color(),
            ColorType::Rgba8
        );
        assert!(matches!(
            encodable(&grey_alpha, ImageFormat::Png),
            Cow::Borrowed(_)
        ));

        assert!(encode(&grey_alpha, ImageFormat::Tiff, Path::new("x.tif")).is_ok());

        let deep = DynamicImage::ImageRgb16(ImageBuffer::new(2, 2));
        assert_eq!(encodable(&deep, ImageFormat::Bmp).color(), ColorType::Rgb8);
        assert_eq!(encodable(&deep, ImageFormat::Tiff).color(), ColorType::Rgb16);
    }
}
