use crate::operations::is_backup_path;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Extensions the pipeline will read and rewrite, compared case-insensitively.
pub const SUPPORTED_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "bmp", "tiff", "tif"];

/// Parameters that control how candidate files are collected.
#[derive(Clone, Debug)]
pub struct DiscoveryConfig {
    pub recursive: bool,
    /// When false, `*.backup.<ext>` artifacts from earlier runs are left out.
    pub include_backups: bool,
}

impl DiscoveryConfig {
    pub fn new(recursive: bool) -> Self {
        Self {
            recursive,
            include_backups: false,
        }
    }

    pub fn with_backups(mut self, enabled: bool) -> Self {
        self.include_backups = enabled;
        self
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self::new(true)
    }
}

/// A candidate path paired with its extension check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageFile {
    pub path: PathBuf,
    pub supported: bool,
}

impl ImageFile {
    pub fn new(path: PathBuf) -> Self {
        let supported = is_supported_image(&path);
        Self { path, supported }
    }
}

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("directory not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
}

pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let lower = ext.to_lowercase();
            SUPPORTED_EXTENSIONS.iter().any(|candidate| *candidate == lower)
        })
        .unwrap_or(false)
}

/// Collects every supported image under `root`, sorted lexicographically.
///
/// Unreadable entries are logged and skipped; only a bad root is an error.
pub fn discover(root: &Path, config: &DiscoveryConfig) -> Result<Vec<PathBuf>, DiscoveryError> {
    if !root.exists() {
        return Err(DiscoveryError::NotFound(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(DiscoveryError::NotADirectory(root.to_path_buf()));
    }

    let mut walker = WalkDir::new(root).min_depth(1).sort_by_file_name();
    if !config.recursive {
        walker = walker.max_depth(1);
    }

    let mut images: Vec<PathBuf> = walker
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(error) => {
                warn!("skipping unreadable entry: {}", error);
                None
            }
        })
        .filter(|entry| entry.path().is_file())
        .map(|entry| ImageFile::new(entry.into_path()))
        .filter(|file| file.supported)
        .filter(|file| config.include_backups || !is_backup_path(&file.path))
        .map(|file| file.path)
        .collect();

    images.sort();
    debug!("discovered {} image(s) under {}", images.len(), root.display());
    Ok(images)
}
