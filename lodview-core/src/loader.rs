//! Asset byte providers

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::error::AssetError;

/// Supplies the raw bytes of a named asset
pub trait AssetLoader: Send + Sync {
    fn load_bytes(&self, path: &str) -> Result<Vec<u8>, AssetError>;
}

/// Reads assets from a directory on disk
#[derive(Debug, Clone)]
pub struct FsLoader {
    base_path: PathBuf,
}

impl FsLoader {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Resolve a relative asset path against the base path
    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_path.join(path)
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

impl AssetLoader for FsLoader {
    fn load_bytes(&self, path: &str) -> Result<Vec<u8>, AssetError> {
        let full_path = self.resolve(Path::new(path));
        if !full_path.is_file() {
            return Err(AssetError::NotFound(full_path));
        }
        let bytes = std::fs::read(&full_path).map_err(|e| AssetError::Io(full_path.clone(), e))?;
        debug!("read {} bytes from {}", bytes.len(), full_path.display());
        Ok(bytes)
    }
}

/// Serves assets from memory, e.g. bytes bundled into the binary
#[derive(Debug, Clone, Default)]
pub struct BundleLoader {
    assets: HashMap<String, Arc<[u8]>>,
}

impl BundleLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, bytes: impl Into<Arc<[u8]>>) {
        self.assets.insert(path.into(), bytes.into());
    }

    pub fn with(mut self, path: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        self.insert(path, bytes);
        self
    }
}

impl AssetLoader for BundleLoader {
    fn load_bytes(&self, path: &str) -> Result<Vec<u8>, AssetError> {
        self.assets
            .get(path)
            .map(|bytes| bytes.to_vec())
            .ok_or_else(|| AssetError::NotFound(PathBuf::from(path)))
    }
}
