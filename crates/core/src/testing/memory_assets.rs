//! In-memory asset source for testing.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::assets::{AssetError, AssetSource, CORE_ASSET_PATH, WASM_ASSET_PATH};

/// Serves assets from a map. Records every fetched path.
#[derive(Debug, Default)]
pub struct MemoryAssetSource {
    assets: Mutex<HashMap<String, Bytes>>,
    fetched: Mutex<Vec<String>>,
}

impl MemoryAssetSource {
    /// Create an empty source. Every fetch fails.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a source holding placeholder engine assets.
    pub fn with_engine_assets() -> Self {
        let source = Self::new();
        source.insert(CORE_ASSET_PATH, Bytes::from_static(b"// ffmpeg core"));
        source.insert(WASM_ASSET_PATH, Bytes::from_static(b"\0asm\x01\0\0\0"));
        source
    }

    pub fn insert(&self, path: &str, data: impl Into<Bytes>) {
        lock(&self.assets).insert(path.to_string(), data.into());
    }

    pub fn remove(&self, path: &str) {
        lock(&self.assets).remove(path);
    }

    /// Paths requested so far, in order.
    pub fn fetched(&self) -> Vec<String> {
        lock(&self.fetched).clone()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl AssetSource for MemoryAssetSource {
    fn name(&self) -> &str {
        "memory"
    }

    async fn fetch(&self, relative_path: &str) -> Result<Bytes, AssetError> {
        lock(&self.fetched).push(relative_path.to_string());
        lock(&self.assets)
            .get(relative_path)
            .cloned()
            .ok_or_else(|| AssetError::NotFound {
                path: PathBuf::from(relative_path),
            })
    }
}
