//! Asset source backed by a local directory.

use async_trait::async_trait;
use bytes::Bytes;
use std::path::PathBuf;

use super::error::AssetError;
use super::traits::AssetSource;

/// Reads assets relative to a directory on disk.
pub struct DirAssetSource {
    root: PathBuf,
}

impl DirAssetSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl AssetSource for DirAssetSource {
    fn name(&self) -> &str {
        "dir"
    }

    async fn fetch(&self, relative_path: &str) -> Result<Bytes, AssetError> {
        let path = self
            .root
            .join(relative_path.trim_start_matches("./").trim_start_matches('/'));

        let data = match tokio::fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AssetError::NotFound { path });
            }
            Err(e) => return Err(AssetError::Io(e)),
        };

        if data.is_empty() {
            return Err(AssetError::Empty {
                name: path.display().to_string(),
            });
        }

        Ok(Bytes::from(data))
    }
}
