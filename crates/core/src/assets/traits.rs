//! Trait definitions for asset retrieval.

use async_trait::async_trait;
use bytes::Bytes;

use super::error::AssetError;

/// Relative location of the engine core script.
pub const CORE_ASSET_PATH: &str = "ffmpeg-core/ffmpeg-core.js";

/// Relative location of the engine binary payload.
pub const WASM_ASSET_PATH: &str = "ffmpeg-core/ffmpeg-core.wasm";

/// A source the engine's binary assets can be fetched from.
#[async_trait]
pub trait AssetSource: Send + Sync {
    /// Returns the name of this source implementation.
    fn name(&self) -> &str;

    /// Fetches the asset at `relative_path`.
    async fn fetch(&self, relative_path: &str) -> Result<Bytes, AssetError>;
}
