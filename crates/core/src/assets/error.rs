//! Error types for asset retrieval.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while fetching engine assets.
#[derive(Debug, Error)]
pub enum AssetError {
    /// The asset request failed before a response arrived.
    #[error("Failed to request asset {url}: {reason}")]
    Request { url: String, reason: String },

    /// The server answered with a non-success status.
    #[error("Asset {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// The asset file does not exist in the asset directory.
    #[error("Asset not found: {path}")]
    NotFound { path: PathBuf },

    /// The asset was retrieved but is empty.
    #[error("Asset is empty: {name}")]
    Empty { name: String },

    /// I/O error while reading an asset.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
