//! Error types for the engine module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors reported by a transcoding engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// An operation was attempted before `load` completed.
    #[error("Engine is not loaded")]
    NotLoaded,

    /// The engine was terminated.
    #[error("Engine has been terminated")]
    Terminated,

    /// An asset reference passed to `load` did not resolve.
    #[error("Engine asset unavailable: {url}")]
    AssetUnavailable { url: String },

    /// FFmpeg binary not found.
    #[error("FFmpeg not found at path: {path}")]
    FfmpegNotFound { path: PathBuf },

    /// A virtual path does not exist.
    #[error("No such file or directory: {path}")]
    NotFound { path: String },

    /// A virtual path escapes the engine's filesystem root.
    #[error("Invalid virtual path: {path}")]
    InvalidPath { path: String },

    /// Command execution failed before an exit code was produced.
    #[error("Execution failed: {reason}")]
    ExecFailed { reason: String },

    /// I/O error inside the engine's filesystem.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Creates a new execution failed error.
    pub fn exec_failed(reason: impl Into<String>) -> Self {
        Self::ExecFailed {
            reason: reason.into(),
        }
    }
}
