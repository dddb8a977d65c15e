//! Error types for the converter module.

use thiserror::Error;

use crate::assets::AssetError;
use crate::engine::EngineError;

/// Why a conversion produced no files.
///
/// Callers get exactly one of: the output files, `UNSUPPORTEDFORMAT` or
/// `EXECUTIONERROR`. The underlying cause travels only in `reason` and logs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConvertError {
    /// The input MIME type is not in the registry.
    #[error("UNSUPPORTEDFORMAT")]
    UnsupportedFormat { mime: String },

    /// Staging, execution or output collection failed.
    #[error("EXECUTIONERROR")]
    Execution { reason: String },
}

impl ConvertError {
    /// Creates a new execution error.
    pub fn execution(reason: impl Into<String>) -> Self {
        Self::Execution {
            reason: reason.into(),
        }
    }

    /// Wire code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnsupportedFormat { .. } => "UNSUPPORTEDFORMAT",
            Self::Execution { .. } => "EXECUTIONERROR",
        }
    }

    /// Human readable detail, for diagnostics only.
    pub fn detail(&self) -> String {
        match self {
            Self::UnsupportedFormat { mime } => format!("unsupported input type: {}", mime),
            Self::Execution { reason } => reason.clone(),
        }
    }
}

/// Errors that can occur while setting up a converter.
#[derive(Debug, Error)]
pub enum SetupError {
    /// An engine asset could not be fetched.
    #[error("Failed to fetch engine asset {path}: {source}")]
    AssetFetch {
        path: String,
        #[source]
        source: AssetError,
    },

    /// The engine refused to load.
    #[error("Failed to load engine: {0}")]
    EngineLoad(#[source] EngineError),

    /// A pool needs at least one converter.
    #[error("Converter pool size must be at least 1")]
    EmptyPool,
}
