//! Testing utilities and mock implementations.
//!
//! Lets the converter be exercised end to end without an ffmpeg binary or
//! an asset server.
//!
//! # Example
//!
//! ```rust,ignore
//! use local_converter_core::testing::{MemoryAssetSource, MockEngine};
//!
//! let engine = Arc::new(MockEngine::new());
//! let assets = MemoryAssetSource::with_engine_assets();
//!
//! // Configure engine behavior
//! engine.set_frame_count(4);
//! engine.set_exec_error(Some("codec not found"));
//! ```

mod memory_assets;
mod mock_engine;

pub use memory_assets::MemoryAssetSource;
pub use mock_engine::{EngineCall, MockEngine};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::converter::InputFile;

    /// A small GIF input.
    pub fn gif_input(name: &str) -> InputFile {
        InputFile::new(name, "image/gif", b"GIF89a\x01\x00\x01\x00".to_vec())
    }

    /// A small PNG input.
    pub fn png_input(name: &str) -> InputFile {
        InputFile::new(name, "image/png", b"\x89PNG\r\n\x1a\n".to_vec())
    }

    /// An input whose type the registry does not know.
    pub fn pdf_input(name: &str) -> InputFile {
        InputFile::new(name, "application/pdf", b"%PDF-1.7".to_vec())
    }
}
