//! Engine module: the capability contract of the external transcoding
//! engine and an FFmpeg-process implementation of it.
//!
//! The converter never reaches past this trait. Everything codec-related
//! is the engine's business.

mod config;
mod error;
mod ffmpeg;
mod traits;
mod types;

pub use config::EngineConfig;
pub use error::EngineError;
pub use ffmpeg::FfmpegEngine;
pub use traits::Engine;
pub use types::{DirEntry, EngineEvent, LoadConfig, LogEvent, MountFile, ProgressEvent};
