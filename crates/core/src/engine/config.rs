//! Configuration for the FFmpeg-backed engine.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for [`FfmpegEngine`](super::FfmpegEngine).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Path to ffmpeg binary.
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,

    /// Host directory backing the engine's virtual filesystem.
    #[serde(default = "default_scratch_root")]
    pub scratch_root: PathBuf,

    /// Capacity of the event channel.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_scratch_root() -> PathBuf {
    std::env::temp_dir().join("local-converter")
}

fn default_event_capacity() -> usize {
    256
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            scratch_root: default_scratch_root(),
            event_capacity: default_event_capacity(),
        }
    }
}

impl EngineConfig {
    /// Creates a new config with a custom ffmpeg path.
    pub fn with_ffmpeg_path(ffmpeg_path: PathBuf) -> Self {
        Self {
            ffmpeg_path,
            ..Default::default()
        }
    }

    /// Sets the scratch root.
    pub fn with_scratch_root(mut self, scratch_root: PathBuf) -> Self {
        self.scratch_root = scratch_root;
        self
    }
}
