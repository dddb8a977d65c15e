//! Types exchanged with a transcoding engine.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::assets::{ObjectUrl, ObjectUrlStore};

/// What the engine is loaded from.
#[derive(Debug, Clone)]
pub struct LoadConfig {
    /// Reference to the engine core script.
    pub core_url: ObjectUrl,
    /// Reference to the engine binary payload.
    pub wasm_url: ObjectUrl,
    /// Registry the references resolve against.
    pub urls: ObjectUrlStore,
}

/// An entry returned by `list_dir`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirEntry {
    pub name: String,
    pub is_dir: bool,
}

/// A file exposed to the engine through `mount`.
#[derive(Debug, Clone)]
pub struct MountFile {
    pub name: String,
    pub data: Bytes,
}

/// A log line emitted by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEvent {
    pub message: String,
}

/// Progress of the command currently executing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// Completed fraction, 0.0 - 1.0.
    pub progress: f64,
    /// Media time processed so far in microseconds.
    pub time_us: u64,
}

/// Notifications emitted on the engine's event channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    Log(LogEvent),
    Progress(ProgressEvent),
}
