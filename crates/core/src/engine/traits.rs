//! Trait definitions for the engine module.

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::broadcast;

use super::error::EngineError;
use super::types::{DirEntry, EngineEvent, LoadConfig, MountFile};

/// A black-box transcoding engine with its own virtual filesystem.
///
/// The engine runs one command at a time. Callers must not interleave two
/// conversions on the same instance.
#[async_trait]
pub trait Engine: Send + Sync {
    /// Returns the name of this engine implementation.
    fn name(&self) -> &str;

    /// Loads the engine from the given asset references.
    async fn load(&self, config: &LoadConfig) -> Result<(), EngineError>;

    /// Subscribes to log and progress events.
    fn subscribe(&self) -> broadcast::Receiver<EngineEvent>;

    async fn create_dir(&self, path: &str) -> Result<(), EngineError>;

    /// Removes an empty directory.
    async fn delete_dir(&self, path: &str) -> Result<(), EngineError>;

    async fn delete_file(&self, path: &str) -> Result<(), EngineError>;

    async fn list_dir(&self, path: &str) -> Result<Vec<DirEntry>, EngineError>;

    async fn write_file(&self, path: &str, data: Bytes) -> Result<(), EngineError>;

    /// Exposes `files` read-only under the existing directory `path`.
    async fn mount(&self, files: &[MountFile], path: &str) -> Result<(), EngineError>;

    /// Detaches whatever was mounted at `path`.
    async fn unmount(&self, path: &str) -> Result<(), EngineError>;

    async fn read_file(&self, path: &str) -> Result<Bytes, EngineError>;

    /// Runs a command and returns its exit code.
    async fn exec(&self, args: &[String]) -> Result<i32, EngineError>;

    /// Stops the engine. Further calls fail with `EngineError::Terminated`.
    fn terminate(&self);
}
