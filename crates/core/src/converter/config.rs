//! Options for setting up a converter.

use serde::{Deserialize, Serialize};

/// How the input file reaches the engine's filesystem.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StagingMode {
    /// Copy the bytes in with `write_file`.
    Copy,
    /// Expose the file through a read-only mount.
    #[default]
    Mount,
}

/// Options accepted by `Converter::setup`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SetupOptions {
    /// Forward engine log lines to tracing.
    #[serde(default)]
    pub print_log: bool,

    /// Input staging strategy.
    #[serde(default)]
    pub staging: StagingMode,
}

impl SetupOptions {
    /// Sets whether engine logs are forwarded.
    pub fn with_print_log(mut self, print_log: bool) -> Self {
        self.print_log = print_log;
        self
    }

    /// Sets the staging strategy.
    pub fn with_staging(mut self, staging: StagingMode) -> Self {
        self.staging = staging;
        self
    }
}
