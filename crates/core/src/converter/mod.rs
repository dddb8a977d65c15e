//! Converter module: runs one conversion request against a loaded engine.
//!
//! A [`Converter`] owns one engine instance. Setting it up fetches the engine
//! assets and loads the engine; each [`Converter::execute`] call stages the
//! input in a fresh scratch directory, runs the command built from the
//! format registry, collects what the engine wrote and removes the scratch
//! directory again.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use local_converter_core::assets::HttpAssetSource;
//! use local_converter_core::converter::{Converter, InputFile, SetupOptions};
//! use local_converter_core::engine::FfmpegEngine;
//!
//! let assets = HttpAssetSource::new("http://localhost:8080");
//! let converter = Converter::setup(
//!     Arc::new(FfmpegEngine::with_defaults()),
//!     &assets,
//!     SetupOptions::default(),
//! )
//! .await?;
//!
//! let input = InputFile::new("clip.gif", "image/gif", bytes);
//! for file in converter.execute(input, "image/png").await? {
//!     println!("{} ({} bytes)", file.name, file.size());
//! }
//!
//! converter.release();
//! ```

mod config;
mod error;
mod instance;
mod listeners;
mod pool;
mod staging;
mod types;

pub use config::{SetupOptions, StagingMode};
pub use error::{ConvertError, SetupError};
pub use instance::{Converter, ENGINE_LOG_TARGET};
pub use listeners::{ListenerId, ListenerSet, ProgressListener};
pub use pool::ConverterPool;
pub use staging::{stager_for, CopyStager, InputStager, MountStager};
pub use types::{ConversionJob, InputFile, OutputFile, INPUT_DIR};
