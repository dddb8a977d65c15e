pub mod assets;
pub mod config;
pub mod converter;
pub mod engine;
pub mod metrics;
pub mod registry;
pub mod testing;

pub use assets::{AssetError, AssetSource, DirAssetSource, HttpAssetSource, ObjectUrlStore};
pub use config::{
    load_config, load_config_from_str, validate_config, AssetSourceKind, Config, ConfigError,
    SanitizedConfig,
};
pub use converter::{
    ConvertError, Converter, ConverterPool, InputFile, ListenerId, OutputFile, ProgressListener,
    SetupError, SetupOptions, StagingMode,
};
pub use engine::{Engine, EngineConfig, EngineError, FfmpegEngine, ProgressEvent};
pub use registry::Format;
