use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use crate::converter::{SetupOptions, StagingMode};
use crate::engine::EngineConfig;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub assets: AssetsConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub converter: ConverterConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Largest accepted upload, in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    8080
}

fn default_max_upload_bytes() -> usize {
    64 * 1024 * 1024
}

/// Converter configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConverterConfig {
    /// Forward engine log lines to the application log.
    #[serde(default)]
    pub print_log: bool,
    #[serde(default)]
    pub staging: StagingMode,
    /// Number of converters run side by side (default: 2)
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,
    /// Host directory backing the engines' filesystems.
    #[serde(default = "default_scratch_root")]
    pub scratch_root: PathBuf,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            print_log: false,
            staging: StagingMode::default(),
            pool_size: default_pool_size(),
            ffmpeg_path: default_ffmpeg_path(),
            scratch_root: default_scratch_root(),
        }
    }
}

impl ConverterConfig {
    pub fn setup_options(&self) -> SetupOptions {
        SetupOptions::default()
            .with_print_log(self.print_log)
            .with_staging(self.staging)
    }

    /// Engine configuration for pool member `index`. Members get separate
    /// scratch roots.
    pub fn engine_config(&self, index: usize) -> EngineConfig {
        EngineConfig::with_ffmpeg_path(self.ffmpeg_path.clone())
            .with_scratch_root(self.scratch_root.join(format!("engine-{}", index)))
    }
}

fn default_pool_size() -> usize {
    2
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_scratch_root() -> PathBuf {
    std::env::temp_dir().join("local-converter")
}

/// Where the engine assets are fetched from
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AssetsConfig {
    pub source: AssetSourceKind,
    /// Base URL serving `ffmpeg-core/` (required when source = "http")
    #[serde(default)]
    pub base_url: Option<String>,
    /// Directory containing `ffmpeg-core/` (required when source = "dir")
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AssetSourceKind {
    Http,
    Dir,
}

impl AssetSourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetSourceKind::Http => "http",
            AssetSourceKind::Dir => "dir",
        }
    }
}

/// Sanitized config for API responses (URL credentials redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub converter: ConverterConfig,
    pub assets: SanitizedAssetsConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedAssetsConfig {
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            converter: config.converter.clone(),
            assets: SanitizedAssetsConfig {
                source: config.assets.source.as_str().to_string(),
                base_url: config.assets.base_url.as_deref().map(redact_credentials),
                dir: config.assets.dir.clone(),
            },
        }
    }
}

/// Strips user info from a URL. Unparseable URLs are hidden entirely.
fn redact_credentials(url: &str) -> String {
    match reqwest::Url::parse(url) {
        Ok(mut parsed) => {
            if !parsed.username().is_empty() || parsed.password().is_some() {
                // Only fails for cannot-be-a-base URLs, which carry no user info
                let _ = parsed.set_username("");
                let _ = parsed.set_password(None);
            }
            parsed.to_string()
        }
        Err(_) => "<invalid>".to_string(),
    }
}
