use super::{
    types::{AssetSourceKind, Config},
    ConfigError,
};

/// Validate configuration
/// Currently validates:
/// - Assets section exists (enforced by serde)
/// - Server port is not 0
/// - Pool holds at least one converter
/// - The selected asset source has its location set
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.converter.pool_size == 0 {
        return Err(ConfigError::ValidationError(
            "converter.pool_size must be at least 1".to_string(),
        ));
    }

    match config.assets.source {
        AssetSourceKind::Http => {
            let base_url = config.assets.base_url.as_deref().unwrap_or_default();
            if base_url.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "assets.base_url is required when assets.source = \"http\"".to_string(),
                ));
            }
        }
        AssetSourceKind::Dir => {
            if config.assets.dir.is_none() {
                return Err(ConfigError::ValidationError(
                    "assets.dir is required when assets.source = \"dir\"".to_string(),
                ));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AssetsConfig, ConverterConfig, ServerConfig};
    use std::path::PathBuf;

    fn http_config() -> Config {
        Config {
            assets: AssetsConfig {
                source: AssetSourceKind::Http,
                base_url: Some("http://localhost:3000".to_string()),
                dir: None,
            },
            server: ServerConfig::default(),
            converter: ConverterConfig::default(),
        }
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(validate_config(&http_config()).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let mut config = http_config();
        config.server.port = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_validate_empty_pool_fails() {
        let mut config = http_config();
        config.converter.pool_size = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("pool_size"));
    }

    #[test]
    fn test_validate_http_requires_base_url() {
        let mut config = http_config();
        config.assets.base_url = None;
        assert!(validate_config(&config).is_err());

        config.assets.base_url = Some("  ".to_string());
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_dir_requires_dir() {
        let mut config = http_config();
        config.assets.source = AssetSourceKind::Dir;
        assert!(validate_config(&config).is_err());

        config.assets.dir = Some(PathBuf::from("./assets"));
        assert!(validate_config(&config).is_ok());
    }
}
