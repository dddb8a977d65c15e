use local_converter_core::{Config, ConverterPool, SanitizedConfig};

/// Shared application state
pub struct AppState {
    config: Config,
    pool: ConverterPool,
}

impl AppState {
    pub fn new(config: Config, pool: ConverterPool) -> Self {
        Self { config, pool }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn pool(&self) -> &ConverterPool {
        &self.pool
    }

    /// Gives the pool back so it can be released on shutdown.
    pub fn into_pool(self) -> ConverterPool {
        self.pool
    }
}
