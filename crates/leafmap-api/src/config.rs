use std::env;
use std::path::PathBuf;

use leafmap_core::config::LayeredConfig;
use leafmap_core::Result;

/// API server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub port: u16,
    pub cors_origin: String,
    /// Optional TOML file layered under the environment
    pub config_file: Option<PathBuf>,
    /// Serve from local GeoJSON files instead of the remote scoring service
    pub data_dir: Option<PathBuf>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            port: 3001,
            cors_origin: "http://localhost:3000".to_string(),
            config_file: None,
            data_dir: None,
        }
    }
}

impl ApiConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let port = env::var("LEAFMAP_PORT").ok().and_then(|p| p.parse().ok()).unwrap_or(defaults.port);

        let cors_origin = env::var("LEAFMAP_CORS_ORIGIN").unwrap_or(defaults.cors_origin);

        let config_file = env::var("LEAFMAP_CONFIG").ok().filter(|p| !p.trim().is_empty()).map(PathBuf::from);

        let data_dir = env::var("LEAFMAP_DATA_DIR").ok().filter(|p| !p.trim().is_empty()).map(PathBuf::from);

        Self { port, cors_origin, config_file, data_dir }
    }

    /// Get the server bind address
    pub fn bind_address(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }

    pub fn uses_memory_backend(&self) -> bool {
        self.data_dir.is_some()
    }

    /// Session configuration: defaults, then the config file, then the environment
    pub fn session_config(&self) -> Result<LayeredConfig> {
        let mut config = LayeredConfig::with_defaults();
        if let Some(path) = &self.config_file {
            config = config.load_from_file(path)?;
        }
        Ok(config.load_from_env())
    }
}
