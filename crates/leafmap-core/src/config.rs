use crate::error::{LeafError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Where a configuration value was taken from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    Default,
    /// TOML file
    File,
    /// `LEAFMAP_*` variables
    Environment,
}

impl ConfigSource {
    /// Higher wins
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Environment => 2,
        }
    }
}

/// A value tagged with the layer that set it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Update the value if the new source has at least the current precedence
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() >= self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }
}

/// Layered configuration for a dashboard session
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    pub scoring_url: ConfigValue<String>,
    pub request_timeout_secs: ConfigValue<u64>,
    pub default_intervention: ConfigValue<Option<String>>,
}

impl LayeredConfig {
    /// Built-in defaults only
    pub fn with_defaults() -> Self {
        Self {
            scoring_url: ConfigValue::new(
                "http://localhost:5000/api".to_string(),
                ConfigSource::Default,
            ),
            request_timeout_secs: ConfigValue::new(30, ConfigSource::Default),
            default_intervention: ConfigValue::new(None, ConfigSource::Default),
        }
    }

    /// Apply the TOML file layer; any set key is validated
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| LeafError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to read config file: {}", e),
            })?;

        let file_config: FileConfig =
            toml::from_str(&content).map_err(|e| LeafError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to parse TOML: {}", e),
            })?;

        if let Some(url) = file_config.scoring_url {
            self.scoring_url.update(validate_scoring_url(&url)?, ConfigSource::File);
        }

        if let Some(secs) = file_config.request_timeout_secs {
            self.request_timeout_secs.update(secs, ConfigSource::File);
        }

        if let Some(name) = file_config.default_intervention {
            self.default_intervention.update(Some(name), ConfigSource::File);
        }

        Ok(self)
    }

    /// Apply the environment layer; invalid values are skipped with a warning
    pub fn load_from_env(mut self) -> Self {
        // LEAFMAP_SCORING_URL
        if let Ok(url) = env::var("LEAFMAP_SCORING_URL") {
            match validate_scoring_url(&url) {
                Ok(url) => self.scoring_url.update(url, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid LEAFMAP_SCORING_URL value '{}': expected an http(s) URL",
                    url
                ),
            }
        }

        // LEAFMAP_REQUEST_TIMEOUT_SECS
        if let Ok(secs_str) = env::var("LEAFMAP_REQUEST_TIMEOUT_SECS") {
            match secs_str.parse::<u64>() {
                Ok(secs) => self.request_timeout_secs.update(secs, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid LEAFMAP_REQUEST_TIMEOUT_SECS value '{}': expected whole seconds",
                    secs_str
                ),
            }
        }

        // LEAFMAP_DEFAULT_INTERVENTION
        if let Ok(name) = env::var("LEAFMAP_DEFAULT_INTERVENTION") {
            if !name.trim().is_empty() {
                self.default_intervention
                    .update(Some(name.trim().to_string()), ConfigSource::Environment);
            }
        }

        self
    }

    /// Timeout applied to every scoring-service call; `None` when disabled
    pub fn request_timeout(&self) -> Option<Duration> {
        match self.request_timeout_secs.value {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    /// Every value with its source, keyed by setting name
    pub fn to_inspection_map(&self) -> HashMap<String, (String, ConfigSource)> {
        let mut map = HashMap::new();

        map.insert(
            "scoring_url".to_string(),
            (self.scoring_url.value.clone(), self.scoring_url.source),
        );

        map.insert(
            "request_timeout_secs".to_string(),
            (self.request_timeout_secs.value.to_string(), self.request_timeout_secs.source),
        );

        map.insert(
            "default_intervention".to_string(),
            (
                self.default_intervention.value.clone().unwrap_or_else(|| "(first)".to_string()),
                self.default_intervention.source,
            ),
        );

        map
    }
}

impl Default for LayeredConfig {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// On-disk layout of the TOML file
#[derive(Debug, Deserialize, Serialize)]
struct FileConfig {
    scoring_url: Option<String>,
    request_timeout_secs: Option<u64>,
    default_intervention: Option<String>,
}

/// Check that a scoring URL is an http(s) base URL and strip trailing slashes
pub fn validate_scoring_url(url: &str) -> Result<String> {
    let trimmed = url.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        Ok(trimmed.to_string())
    } else {
        Err(LeafError::ConfigInvalid {
            key: "scoring_url".to_string(),
            reason: format!("Invalid scoring URL: {}. Use an http:// or https:// URL", url),
        })
    }
}
