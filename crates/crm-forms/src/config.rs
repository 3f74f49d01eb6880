//! Forms configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::application::rate_limit::RateLimitConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormsConfig {
    /// Platform API the HTTP gateway talks to
    pub api_url: String,
    pub api_key: Option<String>,
    /// Transport timeout for fetch and submit requests
    pub request_timeout_secs: u64,
    /// Default tracing filter when `RUST_LOG` is unset
    pub log_level: String,
    /// Per-form submission rate limit
    pub rate_limit: Option<RateLimitConfig>,
}

impl Default for FormsConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8080/api/v1".into(),
            api_key: None,
            request_timeout_secs: 30,
            log_level: "info".into(),
            rate_limit: Some(RateLimitConfig::default()),
        }
    }
}

impl FormsConfig {
    /// Load from an explicit path, or from the default location if it
    /// exists. A missing default file yields the built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    /// `~/.config/crmforms/config.toml` on Linux, platform equivalent elsewhere
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("crmforms").join("config.toml"))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("cannot serialize config: {0}")]
    Serialize(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = FormsConfig::from_toml(
            r#"
            api_url = "https://crm.example.com/api/v1"

            [rate_limit]
            per_minute = 10
            burst = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.api_url, "https://crm.example.com/api/v1");
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.rate_limit, Some(RateLimitConfig { per_minute: 10, burst: 5 }));
    }

    #[test]
    fn test_round_trip_and_errors() {
        let config = FormsConfig::default();
        let text = config.to_toml().unwrap();
        assert_eq!(FormsConfig::from_toml(&text).unwrap(), config);

        assert!(matches!(FormsConfig::from_toml("request_timeout_secs = \"soon\""), Err(ConfigError::Parse(_))));
        assert!(matches!(
            FormsConfig::load(Some(Path::new("/nonexistent/crmforms.toml"))),
            Err(ConfigError::Io { .. })
        ));
    }
}
