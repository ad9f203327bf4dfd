//! Client configuration.
//!
//! Values come from, in increasing priority: built-in defaults, an optional
//! TOML/JSON/YAML file, and `VIGOR_`-prefixed environment variables
//! (`VIGOR_BASE_URL`, `VIGOR_REQUEST_TIMEOUT_MS`, ...).

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;
use vigor_application::{ClientSettings, REFRESH_PATH, TokenTtl};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A source could not be read or deserialized.
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// A value was read but is not usable.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Settings for the admin client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Backend origin, without the version segment.
    pub base_url: String,
    /// Version segment inserted after the origin.
    pub api_version: String,
    /// Timeout for ordinary calls.
    pub request_timeout_ms: u64,
    /// Timeout for the refresh-token exchange.
    pub refresh_timeout_ms: u64,
    /// Lifetime of a stored access token.
    pub access_token_ttl_secs: i64,
    /// Lifetime of a stored refresh token.
    pub refresh_token_ttl_secs: i64,
    /// Lifetime of a captured resume location.
    pub resume_ttl_secs: i64,
    /// Session file.
    pub storage_path: PathBuf,
    /// `User-Agent` header value.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            api_version: "v1".to_string(),
            request_timeout_ms: 10_000,
            refresh_timeout_ms: 5_000,
            access_token_ttl_secs: 86_400,
            refresh_token_ttl_secs: 604_800,
            resume_ttl_secs: 600,
            storage_path: default_storage_path(),
            user_agent: concat!("VigorAdmin/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

fn default_storage_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("vigor-admin")
        .join("session.json")
}

impl ClientConfig {
    /// Loads defaults, then `file` if given, then the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a source cannot be read or the result is invalid.
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Some(path) = file {
            builder = builder.add_source(File::from(path));
        }

        builder = builder.add_source(
            Environment::with_prefix("VIGOR")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Checks values the type system cannot.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` naming the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.base_url()?;
        if self.api_version.trim_matches('/').is_empty() {
            return Err(ConfigError::Invalid("api_version must not be empty".to_string()));
        }
        for (name, value) in [
            ("request_timeout_ms", self.request_timeout_ms),
            ("refresh_timeout_ms", self.refresh_timeout_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::Invalid(format!("{name} must be positive")));
            }
        }
        for (name, value) in [
            ("access_token_ttl_secs", self.access_token_ttl_secs),
            ("refresh_token_ttl_secs", self.refresh_token_ttl_secs),
            ("resume_ttl_secs", self.resume_ttl_secs),
        ] {
            if value <= 0 {
                return Err(ConfigError::Invalid(format!("{name} must be positive")));
            }
        }
        Ok(())
    }

    /// The parsed backend origin.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` unless `base_url` is an http(s) URL.
    pub fn base_url(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(&self.base_url)
            .map_err(|e| ConfigError::Invalid(format!("base_url {:?}: {e}", self.base_url)))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            scheme => Err(ConfigError::Invalid(format!(
                "base_url must use http or https, not {scheme}"
            ))),
        }
    }

    /// Pipeline timeouts.
    #[must_use]
    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            request_timeout: Duration::from_millis(self.request_timeout_ms),
            refresh_timeout: Duration::from_millis(self.refresh_timeout_ms),
            refresh_path: REFRESH_PATH.to_string(),
        }
    }

    /// Token lifetimes.
    #[must_use]
    pub fn token_ttl(&self) -> TokenTtl {
        TokenTtl {
            access: chrono::Duration::seconds(self.access_token_ttl_secs),
            refresh: chrono::Duration::seconds(self.refresh_token_ttl_secs),
        }
    }

    /// Resume location lifetime.
    #[must_use]
    pub fn resume_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.resume_ttl_secs)
    }
}
