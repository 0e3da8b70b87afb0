//! Configuration management for Cellar

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};

/// File name of the persisted auth record
pub const SESSION_FILE_NAME: &str = "auth-storage.json";

const DEFAULT_BASE_URL: &str = "http://localhost:8080";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

/// Settings for the REST backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Headers attached to every request
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    #[serde(default = "default_image_upload_path")]
    pub image_upload_path: String,

    #[serde(default = "default_login_path")]
    pub login_path: String,

    #[serde(default = "default_register_path")]
    pub register_path: String,

    #[serde(default = "default_refresh_path")]
    pub refresh_path: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Location of the auth record; defaults to the XDG data directory
    pub path: Option<String>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_image_upload_path() -> String {
    "/images/upload".to_string()
}

fn default_login_path() -> String {
    "/auth/login".to_string()
}

fn default_register_path() -> String {
    "/auth/register".to_string()
}

fn default_refresh_path() -> String {
    "/auth/refresh-token".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            headers: BTreeMap::new(),
            image_upload_path: default_image_upload_path(),
            login_path: default_login_path(),
            register_path: default_register_path(),
            refresh_path: default_refresh_path(),
        }
    }
}

impl Config {
    /// Load configuration from the default location
    ///
    /// A missing config file is not an error; defaults are used instead.
    /// `CELLAR_API_URL` overrides `api.base_url` either way.
    pub fn load() -> Result<Self> {
        let config_path = resolve_config_path()?;
        let mut config = if config_path.exists() {
            Self::load_from_path(&config_path)?
        } else {
            tracing::debug!(
                "No config file at {}, using defaults",
                config_path.display()
            );
            Self::default()
        };

        if let Ok(url) = std::env::var("CELLAR_API_URL") {
            let trimmed = url.trim();
            if !trimmed.is_empty() {
                config.api.base_url = trimmed.to_string();
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: Config = toml::from_str(&content).map_err(ConfigError::ParseError)?;
        Ok(config)
    }

    /// Create a configuration pointing at the given backend
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            api: ApiConfig {
                base_url: base_url.into(),
                ..ApiConfig::default()
            },
            session: SessionConfig::default(),
        }
    }

    /// Check that the base URL is an absolute http(s) URL
    pub fn validate(&self) -> Result<()> {
        let url = reqwest::Url::parse(&self.api.base_url).map_err(|e| {
            ConfigError::InvalidValue {
                field: "api.base_url".to_string(),
                reason: e.to_string(),
            }
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidValue {
                field: "api.base_url".to_string(),
                reason: format!("unsupported scheme '{}'", url.scheme()),
            }
            .into());
        }

        Ok(())
    }
}

/// Resolve the configuration file path: `CELLAR_CONFIG`, else `<config_dir>/cellar/config.toml`
pub fn resolve_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("CELLAR_CONFIG") {
        return Ok(PathBuf::from(shellexpand::tilde(&path).to_string()));
    }

    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::MissingField("config directory".to_string()))?;

    Ok(config_dir.join("cellar").join("config.toml"))
}

/// Resolve where the auth record lives
///
/// An explicit path wins (with `~` expanded); otherwise the record sits in
/// the XDG data directory.
pub fn resolve_session_path(path: Option<&str>) -> Result<PathBuf> {
    if let Some(path) = path {
        return Ok(PathBuf::from(shellexpand::tilde(path).to_string()));
    }

    let data_dir = dirs::data_dir()
        .ok_or_else(|| ConfigError::MissingField("data directory".to_string()))?;

    Ok(data_dir.join("cellar").join(SESSION_FILE_NAME))
}
