//! Application configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/notes-api/config.toml)
//! 3. Environment variables (HOST, PORT, NOTES_* prefix)
//!
//! Environment variables take precedence over config file values.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable prefix for notes-specific settings
const ENV_PREFIX: &str = "NOTES";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Interface to listen on
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on (0 lets the OS pick one)
    #[serde(default = "default_port")]
    pub port: u16,

    /// JSON file holding the note collection
    #[serde(default = "default_data_file")]
    pub data_file: PathBuf,

    /// Upper bound on the time spent receiving one request body
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            data_file: default_data_file(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Config {
    /// Load configuration from default location and environment
    ///
    /// Order of precedence (highest to lowest):
    /// 1. Environment variables (HOST, PORT, NOTES_DATA_FILE, NOTES_REQUEST_TIMEOUT_SECS)
    /// 2. Config file (~/.config/notes-api/config.toml or NOTES_CONFIG)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &PathBuf) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            Self::default()
        };

        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(toml_content).context("Failed to parse config TOML")?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) -> Result<()> {
        // HOST
        if let Ok(val) = std::env::var("HOST") {
            if !val.is_empty() {
                self.host = val;
            }
        }

        // PORT
        if let Ok(val) = std::env::var("PORT") {
            if !val.trim().is_empty() {
                self.port = val
                    .trim()
                    .parse()
                    .with_context(|| format!("Invalid PORT value: {:?}", val))?;
            }
        }

        // NOTES_DATA_FILE
        if let Ok(val) = std::env::var(format!("{}_DATA_FILE", ENV_PREFIX)) {
            if !val.is_empty() {
                self.data_file = PathBuf::from(val);
            }
        }

        // NOTES_REQUEST_TIMEOUT_SECS
        if let Ok(val) = std::env::var(format!("{}_REQUEST_TIMEOUT_SECS", ENV_PREFIX)) {
            if !val.trim().is_empty() {
                self.request_timeout_secs = val.trim().parse().with_context(|| {
                    format!("Invalid {}_REQUEST_TIMEOUT_SECS value: {:?}", ENV_PREFIX, val)
                })?;
            }
        }

        Ok(())
    }

    /// Ensure the directory holding the data file exists
    pub fn ensure_data_dir(&self) -> Result<()> {
        if let Some(parent) = self.data_file.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create data directory: {:?}", parent))?;
            }
        }
        Ok(())
    }

    /// Address to bind, as `host:port`
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the config file path
    ///
    /// Can be overridden with NOTES_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("notes-api")
            .join("config.toml")
    }
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    3000
}

/// Get the default data file
fn default_data_file() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("notes-api")
        .join("notes.json")
}

fn default_request_timeout_secs() -> u64 {
    30
}
