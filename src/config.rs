//! Configuration loading
//!
//! Settings resolve in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`CHOROMAP_API_URL`)
//! 3. TOML config file (`<config dir>/choromap/config.toml`)
//! 4. Compiled default (fallback)

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::models::session::{SessionPolicy, DEFAULT_MAX_UPLOAD_FILES};

pub const API_URL_ENV_VAR: &str = "CHOROMAP_API_URL";

/// Client configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Base URL of the analysis backend
    pub api_base_url: String,
    /// Base URL shareable links point at (the application entry URL)
    pub share_base_url: String,
    /// Per-request timeout for uploads and fetches
    pub request_timeout_secs: u64,
    /// Client-side submission bound
    pub max_upload_files: usize,
    /// Keep the pushed summary when the pipeline reports failure
    pub retain_summary_on_failure: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:5000".to_string(),
            share_base_url: "http://localhost:5173".to_string(),
            request_timeout_secs: 30,
            max_upload_files: DEFAULT_MAX_UPLOAD_FILES,
            retain_summary_on_failure: true,
        }
    }
}

impl Config {
    /// Session policy knobs carried by this configuration.
    pub fn policy(&self) -> SessionPolicy {
        SessionPolicy {
            max_upload_files: self.max_upload_files,
            retain_summary_on_failure: self.retain_summary_on_failure,
        }
    }

    /// Resolve configuration, applying the priority order above.
    pub fn load(cli_api_url: Option<&str>) -> Result<Self> {
        let mut config = match default_config_path() {
            Some(path) if path.exists() => Self::load_from_path(&path)?,
            _ => Self::default(),
        };

        if let Ok(url) = std::env::var(API_URL_ENV_VAR) {
            if !url.is_empty() {
                config.api_base_url = url;
            }
        }
        if let Some(url) = cli_api_url {
            config.api_base_url = url.to_string();
        }

        Ok(config)
    }

    /// Load from an explicit TOML file.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::Config(e.to_string()))
    }
}

/// `<config dir>/choromap/config.toml`, when a config dir exists on this
/// platform.
fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("choromap").join("config.toml"))
}
