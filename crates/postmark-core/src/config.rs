//! Application configuration.
//!
//! Loaded from a JSON file (every field optional), then overridden by
//! `POSTMARK_*` environment variables. Command-line flags are applied on top
//! by the binary.

use crate::grid::GridConfig;
use crate::memory::AppIdentity;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Storage gateway endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// GraphQL endpoint for metadata queries.
    pub graphql_endpoint: String,
    /// Origin serving stored payloads by id.
    pub origin: String,
    /// Upload service endpoint; uploads are unavailable without one.
    pub upload_endpoint: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            graphql_endpoint: "https://arweave.net/graphql".to_string(),
            origin: "https://arweave.net".to_string(),
            upload_endpoint: None,
        }
    }
}

/// Existence probe schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    pub attempts: u32,
    pub delay_ms: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            attempts: 10,
            delay_ms: 3000,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostmarkConfig {
    pub gateway: GatewayConfig,
    pub app: AppIdentity,
    pub probe: ProbeConfig,
    pub grid: GridConfig,
    /// Directory for local key-value storage; platform default when unset.
    pub storage_dir: Option<PathBuf>,
    /// Regular font used for composite text.
    pub font_path: Option<PathBuf>,
    /// Bold font for titles; the regular font is reused when unset.
    pub font_bold_path: Option<PathBuf>,
    /// Watch-only wallet address used as upload owner.
    pub wallet_address: Option<String>,
}

impl PostmarkConfig {
    /// Default config file location: `<config dir>/postmark/config.json`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("postmark").join("config.json"))
    }

    /// Parse a config file.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("Failed to read {}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }

    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject grid settings the camera cannot work with.
    pub fn validate(&self) -> ConfigResult<()> {
        let grid = &self.grid;
        let invalid = |key: &str, value: f64| ConfigError::InvalidValue {
            key: format!("grid.{}", key),
            value: value.to_string(),
        };
        for (key, value) in [("min_scale", grid.min_scale), ("max_scale", grid.max_scale)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(invalid(key, value));
            }
        }
        if grid.min_scale > grid.max_scale {
            return Err(invalid("min_scale", grid.min_scale));
        }
        for (key, value) in [
            ("padding", grid.padding),
            ("tap_threshold", grid.tap_threshold),
            ("fallback_gap", grid.fallback_gap),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(key, value));
            }
        }
        if !grid.scroll_speed.is_finite() {
            return Err(invalid("scroll_speed", grid.scroll_speed));
        }
        Ok(())
    }

    pub fn to_json(&self) -> ConfigResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load from `path`, or from the default location when it exists, then
    /// apply environment overrides.
    ///
    /// An explicit path must exist; a missing default file yields defaults.
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path().filter(|p| p.exists()) {
                Some(path) => {
                    log::debug!("Loading config from {}", path.display());
                    Self::from_file(&path)?
                }
                None => Self::default(),
            },
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply `POSTMARK_*` overrides read through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<()> {
        if let Some(v) = lookup("POSTMARK_GRAPHQL_ENDPOINT") {
            self.gateway.graphql_endpoint = v;
        }
        if let Some(v) = lookup("POSTMARK_GATEWAY_ORIGIN") {
            self.gateway.origin = v;
        }
        if let Some(v) = lookup("POSTMARK_UPLOAD_ENDPOINT") {
            self.gateway.upload_endpoint = Some(v);
        }
        if let Some(v) = lookup("POSTMARK_APP_NAME") {
            self.app.name = v;
        }
        if let Some(v) = lookup("POSTMARK_PROBE_ATTEMPTS") {
            self.probe.attempts = parse_value("POSTMARK_PROBE_ATTEMPTS", &v)?;
        }
        if let Some(v) = lookup("POSTMARK_PROBE_DELAY_MS") {
            self.probe.delay_ms = parse_value("POSTMARK_PROBE_DELAY_MS", &v)?;
        }
        if let Some(v) = lookup("POSTMARK_STORAGE_DIR") {
            self.storage_dir = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("POSTMARK_FONT") {
            self.font_path = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("POSTMARK_FONT_BOLD") {
            self.font_bold_path = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("POSTMARK_WALLET_ADDRESS") {
            self.wallet_address = Some(v);
        }
        Ok(())
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> ConfigResult<T> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}
