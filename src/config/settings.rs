//! Application settings loaded from `config.toml`.
//!
//! Every key is optional; a missing file means "all defaults".

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

fn default_budget_validity_days() -> i64 {
    15
}

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Settings {
    /// Days a new budget stays valid when it is created without an explicit expiry
    #[serde(default = "default_budget_validity_days")]
    pub budget_validity_days: i64,
    /// Run the budget expiry sweep once at startup
    #[serde(default)]
    pub expire_on_startup: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            budget_validity_days: default_budget_validity_days(),
            expire_on_startup: false,
        }
    }
}

/// Loads settings from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - `budget_validity_days` is not positive
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;
    parse_settings(&contents)
}

fn parse_settings(contents: &str) -> Result<Settings> {
    let settings: Settings = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;

    if settings.budget_validity_days <= 0 {
        return Err(Error::Config {
            message: format!(
                "budget_validity_days must be positive, got {}",
                settings.budget_validity_days
            ),
        });
    }

    Ok(settings)
}

/// Loads settings from `./config.toml`, falling back to defaults when the file is absent.
pub fn load_default_settings() -> Result<Settings> {
    let path = Path::new("config.toml");
    if !path.exists() {
        tracing::debug!("No config.toml found, using default settings");
        return Ok(Settings::default());
    }
    load_settings(path)
}
