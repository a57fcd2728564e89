//! Configuration file
//!
//! ```toml
//! [upgrade]
//! string_policy = "json_implied"
//! unpopulated_maps = "null"
//!
//! [logging]
//! level = "debug"
//! format = "json"
//! ```
//!
//! Every section and key is optional.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use stateup_engine::{MapSynthesis, UpgradeOptions};
use stateup_value::StringPolicy;

/// Driver settings
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Engine options
    pub upgrade: UpgradeOptions,
    /// Logging options
    pub logging: LoggingSettings,
}

/// Log line format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

/// Logging section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSettings {
    /// Filter used when `RUST_LOG` is not set
    pub level: String,
    /// Line format
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

impl Settings {
    /// Parse TOML text
    ///
    /// # Errors
    /// Returns error on malformed TOML or unknown keys
    pub fn from_toml(text: &str) -> anyhow::Result<Self> {
        toml::from_str(text).context("invalid configuration")
    }

    /// Read and parse a TOML file
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file '{}'", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("in config file '{}'", path.display()))
    }

    /// Force the JSON-implied string policy
    #[inline]
    #[must_use]
    pub fn with_json_implied(mut self) -> Self {
        self.upgrade = self.upgrade.with_string_policy(StringPolicy::JsonImplied);
        self
    }

    /// Force null unpopulated maps
    #[inline]
    #[must_use]
    pub fn with_null_maps(mut self) -> Self {
        self.upgrade = self.upgrade.with_unpopulated_maps(MapSynthesis::Null);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_file_is_default() {
        assert_eq!(Settings::from_toml("").unwrap(), Settings::default());
        assert_eq!(Settings::default().logging.level, "info");
    }

    #[test]
    fn full_file() {
        let settings = Settings::from_toml(
            r#"
            [upgrade]
            string_policy = "json_implied"
            unpopulated_maps = "null"

            [logging]
            level = "debug"
            format = "json"
            "#,
        )
        .unwrap();
        assert_eq!(settings.upgrade.string_policy, StringPolicy::JsonImplied);
        assert_eq!(settings.upgrade.unpopulated_maps, MapSynthesis::Null);
        assert_eq!(settings.logging.level, "debug");
        assert_eq!(settings.logging.format, LogFormat::Json);
    }

    #[test]
    fn log_format_defaults_to_text() {
        let settings = Settings::from_toml("[logging]\nlevel = \"warn\"").unwrap();
        assert_eq!(settings.logging.format, LogFormat::Text);
        assert!(Settings::from_toml("[logging]\nformat = \"xml\"").is_err());
    }

    #[test]
    fn unknown_keys_rejected() {
        assert!(Settings::from_toml("[upgrade]\nstring_polcy = \"verbatim\"").is_err());
        assert!(Settings::from_toml("[metrics]\nenabled = true").is_err());
    }

    #[test]
    fn unknown_policy_rejected() {
        let err = Settings::from_toml("[upgrade]\nstring_policy = \"yaml\"").unwrap_err();
        assert!(format!("{err:#}").contains("invalid configuration"));
    }

    #[test]
    fn flags_override_file() {
        let settings = Settings::from_toml("[upgrade]\nunpopulated_maps = \"empty\"")
            .unwrap()
            .with_null_maps()
            .with_json_implied();
        assert_eq!(settings.upgrade.unpopulated_maps, MapSynthesis::Null);
        assert_eq!(settings.upgrade.string_policy, StringPolicy::JsonImplied);
    }

    #[test]
    fn load_reports_path() {
        let err = Settings::load(Path::new("/nonexistent/stateup.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/stateup.toml"));
    }
}
