//! Configuration loading for Parley.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// Get the Parley home directory (~/.parley).
pub fn get_home_dir() -> Result<PathBuf> {
    let home = directories::UserDirs::new()
        .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))?;

    Ok(home.home_dir().join(".parley"))
}

/// Get the settings file path.
pub fn get_settings_path() -> Result<PathBuf> {
    Ok(get_home_dir()?.join("settings.json"))
}

/// Load settings from ~/.parley/settings.json
pub fn load_settings() -> Result<Settings> {
    load_settings_from(&get_settings_path()?)
}

/// Load settings from an explicit path.
pub fn load_settings_from(path: &Path) -> Result<Settings> {
    if !path.exists() {
        return Err(Error::Config(format!(
            "Settings file not found at {}",
            path.display()
        )));
    }

    let content = std::fs::read_to_string(path)?;
    let settings: Settings = serde_json::from_str(&content)?;
    validate_settings(&settings)?;

    tracing::debug!("Loaded settings from {}", path.display());
    Ok(settings)
}

/// Load settings or return default if not found.
pub fn load_settings_or_default() -> Settings {
    load_settings().unwrap_or_else(|e| {
        tracing::warn!("Failed to load settings: {}, using defaults", e);
        Settings::default()
    })
}

fn validate_settings(settings: &Settings) -> Result<()> {
    if settings.mailbox.max_messages == 0 {
        return Err(Error::Config(
            "mailbox.max_messages must be at least 1".to_string(),
        ));
    }
    if settings.events.channel_capacity == 0 {
        return Err(Error::Config(
            "events.channel_capacity must be at least 1".to_string(),
        ));
    }
    if settings.negotiation.default_timeout_ms == 0 {
        return Err(Error::Config(
            "negotiation.default_timeout_ms must be at least 1".to_string(),
        ));
    }
    Ok(())
}

/// Negotiation configuration.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Negotiation {
    /// Default deadline for request-response and Contract-Net waits.
    #[serde(default = "default_negotiation_timeout_ms")]
    pub default_timeout_ms: u64,
}

fn default_negotiation_timeout_ms() -> u64 {
    5_000
}

impl Default for Negotiation {
    fn default() -> Self {
        Self {
            default_timeout_ms: default_negotiation_timeout_ms(),
        }
    }
}

/// Agent scoring weights used during task assignment.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Scoring {
    /// Bonus when a required capability matches a specialization tag.
    #[serde(default = "default_specialization_bonus")]
    pub specialization_bonus: f64,

    /// Penalty applied to agents with a slow average response time.
    #[serde(default = "default_slow_response_penalty")]
    pub slow_response_penalty: f64,

    /// Average response time above which the penalty applies.
    #[serde(default = "default_slow_response_threshold_ms")]
    pub slow_response_threshold_ms: f64,
}

fn default_specialization_bonus() -> f64 {
    20.0
}

fn default_slow_response_penalty() -> f64 {
    10.0
}

fn default_slow_response_threshold_ms() -> f64 {
    10_000.0
}

impl Default for Scoring {
    fn default() -> Self {
        Self {
            specialization_bonus: default_specialization_bonus(),
            slow_response_penalty: default_slow_response_penalty(),
            slow_response_threshold_ms: default_slow_response_threshold_ms(),
        }
    }
}

/// Mailbox configuration.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct MailboxConfig {
    /// Maximum queued messages per agent before the oldest are dropped.
    #[serde(default = "default_max_messages")]
    pub max_messages: usize,
}

fn default_max_messages() -> usize {
    1_000
}

impl Default for MailboxConfig {
    fn default() -> Self {
        Self {
            max_messages: default_max_messages(),
        }
    }
}

/// Event bus configuration.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Events {
    /// Broadcast channel capacity; lagged subscribers lose oldest events.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

fn default_channel_capacity() -> usize {
    256
}

impl Default for Events {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
        }
    }
}

/// Parley settings.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Settings {
    #[serde(default)]
    pub negotiation: Negotiation,

    #[serde(default)]
    pub scoring: Scoring,

    #[serde(default)]
    pub mailbox: MailboxConfig,

    #[serde(default)]
    pub events: Events,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let settings = Settings::default();
        assert_eq!(settings.negotiation.default_timeout_ms, 5_000);
        assert_eq!(settings.scoring.specialization_bonus, 20.0);
        assert_eq!(settings.scoring.slow_response_penalty, 10.0);
        assert_eq!(settings.mailbox.max_messages, 1_000);
    }

    #[test]
    fn partial_settings_fill_in_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{"scoring": {"specialization_bonus": 35.0}}"#).unwrap();
        assert_eq!(settings.scoring.specialization_bonus, 35.0);
        assert_eq!(settings.scoring.slow_response_penalty, 10.0);
        assert_eq!(settings.negotiation.default_timeout_ms, 5_000);
    }

    #[test]
    fn zero_capacity_rejected() {
        let settings: Settings =
            serde_json::from_str(r#"{"mailbox": {"max_messages": 0}}"#).unwrap();
        assert!(validate_settings(&settings).is_err());
    }

    #[test]
    fn load_from_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let mut settings = Settings::default();
        settings.negotiation.default_timeout_ms = 750;
        std::fs::write(&path, serde_json::to_string_pretty(&settings).unwrap()).unwrap();

        let loaded = load_settings_from(&path).unwrap();
        assert_eq!(loaded.negotiation.default_timeout_ms, 750);

        assert!(load_settings_from(&dir.path().join("missing.json")).is_err());
    }
}
