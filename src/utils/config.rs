// Centralized configuration for the logging bot

use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, Result};

use crate::utils::logging::{LogRotation, LoggingConfig};

/// Prefix used in DMs and for guilds that never changed theirs
pub const DEFAULT_PREFIX: &str = "!";

/// How long the setup wizard waits for a reply
pub const SETUP_TIMEOUT_SECS: u64 = 60;

/// Embed field values are capped by Discord at this many characters
pub const EMBED_FIELD_LIMIT: usize = 1024;

/// Discord embed colors
pub mod colors {
    pub const SUCCESS: u32 = 0x2ecc71;
    pub const ERROR: u32 = 0xe74c3c;
    pub const WARNING: u32 = 0xe67e22;
    pub const INFO: u32 = 0x3498db;
}

/// Process settings, read once at startup
#[derive(Debug, Clone)]
pub struct Settings {
    pub token: String,
    pub config_dir: PathBuf,
    pub backup_dir: PathBuf,
    /// Messages remembered for edit/delete logging
    pub message_cache_size: usize,
    pub logging: LoggingConfig,
}

impl Settings {
    /// Read settings from the process environment (call `dotenvy::dotenv()` first)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read settings through an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let token = ["DISCORD_TOKEN", "DISCORD_BOT_TOKEN"]
            .into_iter()
            .find_map(|key| lookup(key).filter(|t| !t.trim().is_empty()))
            .ok_or_else(|| anyhow!("DISCORD_TOKEN (or DISCORD_BOT_TOKEN) must be set"))?;

        let path = |key: &str, default: &str| {
            PathBuf::from(lookup(key).unwrap_or_else(|| default.to_string()))
        };

        let rotation = match lookup("LOG_ROTATION") {
            Some(value) => value.parse::<LogRotation>()?,
            None => LogRotation::Daily,
        };

        let message_cache_size = match lookup("MESSAGE_CACHE_SIZE") {
            Some(value) => value
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| anyhow!("MESSAGE_CACHE_SIZE must be a positive number, got {value:?}"))?,
            None => 500,
        };

        let max_files = match lookup("LOG_MAX_FILES") {
            Some(value) => value
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| anyhow!("LOG_MAX_FILES must be a positive number, got {value:?}"))?,
            None => 5,
        };

        Ok(Self {
            token,
            config_dir: path("CONFIG_DIR", "config"),
            backup_dir: path("BACKUP_DIR", "config_backup"),
            message_cache_size,
            logging: LoggingConfig {
                directory: path("LOG_DIR", "logs"),
                rotation,
                filter: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
                console: true,
                max_files,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::from_lookup(lookup(&[("DISCORD_TOKEN", "abc")])).unwrap();
        assert_eq!(settings.token, "abc");
        assert_eq!(settings.config_dir, PathBuf::from("config"));
        assert_eq!(settings.backup_dir, PathBuf::from("config_backup"));
        assert_eq!(settings.logging.directory, PathBuf::from("logs"));
        assert_eq!(settings.logging.rotation, LogRotation::Daily);
        assert_eq!(settings.logging.filter, "info");
        assert_eq!(settings.logging.max_files, 5);
        assert_eq!(settings.message_cache_size, 500);
    }

    #[test]
    fn test_missing_token() {
        assert!(Settings::from_lookup(lookup(&[])).is_err());
        assert!(Settings::from_lookup(lookup(&[("DISCORD_TOKEN", "  ")])).is_err());
    }

    #[test]
    fn test_bot_token_fallback() {
        let settings = Settings::from_lookup(lookup(&[("DISCORD_BOT_TOKEN", "xyz")])).unwrap();
        assert_eq!(settings.token, "xyz");

        let settings = Settings::from_lookup(lookup(&[
            ("DISCORD_TOKEN", ""),
            ("DISCORD_BOT_TOKEN", "xyz"),
        ]))
        .unwrap();
        assert_eq!(settings.token, "xyz");

        let settings = Settings::from_lookup(lookup(&[
            ("DISCORD_TOKEN", "abc"),
            ("DISCORD_BOT_TOKEN", "xyz"),
        ]))
        .unwrap();
        assert_eq!(settings.token, "abc");
    }

    #[test]
    fn test_overrides() {
        let settings = Settings::from_lookup(lookup(&[
            ("DISCORD_TOKEN", "abc"),
            ("CONFIG_DIR", "/var/lib/bot/config"),
            ("LOG_ROTATION", "hourly"),
            ("MESSAGE_CACHE_SIZE", "2000"),
            ("LOG_MAX_FILES", "14"),
        ]))
        .unwrap();
        assert_eq!(settings.logging.max_files, 14);
        assert_eq!(settings.config_dir, PathBuf::from("/var/lib/bot/config"));
        assert_eq!(settings.logging.rotation, LogRotation::Hourly);
        assert_eq!(settings.message_cache_size, 2000);
    }

    #[test]
    fn test_bad_values_are_rejected() {
        assert!(Settings::from_lookup(lookup(&[
            ("DISCORD_TOKEN", "abc"),
            ("LOG_ROTATION", "weekly"),
        ]))
        .is_err());
        assert!(Settings::from_lookup(lookup(&[
            ("DISCORD_TOKEN", "abc"),
            ("MESSAGE_CACHE_SIZE", "0"),
        ]))
        .is_err());
        assert!(Settings::from_lookup(lookup(&[
            ("DISCORD_TOKEN", "abc"),
            ("LOG_MAX_FILES", "0"),
        ]))
        .is_err());
    }
}
