// Guild logging configuration
// Stored as one JSON document per guild

use std::collections::BTreeMap;

use poise::serenity_prelude as serenity;
use serde::{Deserialize, Serialize};

/// Longest accepted command prefix
pub const MAX_PREFIX_LEN: usize = 5;

/// Event class that can be routed to its own channel
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
    poise::ChoiceParameter,
)]
#[serde(rename_all = "lowercase")]
pub enum LogCategory {
    #[name = "messages"]
    Messages,
    #[name = "edits"]
    Edits,
    #[name = "deletions"]
    Deletions,
    #[name = "joins"]
    Joins,
    #[name = "leaves"]
    Leaves,
    #[name = "roles"]
    Roles,
    #[name = "voice"]
    Voice,
    /// Fallback destination for categories without their own channel
    #[name = "default"]
    Default,
}

impl LogCategory {
    pub const ALL: [LogCategory; 8] = [
        LogCategory::Messages,
        LogCategory::Edits,
        LogCategory::Deletions,
        LogCategory::Joins,
        LogCategory::Leaves,
        LogCategory::Roles,
        LogCategory::Voice,
        LogCategory::Default,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LogCategory::Messages => "messages",
            LogCategory::Edits => "edits",
            LogCategory::Deletions => "deletions",
            LogCategory::Joins => "joins",
            LogCategory::Leaves => "leaves",
            LogCategory::Roles => "roles",
            LogCategory::Voice => "voice",
            LogCategory::Default => "default",
        }
    }

    /// Capitalized name for embeds and replies
    pub fn title(self) -> &'static str {
        match self {
            LogCategory::Messages => "Messages",
            LogCategory::Edits => "Edits",
            LogCategory::Deletions => "Deletions",
            LogCategory::Joins => "Joins",
            LogCategory::Leaves => "Leaves",
            LogCategory::Roles => "Roles",
            LogCategory::Voice => "Voice",
            LogCategory::Default => "Default",
        }
    }
}

/// Switch that can be flipped with `log toggle`
#[derive(Debug, Clone, Copy, PartialEq, Eq, poise::ChoiceParameter)]
pub enum Feature {
    #[name = "main"]
    Main,
    #[name = "messages"]
    Messages,
    #[name = "edits"]
    Edits,
    #[name = "deletions"]
    Deletions,
    #[name = "joins"]
    Joins,
    #[name = "leaves"]
    Leaves,
    #[name = "roles"]
    Roles,
    #[name = "voice"]
    Voice,
}

impl Feature {
    pub const ALL: [Feature; 8] = [
        Feature::Main,
        Feature::Messages,
        Feature::Edits,
        Feature::Deletions,
        Feature::Joins,
        Feature::Leaves,
        Feature::Roles,
        Feature::Voice,
    ];

    /// Human readable label used by `log status`
    pub fn label(self) -> &'static str {
        match self {
            Feature::Main => "Main Logging",
            Feature::Messages => "Message Logging",
            Feature::Edits => "Edit Logging",
            Feature::Deletions => "Deletion Logging",
            Feature::Joins => "Join Logging",
            Feature::Leaves => "Leave Logging",
            Feature::Roles => "Role Change Logging",
            Feature::Voice => "Voice Activity Logging",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Feature::Main => "Main",
            Feature::Messages => "Messages",
            Feature::Edits => "Edits",
            Feature::Deletions => "Deletions",
            Feature::Joins => "Joins",
            Feature::Leaves => "Leaves",
            Feature::Roles => "Roles",
            Feature::Voice => "Voice",
        }
    }
}

/// Category -> destination channel
pub type LogChannels = BTreeMap<LogCategory, serenity::ChannelId>;

fn default_prefix() -> String {
    "!".to_string()
}

/// Guild (Server) logging configuration
///
/// Missing fields take their default value when a document is loaded,
/// so older or hand-edited files with only a few keys still parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuildConfig {
    /// Prefix for text commands
    pub prefix: String,
    /// Master switch; nothing is logged while this is off
    pub logging_enabled: bool,
    pub log_messages: bool,
    pub log_edits: bool,
    pub log_deletions: bool,
    pub log_joins: bool,
    pub log_leaves: bool,
    pub log_role_changes: bool,
    pub log_voice: bool,
    pub log_channels: LogChannels,
}

impl Default for GuildConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            logging_enabled: true,
            log_messages: true,
            log_edits: true,
            log_deletions: true,
            log_joins: true,
            log_leaves: true,
            log_role_changes: true,
            log_voice: true,
            log_channels: LogChannels::new(),
        }
    }
}

impl GuildConfig {
    /// Check field rules that serde cannot express
    pub fn validate(&self) -> Result<(), String> {
        validate_prefix(&self.prefix)
    }

    /// Whether a feature switch is on
    pub fn feature_enabled(&self, feature: Feature) -> bool {
        match feature {
            Feature::Main => self.logging_enabled,
            Feature::Messages => self.log_messages,
            Feature::Edits => self.log_edits,
            Feature::Deletions => self.log_deletions,
            Feature::Joins => self.log_joins,
            Feature::Leaves => self.log_leaves,
            Feature::Roles => self.log_role_changes,
            Feature::Voice => self.log_voice,
        }
    }

    /// Flip a feature switch, returning the new value
    pub fn toggle(&mut self, feature: Feature) -> bool {
        let flag = match feature {
            Feature::Main => &mut self.logging_enabled,
            Feature::Messages => &mut self.log_messages,
            Feature::Edits => &mut self.log_edits,
            Feature::Deletions => &mut self.log_deletions,
            Feature::Joins => &mut self.log_joins,
            Feature::Leaves => &mut self.log_leaves,
            Feature::Roles => &mut self.log_role_changes,
            Feature::Voice => &mut self.log_voice,
        };
        *flag = !*flag;
        *flag
    }

    /// Whether events of this category should be logged at all
    pub fn category_enabled(&self, category: LogCategory) -> bool {
        let toggle = match category {
            LogCategory::Messages => Feature::Messages,
            LogCategory::Edits => Feature::Edits,
            LogCategory::Deletions => Feature::Deletions,
            LogCategory::Joins => Feature::Joins,
            LogCategory::Leaves => Feature::Leaves,
            LogCategory::Roles => Feature::Roles,
            LogCategory::Voice => Feature::Voice,
            LogCategory::Default => return self.logging_enabled,
        };
        self.logging_enabled && self.feature_enabled(toggle)
    }

    /// Resolve the destination channel for a category.
    ///
    /// Returns `None` when logging is off for the category or no channel
    /// (not even `default`) is configured.
    pub fn route(&self, category: LogCategory) -> Option<serenity::ChannelId> {
        if !self.category_enabled(category) {
            return None;
        }

        self.log_channels
            .get(&category)
            .or_else(|| self.log_channels.get(&LogCategory::Default))
            .copied()
    }
}

pub fn validate_prefix(prefix: &str) -> Result<(), String> {
    let len = prefix.chars().count();
    if len == 0 {
        return Err("prefix must not be empty".to_string());
    }
    if len > MAX_PREFIX_LEN {
        return Err(format!(
            "prefix must be {} characters or less (got {})",
            MAX_PREFIX_LEN, len
        ));
    }
    Ok(())
}

/// Partial configuration update.
///
/// Present fields replace the stored value wholesale; in particular a
/// present `log_channels` replaces the whole mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigUpdate {
    pub prefix: Option<String>,
    pub logging_enabled: Option<bool>,
    pub log_messages: Option<bool>,
    pub log_edits: Option<bool>,
    pub log_deletions: Option<bool>,
    pub log_joins: Option<bool>,
    pub log_leaves: Option<bool>,
    pub log_role_changes: Option<bool>,
    pub log_voice: Option<bool>,
    pub log_channels: Option<LogChannels>,
}

impl ConfigUpdate {
    pub fn prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
            ..Default::default()
        }
    }

    /// Shallow merge into `config`
    pub fn apply_to(self, config: &mut GuildConfig) {
        if let Some(prefix) = self.prefix {
            config.prefix = prefix;
        }
        if let Some(v) = self.logging_enabled {
            config.logging_enabled = v;
        }
        if let Some(v) = self.log_messages {
            config.log_messages = v;
        }
        if let Some(v) = self.log_edits {
            config.log_edits = v;
        }
        if let Some(v) = self.log_deletions {
            config.log_deletions = v;
        }
        if let Some(v) = self.log_joins {
            config.log_joins = v;
        }
        if let Some(v) = self.log_leaves {
            config.log_leaves = v;
        }
        if let Some(v) = self.log_role_changes {
            config.log_role_changes = v;
        }
        if let Some(v) = self.log_voice {
            config.log_voice = v;
        }
        if let Some(channels) = self.log_channels {
            config.log_channels = channels;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel(id: u64) -> serenity::ChannelId {
        serenity::ChannelId::new(id)
    }

    #[test]
    fn test_default_template_values() {
        let config = GuildConfig::default();
        assert_eq!(config.prefix, "!");
        assert!(config.logging_enabled);
        assert!(Feature::ALL.iter().all(|f| config.feature_enabled(*f)));
        assert!(config.log_channels.is_empty());
    }

    #[test]
    fn test_partial_document_fills_defaults() {
        let config: GuildConfig =
            serde_json::from_str(r#"{"prefix": "?", "log_voice": false}"#).unwrap();
        assert_eq!(config.prefix, "?");
        assert!(!config.log_voice);
        assert!(config.log_edits);
        assert!(config.logging_enabled);
    }

    #[test]
    fn test_log_channels_accept_numeric_ids() {
        let config: GuildConfig = serde_json::from_str(
            r#"{"log_channels": {"default": 111, "roles": "222"}}"#,
        )
        .unwrap();
        assert_eq!(config.log_channels.get(&LogCategory::Default), Some(&channel(111)));
        assert_eq!(config.log_channels.get(&LogCategory::Roles), Some(&channel(222)));
    }

    #[test]
    fn test_unknown_category_is_rejected() {
        let result: Result<GuildConfig, _> =
            serde_json::from_str(r#"{"log_channels": {"reactions": 1}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_prefix() {
        assert!(validate_prefix("!").is_ok());
        assert!(validate_prefix("log!!").is_ok());
        assert!(validate_prefix("").is_err());
        assert!(validate_prefix("toolong").is_err());
        // counted in characters, not bytes
        assert!(validate_prefix("ろぐ").is_ok());
    }

    #[test]
    fn test_route_prefers_category_then_default() {
        let mut config = GuildConfig::default();
        assert_eq!(config.route(LogCategory::Messages), None);

        config.log_channels.insert(LogCategory::Default, channel(1));
        assert_eq!(config.route(LogCategory::Messages), Some(channel(1)));

        config.log_channels.insert(LogCategory::Messages, channel(2));
        assert_eq!(config.route(LogCategory::Messages), Some(channel(2)));
        assert_eq!(config.route(LogCategory::Voice), Some(channel(1)));
    }

    #[test]
    fn test_route_respects_switches() {
        let mut config = GuildConfig::default();
        config.log_channels.insert(LogCategory::Default, channel(1));

        config.log_role_changes = false;
        assert_eq!(config.route(LogCategory::Roles), None);
        assert_eq!(config.route(LogCategory::Joins), Some(channel(1)));

        config.logging_enabled = false;
        assert_eq!(config.route(LogCategory::Joins), None);
    }

    #[test]
    fn test_toggle_flips_and_reports() {
        let mut config = GuildConfig::default();
        assert!(!config.toggle(Feature::Voice));
        assert!(!config.log_voice);
        assert!(config.toggle(Feature::Voice));
        assert!(!config.toggle(Feature::Main));
        assert!(!config.logging_enabled);
    }

    #[test]
    fn test_update_is_shallow() {
        let mut config = GuildConfig::default();
        config.log_channels.insert(LogCategory::Default, channel(1));
        config.log_channels.insert(LogCategory::Voice, channel(2));

        let mut replacement = LogChannels::new();
        replacement.insert(LogCategory::Edits, channel(3));
        let update = ConfigUpdate {
            log_channels: Some(replacement.clone()),
            ..Default::default()
        };
        update.apply_to(&mut config);

        assert_eq!(config.log_channels, replacement);
        assert_eq!(config.prefix, "!");
    }

    #[test]
    fn test_update_from_json_only_touches_given_keys() {
        let update: ConfigUpdate = serde_json::from_str(r#"{"prefix": "?"}"#).unwrap();
        let mut config = GuildConfig::default();
        let before = config.clone();
        update.apply_to(&mut config);

        assert_eq!(config.prefix, "?");
        assert_eq!(GuildConfig { prefix: "!".into(), ..config }, before);
    }
}
