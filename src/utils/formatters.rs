// Formatting utilities

use chrono::{DateTime, Utc};
use poise::serenity_prelude as serenity;

/// Truncate string to max length (in characters) with ellipsis
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Format a Discord timestamp as `YYYY-MM-DD HH:MM:SS UTC`
pub fn format_timestamp(ts: serenity::Timestamp) -> String {
    match DateTime::<Utc>::from_timestamp(ts.unix_timestamp(), 0) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        None => "Unknown".to_string(),
    }
}

/// Same as [`format_timestamp`] but tolerates a missing value
pub fn format_optional_timestamp(ts: Option<serenity::Timestamp>) -> String {
    ts.map(format_timestamp).unwrap_or_else(|| "Unknown".to_string())
}

/// Format a byte count (e.g., "1.5 KB")
pub fn format_file_size(size: u64) -> String {
    if size == 0 {
        return "0 B".to_string();
    }

    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = size as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    format!("{:.1} {}", value, UNITS[unit])
}

/// Escape Discord markdown control characters
pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '*' | '_' | '`' | '~' | '\\' | '|') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// `<@id> (`id`)` style label used in log embeds
pub fn user_label(mention: impl std::fmt::Display, id: impl std::fmt::Display) -> String {
    format!("{} (`{}`)", mention, id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 8), "hello...");
        assert_eq!(truncate(&"x".repeat(1024), 1024).len(), 1024);

        let long = "a".repeat(2000);
        let cut = truncate(&long, 1024);
        assert_eq!(cut.chars().count(), 1024);
        assert!(cut.ends_with("..."));
    }

    #[test]
    fn test_truncate_multibyte() {
        let s = "ログ".repeat(10);
        let cut = truncate(&s, 5);
        assert_eq!(cut, "ログ...");
        assert_eq!(cut.chars().count(), 5);
        assert_eq!(truncate(&s, 20), s);
    }

    #[test]
    fn test_format_timestamp() {
        let ts = serenity::Timestamp::from_unix_timestamp(0).unwrap();
        assert_eq!(format_timestamp(ts), "1970-01-01 00:00:00 UTC");
        assert_eq!(format_optional_timestamp(None), "Unknown");
    }

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 B");
        assert_eq!(format_file_size(512), "512.0 B");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(10 * 1024 * 1024), "10.0 MB");
    }

    #[test]
    fn test_escape_markdown() {
        assert_eq!(escape_markdown("*hi* _there_"), "\\*hi\\* \\_there\\_");
        assert_eq!(escape_markdown("plain"), "plain");
    }

    #[test]
    fn test_user_label() {
        assert_eq!(user_label("<@1>", 1), "<@1> (`1`)");
    }
}
