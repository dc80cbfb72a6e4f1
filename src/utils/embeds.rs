// Log entry embeds

use poise::serenity_prelude as serenity;
use serenity::Mentionable;

use crate::utils::config::{colors, EMBED_FIELD_LIMIT};
use crate::utils::formatters::{
    escape_markdown, format_optional_timestamp, format_timestamp, truncate, user_label,
};

const GREEN: u32 = colors::SUCCESS;
const ORANGE: u32 = colors::WARNING;
const RED: u32 = colors::ERROR;
const BLUE: u32 = colors::INFO;

/// The user a log entry is about
#[derive(Debug, Clone)]
pub struct Subject {
    pub id: serenity::UserId,
    /// Mention, or plain tag when the user is no longer in the guild
    pub label: String,
    pub avatar_url: String,
}

impl Subject {
    pub fn mention(user: &serenity::User) -> Self {
        Self {
            id: user.id,
            label: user.id.mention().to_string(),
            avatar_url: user.avatar_url().unwrap_or_else(|| user.default_avatar_url()),
        }
    }

    pub fn tag(user: &serenity::User) -> Self {
        Self {
            label: escape_markdown(&user.tag()),
            ..Self::mention(user)
        }
    }

    fn field(&self) -> String {
        user_label(&self.label, self.id)
    }
}

fn entry(title: &str, color: u32, timestamp: serenity::Timestamp) -> serenity::CreateEmbed {
    serenity::CreateEmbed::new()
        .title(title)
        .color(color)
        .timestamp(timestamp)
}

fn footer(text: String) -> serenity::CreateEmbedFooter {
    serenity::CreateEmbedFooter::new(text)
}

fn channel_field(channel_id: serenity::ChannelId) -> String {
    user_label(channel_id.mention(), channel_id)
}

fn limited(text: &str) -> String {
    truncate(text, EMBED_FIELD_LIMIT)
}

fn member_count(count: Option<u64>) -> String {
    count
        .map(|c| c.to_string())
        .unwrap_or_else(|| "Unknown".to_string())
}

/// A member posted a message
pub fn message_sent(
    subject: &Subject,
    channel_id: serenity::ChannelId,
    message_id: serenity::MessageId,
    content: &str,
    attachment_urls: &[String],
    created_at: serenity::Timestamp,
) -> serenity::CreateEmbed {
    let mut embed = entry("Message Sent", GREEN, created_at)
        .field("Author", subject.field(), true)
        .field("Channel", channel_field(channel_id), true);

    if !content.is_empty() {
        embed = embed.field("Content", limited(content), false);
    }
    if !attachment_urls.is_empty() {
        embed = embed.field("Attachments", limited(&attachment_urls.join("\n")), false);
    }

    embed
        .thumbnail(&subject.avatar_url)
        .footer(footer(format!("Message ID: {}", message_id)))
}

/// A member edited a message
pub fn message_edited(
    subject: &Subject,
    channel_id: serenity::ChannelId,
    message_id: serenity::MessageId,
    before: &str,
    after: &str,
    jump_url: &str,
    edited_at: Option<serenity::Timestamp>,
) -> serenity::CreateEmbed {
    let mut embed = entry(
        "Message Edited",
        ORANGE,
        edited_at.unwrap_or_else(serenity::Timestamp::now),
    )
    .field("Author", subject.field(), true)
    .field("Channel", channel_field(channel_id), true);

    if !before.is_empty() {
        embed = embed.field("Before", limited(before), false);
    }
    if !after.is_empty() {
        embed = embed.field("After", limited(after), false);
    }

    embed
        .field("Jump to Message", format!("[Click here]({})", jump_url), false)
        .thumbnail(&subject.avatar_url)
        .footer(footer(format!("Message ID: {}", message_id)))
}

/// A message was deleted
pub fn message_deleted(
    subject: &Subject,
    channel_id: serenity::ChannelId,
    message_id: serenity::MessageId,
    created_at: serenity::Timestamp,
    deleted_by: Option<serenity::UserId>,
    content: &str,
    attachment_names: &[String],
) -> serenity::CreateEmbed {
    let mut embed = entry("Message Deleted", RED, serenity::Timestamp::now())
        .field("Author", subject.field(), true)
        .field("Channel", channel_field(channel_id), true)
        .field("Created At", format_timestamp(created_at), true);

    if let Some(moderator) = deleted_by.filter(|id| *id != subject.id) {
        embed = embed.field("Deleted By", user_label(moderator.mention(), moderator), true);
    }
    if !content.is_empty() {
        embed = embed.field("Content", limited(content), false);
    }
    if !attachment_names.is_empty() {
        embed = embed.field("Attachments", limited(&attachment_names.join("\n")), false);
    }

    embed
        .thumbnail(&subject.avatar_url)
        .footer(footer(format!("Message ID: {}", message_id)))
}

/// A member joined the guild
pub fn member_joined(
    subject: &Subject,
    account_created: serenity::Timestamp,
    count: Option<u64>,
) -> serenity::CreateEmbed {
    entry("Member Joined", GREEN, serenity::Timestamp::now())
        .field("User", subject.field(), true)
        .field("Account Created", format_timestamp(account_created), true)
        .field("Member Count", member_count(count), true)
        .thumbnail(&subject.avatar_url)
        .footer(footer(format!("User ID: {}", subject.id)))
}

/// A member left (or was removed from) the guild
pub fn member_left(
    subject: &Subject,
    joined_at: Option<serenity::Timestamp>,
    count: Option<u64>,
    roles: &[String],
) -> serenity::CreateEmbed {
    let mut embed = entry("Member Left", RED, serenity::Timestamp::now())
        .field("User", subject.field(), true)
        .field("Joined At", format_optional_timestamp(joined_at), true)
        .field("Member Count", member_count(count), true);

    if !roles.is_empty() {
        embed = embed.field("Roles", limited(&roles.join(", ")), false);
    }

    embed
        .thumbnail(&subject.avatar_url)
        .footer(footer(format!("User ID: {}", subject.id)))
}

/// A member gained or lost roles
pub fn roles_updated(subject: &Subject, added: &[String], removed: &[String]) -> serenity::CreateEmbed {
    let mut embed = entry("Member Roles Updated", BLUE, serenity::Timestamp::now())
        .field("User", subject.field(), true);

    if !added.is_empty() {
        embed = embed.field("Roles Added", limited(&added.join(", ")), true);
    }
    if !removed.is_empty() {
        embed = embed.field("Roles Removed", limited(&removed.join(", ")), true);
    }

    embed
        .thumbnail(&subject.avatar_url)
        .footer(footer(format!("User ID: {}", subject.id)))
}

fn voice_entry(subject: &Subject, embed: serenity::CreateEmbed) -> serenity::CreateEmbed {
    embed
        .field("User", subject.field(), true)
        .thumbnail(&subject.avatar_url)
        .footer(footer(format!("User ID: {}", subject.id)))
}

pub fn voice_joined(subject: &Subject, channel: &str) -> serenity::CreateEmbed {
    let embed = entry("Voice Channel Joined", GREEN, serenity::Timestamp::now())
        .field("Channel", channel, true);
    voice_entry(subject, embed)
}

pub fn voice_left(subject: &Subject, channel: &str) -> serenity::CreateEmbed {
    let embed = entry("Voice Channel Left", RED, serenity::Timestamp::now())
        .field("Channel", channel, true);
    voice_entry(subject, embed)
}

pub fn voice_switched(subject: &Subject, from: &str, to: &str) -> serenity::CreateEmbed {
    let embed = entry("Voice Channel Switched", ORANGE, serenity::Timestamp::now())
        .field("From", from, true)
        .field("To", to, true);
    voice_entry(subject, embed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn subject() -> Subject {
        Subject {
            id: serenity::UserId::new(7),
            label: "<@7>".to_string(),
            avatar_url: "https://cdn.example/avatar.png".to_string(),
        }
    }

    fn render(embed: serenity::CreateEmbed) -> Value {
        serde_json::to_value(embed).unwrap()
    }

    fn field<'a>(embed: &'a Value, name: &str) -> Option<&'a str> {
        embed["fields"]
            .as_array()?
            .iter()
            .find(|f| f["name"] == name)
            .and_then(|f| f["value"].as_str())
    }

    fn field_names(embed: &Value) -> Vec<&str> {
        embed["fields"]
            .as_array()
            .map(|fields| fields.iter().filter_map(|f| f["name"].as_str()).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_message_sent() {
        let embed = render(message_sent(
            &subject(),
            serenity::ChannelId::new(3),
            serenity::MessageId::new(99),
            "hello",
            &["https://cdn.example/a.png".to_string()],
            serenity::Timestamp::now(),
        ));

        assert_eq!(embed["title"], "Message Sent");
        assert_eq!(embed["color"], GREEN);
        assert_eq!(field(&embed, "Author"), Some("<@7> (`7`)"));
        assert_eq!(field(&embed, "Channel"), Some("<#3> (`3`)"));
        assert_eq!(field(&embed, "Content"), Some("hello"));
        assert_eq!(field(&embed, "Attachments"), Some("https://cdn.example/a.png"));
        assert_eq!(embed["footer"]["text"], "Message ID: 99");
        assert_eq!(embed["thumbnail"]["url"], "https://cdn.example/avatar.png");
    }

    #[test]
    fn test_empty_content_is_omitted_and_long_content_truncated() {
        let embed = render(message_sent(
            &subject(),
            serenity::ChannelId::new(3),
            serenity::MessageId::new(99),
            "",
            &[],
            serenity::Timestamp::now(),
        ));
        assert_eq!(field_names(&embed), vec!["Author", "Channel"]);

        let long = "x".repeat(3000);
        let embed = render(message_edited(
            &subject(),
            serenity::ChannelId::new(3),
            serenity::MessageId::new(99),
            &long,
            "short",
            "https://discord.com/channels/1/3/99",
            None,
        ));
        assert_eq!(field(&embed, "Before").map(|v| v.chars().count()), Some(1024));
        assert_eq!(
            field(&embed, "Jump to Message"),
            Some("[Click here](https://discord.com/channels/1/3/99)")
        );
    }

    #[test]
    fn test_deleted_by_only_shown_for_someone_else() {
        let own = render(message_deleted(
            &subject(),
            serenity::ChannelId::new(3),
            serenity::MessageId::new(99),
            serenity::Timestamp::now(),
            Some(serenity::UserId::new(7)),
            "bye",
            &[],
        ));
        assert_eq!(field(&own, "Deleted By"), None);

        let moderated = render(message_deleted(
            &subject(),
            serenity::ChannelId::new(3),
            serenity::MessageId::new(99),
            serenity::Timestamp::now(),
            Some(serenity::UserId::new(8)),
            "bye",
            &["cat.png".to_string()],
        ));
        assert_eq!(moderated["title"], "Message Deleted");
        assert_eq!(field(&moderated, "Deleted By"), Some("<@8> (`8`)"));
        assert_eq!(field(&moderated, "Attachments"), Some("cat.png"));
    }

    #[test]
    fn test_member_embeds() {
        let joined = render(member_joined(
            &subject(),
            serenity::Timestamp::from_unix_timestamp(0).unwrap(),
            Some(42),
        ));
        assert_eq!(field(&joined, "Account Created"), Some("1970-01-01 00:00:00 UTC"));
        assert_eq!(field(&joined, "Member Count"), Some("42"));

        let left = render(member_left(&subject(), None, None, &["Mod".into(), "VIP".into()]));
        assert_eq!(field(&left, "Joined At"), Some("Unknown"));
        assert_eq!(field(&left, "Member Count"), Some("Unknown"));
        assert_eq!(field(&left, "Roles"), Some("Mod, VIP"));
    }

    #[test]
    fn test_roles_updated_lists_only_non_empty_sides() {
        let embed = render(roles_updated(&subject(), &["Mod".into()], &[]));
        assert_eq!(embed["color"], BLUE);
        assert_eq!(field_names(&embed), vec!["User", "Roles Added"]);
    }

    #[test]
    fn test_voice_embeds() {
        let switched = render(voice_switched(&subject(), "General", "Music"));
        assert_eq!(switched["title"], "Voice Channel Switched");
        assert_eq!(field_names(&switched), vec!["From", "To", "User"]);

        let left = render(voice_left(&subject(), "General"));
        assert_eq!(left["color"], RED);
        assert_eq!(field(&left, "Channel"), Some("General"));
    }
}
