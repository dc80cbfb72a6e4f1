// Log command group - per-guild logging configuration

use std::time::Duration;

use poise::serenity_prelude as serenity;
use serenity::Mentionable;
use tracing::{error, info};

use crate::models::guild::{validate_prefix, ConfigUpdate, Feature, GuildConfig, LogCategory};
use crate::store::ConfigError;
use crate::utils::config::{colors, SETUP_TIMEOUT_SECS};
use crate::{Context, Error};

/// Logging configuration
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    subcommands(
        "help", "setup", "status", "toggle", "channel", "channels", "clear", "prefix", "reset"
    )
)]
pub async fn log(ctx: Context<'_>) -> Result<(), Error> {
    ctx.say("Use `log help` to see available logging commands.").await?;
    Ok(())
}

fn guild_id(ctx: Context<'_>) -> Result<serenity::GuildId, Error> {
    ctx.guild_id()
        .ok_or_else(|| "This command can only be used in a server.".into())
}

/// Reply with a failure notice when a config write did not reach disk
async fn persisted<T>(ctx: Context<'_>, result: Result<T, ConfigError>) -> Result<Option<T>, Error> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            error!("Failed to save config for guild {:?}: {}", ctx.guild_id(), e);
            ctx.say("❌ Failed to save configuration.").await?;
            Ok(None)
        }
    }
}

async fn reply_embed(ctx: Context<'_>, embed: serenity::CreateEmbed) -> Result<(), Error> {
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

pub fn help_embed() -> serenity::CreateEmbed {
    let categories: Vec<&str> = LogCategory::ALL.iter().map(|c| c.as_str()).collect();

    serenity::CreateEmbed::new()
        .title("Logging Commands")
        .description("Per-server Discord logging")
        .color(colors::INFO)
        .field(
            "Configuration",
            "`log setup` - Initial setup wizard\n\
            `log status` - Show current configuration\n\
            `log toggle <feature>` - Toggle logging features\n\
            `log prefix <prefix>` - Set command prefix\n\
            `log reset` - Restore the default configuration",
            false,
        )
        .field(
            "Channel Management",
            "`log channel <type> <channel>` - Set log channel\n\
            `log channels` - List all log channels\n\
            `log clear <type>` - Clear log channel setting",
            false,
        )
        .field("Log Types", categories.join(", "), false)
}

/// Show available logging commands
#[poise::command(slash_command, prefix_command)]
pub async fn help(ctx: Context<'_>) -> Result<(), Error> {
    reply_embed(ctx, help_embed()).await
}

/// What the admin answered in the setup wizard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupReply {
    Skip,
    Channel(serenity::ChannelId),
    Invalid,
}

pub fn parse_setup_reply(content: &str) -> SetupReply {
    if content.trim().eq_ignore_ascii_case("skip") {
        return SetupReply::Skip;
    }
    content
        .split_whitespace()
        .find_map(::serenity::utils::parse_channel_mention)
        .map(SetupReply::Channel)
        .unwrap_or(SetupReply::Invalid)
}

/// Initial setup wizard
#[poise::command(slash_command, prefix_command, required_permissions = "ADMINISTRATOR")]
pub async fn setup(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = guild_id(ctx)?;

    let prompt = serenity::CreateEmbed::new()
        .title("Logging Setup Wizard")
        .description("Let's configure your server logging settings!")
        .color(colors::SUCCESS)
        .field(
            "Step 1",
            "Please mention the channel where you want to log all activities \
            (or type 'skip' to configure later):",
            false,
        );
    reply_embed(ctx, prompt).await?;

    let reply = serenity::MessageCollector::new(ctx.serenity_context())
        .author_id(ctx.author().id)
        .channel_id(ctx.channel_id())
        .timeout(Duration::from_secs(SETUP_TIMEOUT_SECS))
        .next()
        .await;

    let Some(reply) = reply else {
        ctx.say("Setup timed out. Please run the command again.").await?;
        return Ok(());
    };

    match parse_setup_reply(&reply.content) {
        SetupReply::Skip => {
            ctx.say("Setup completed! Use `log channel` commands to configure specific log channels.")
                .await?;
        }
        SetupReply::Invalid => {
            ctx.say("No valid channel mentioned. Setup cancelled.").await?;
        }
        SetupReply::Channel(channel_id) => {
            let result = ctx
                .data()
                .store
                .modify(guild_id, |config| {
                    config.log_channels.insert(LogCategory::Default, channel_id);
                })
                .await;
            if persisted(ctx, result).await?.is_none() {
                return Ok(());
            }

            info!("Guild {} set default log channel to {}", guild_id, channel_id);
            let embed = serenity::CreateEmbed::new()
                .title("Setup Complete!")
                .description(format!("Default log channel set to {}", channel_id.mention()))
                .color(colors::SUCCESS)
                .field(
                    "Next Steps",
                    "Use `log toggle` commands to enable/disable specific logging features\n\
                    Use `log channel` to set specific channels for different log types",
                    false,
                );
            reply_embed(ctx, embed).await?;
        }
    }

    Ok(())
}

fn channel_lines(config: &GuildConfig, exists: impl Fn(serenity::ChannelId) -> bool) -> Vec<(LogCategory, String)> {
    config
        .log_channels
        .iter()
        .map(|(category, channel_id)| {
            let value = if exists(*channel_id) {
                channel_id.mention().to_string()
            } else {
                "❌ Channel not found".to_string()
            };
            (*category, value)
        })
        .collect()
}

pub fn status_embed(config: &GuildConfig, exists: impl Fn(serenity::ChannelId) -> bool) -> serenity::CreateEmbed {
    let (enabled, disabled): (Vec<Feature>, Vec<Feature>) = Feature::ALL
        .iter()
        .partition(|feature| config.feature_enabled(**feature));
    let labels = |features: &[Feature]| {
        features
            .iter()
            .map(|f| f.label())
            .collect::<Vec<_>>()
            .join("\n")
    };

    let mut embed = serenity::CreateEmbed::new()
        .title("Logging Configuration")
        .color(colors::INFO);

    if !enabled.is_empty() {
        embed = embed.field("✅ Enabled Features", labels(&enabled), true);
    }
    if !disabled.is_empty() {
        embed = embed.field("❌ Disabled Features", labels(&disabled), true);
    }

    embed = embed.field("Command Prefix", format!("`{}`", config.prefix), false);

    let channels: Vec<String> = channel_lines(config, exists)
        .into_iter()
        .map(|(category, value)| format!("{}: {}", category.as_str(), value))
        .collect();
    if !channels.is_empty() {
        embed = embed.field("Log Channels", channels.join("\n"), false);
    }

    embed
}

fn channel_exists(
    ctx: Context<'_>,
    guild_id: serenity::GuildId,
    channel_id: serenity::ChannelId,
) -> bool {
    ctx.cache()
        .guild(guild_id)
        .is_some_and(|guild| guild.channels.contains_key(&channel_id))
}

/// Show current configuration
#[poise::command(slash_command, prefix_command, required_permissions = "ADMINISTRATOR")]
pub async fn status(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = guild_id(ctx)?;
    let config = ctx.data().store.get_config(guild_id).await;
    reply_embed(ctx, status_embed(&config, |id| channel_exists(ctx, guild_id, id))).await
}

/// Toggle a logging feature on or off
#[poise::command(slash_command, prefix_command, required_permissions = "ADMINISTRATOR")]
pub async fn toggle(
    ctx: Context<'_>,
    #[description = "Feature to toggle"] feature: Feature,
) -> Result<(), Error> {
    let guild_id = guild_id(ctx)?;
    let result = ctx
        .data()
        .store
        .modify(guild_id, |config| config.toggle(feature))
        .await;
    let Some(enabled) = persisted(ctx, result).await? else {
        return Ok(());
    };

    let status = if enabled { "enabled" } else { "disabled" };
    info!("Guild {} {} {} logging", guild_id, status, feature.title());
    ctx.say(format!("✅ {} logging has been **{}**.", feature.title(), status))
        .await?;
    Ok(())
}

/// Set the channel for a log type
#[poise::command(slash_command, prefix_command, required_permissions = "ADMINISTRATOR")]
pub async fn channel(
    ctx: Context<'_>,
    #[description = "Log type"] category: LogCategory,
    #[description = "Channel to log into"]
    #[channel_types("Text")]
    channel: serenity::GuildChannel,
) -> Result<(), Error> {
    let guild_id = guild_id(ctx)?;
    let channel_id = channel.id;
    let result = ctx
        .data()
        .store
        .modify(guild_id, |config| {
            config.log_channels.insert(category, channel_id);
        })
        .await;
    if persisted(ctx, result).await?.is_none() {
        return Ok(());
    }

    info!("Guild {} routed {} logs to {}", guild_id, category.as_str(), channel_id);
    ctx.say(format!(
        "✅ {} logging channel set to {}",
        category.title(),
        channel_id.mention()
    ))
    .await?;
    Ok(())
}

/// List all log channels
#[poise::command(slash_command, prefix_command, required_permissions = "ADMINISTRATOR")]
pub async fn channels(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = guild_id(ctx)?;
    let config = ctx.data().store.get_config(guild_id).await;

    let lines = channel_lines(&config, |id| channel_exists(ctx, guild_id, id));
    if lines.is_empty() {
        ctx.say("No log channels configured. Use `log channel` to set them up.")
            .await?;
        return Ok(());
    }

    let embed = lines.into_iter().fold(
        serenity::CreateEmbed::new()
            .title("Configured Log Channels")
            .color(colors::INFO),
        |embed, (category, value)| embed.field(category.title(), value, true),
    );
    reply_embed(ctx, embed).await
}

/// Clear the channel for a log type
#[poise::command(slash_command, prefix_command, required_permissions = "ADMINISTRATOR")]
pub async fn clear(
    ctx: Context<'_>,
    #[description = "Log type"] category: LogCategory,
) -> Result<(), Error> {
    let guild_id = guild_id(ctx)?;
    let store = &ctx.data().store;

    if !store.get_config(guild_id).await.log_channels.contains_key(&category) {
        ctx.say(format!("No {} logging channel was configured.", category.as_str()))
            .await?;
        return Ok(());
    }

    let result = store
        .modify(guild_id, |config| config.log_channels.remove(&category).is_some())
        .await;
    let Some(removed) = persisted(ctx, result).await? else {
        return Ok(());
    };

    if removed {
        info!("Guild {} cleared {} log channel", guild_id, category.as_str());
        ctx.say(format!("✅ {} logging channel cleared.", category.title()))
            .await?;
    } else {
        ctx.say(format!("No {} logging channel was configured.", category.as_str()))
            .await?;
    }
    Ok(())
}

/// Set the command prefix
#[poise::command(slash_command, prefix_command, required_permissions = "ADMINISTRATOR")]
pub async fn prefix(
    ctx: Context<'_>,
    #[description = "New prefix (1-5 characters)"] prefix: String,
) -> Result<(), Error> {
    let guild_id = guild_id(ctx)?;

    if let Err(reason) = validate_prefix(&prefix) {
        ctx.say(format!("❌ {}", reason)).await?;
        return Ok(());
    }

    let result = ctx
        .data()
        .store
        .update_config(guild_id, ConfigUpdate::prefix(prefix.clone()))
        .await;
    if persisted(ctx, result).await?.is_none() {
        return Ok(());
    }

    info!("Guild {} prefix set to {:?}", guild_id, prefix);
    ctx.say(format!("✅ Command prefix set to `{}`", prefix)).await?;
    Ok(())
}

/// Reset this server's logging configuration
#[poise::command(slash_command, prefix_command, required_permissions = "ADMINISTRATOR")]
pub async fn reset(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = guild_id(ctx)?;
    let result = ctx.data().store.delete_config(guild_id).await;
    if persisted(ctx, result).await?.is_none() {
        return Ok(());
    }

    info!("Guild {} reset its logging configuration", guild_id);
    ctx.say("✅ Logging configuration reset to defaults.").await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn field<'a>(embed: &'a Value, name: &str) -> Option<&'a str> {
        embed["fields"]
            .as_array()?
            .iter()
            .find(|f| f["name"] == name)
            .and_then(|f| f["value"].as_str())
    }

    #[test]
    fn test_parse_setup_reply() {
        assert_eq!(parse_setup_reply("skip"), SetupReply::Skip);
        assert_eq!(parse_setup_reply("  SKIP "), SetupReply::Skip);
        assert_eq!(
            parse_setup_reply("use <#123456> please"),
            SetupReply::Channel(serenity::ChannelId::new(123456))
        );
        assert_eq!(parse_setup_reply("general"), SetupReply::Invalid);
        assert_eq!(parse_setup_reply(""), SetupReply::Invalid);
    }

    #[test]
    fn test_status_embed_defaults() {
        let embed = serde_json::to_value(status_embed(&GuildConfig::default(), |_| true)).unwrap();

        let enabled = field(&embed, "✅ Enabled Features").unwrap();
        assert!(enabled.contains("Main Logging"));
        assert!(enabled.contains("Voice Activity Logging"));
        assert!(field(&embed, "❌ Disabled Features").is_none());
        assert_eq!(field(&embed, "Command Prefix"), Some("`!`"));
        assert!(field(&embed, "Log Channels").is_none());
    }

    #[test]
    fn test_status_embed_lists_disabled_and_channels() {
        let mut config = GuildConfig::default();
        config.toggle(Feature::Voice);
        config
            .log_channels
            .insert(LogCategory::Default, serenity::ChannelId::new(5));
        config
            .log_channels
            .insert(LogCategory::Edits, serenity::ChannelId::new(6));

        let embed = serde_json::to_value(status_embed(&config, |id| id.get() == 5)).unwrap();

        assert_eq!(field(&embed, "❌ Disabled Features"), Some("Voice Activity Logging"));
        assert_eq!(
            field(&embed, "Log Channels"),
            Some("edits: ❌ Channel not found\ndefault: <#5>")
        );
    }

    #[test]
    fn test_help_embed_lists_categories() {
        let embed = serde_json::to_value(help_embed()).unwrap();
        assert_eq!(
            field(&embed, "Log Types"),
            Some("messages, edits, deletions, joins, leaves, roles, voice, default")
        );
    }
}
