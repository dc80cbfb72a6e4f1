// Owner commands - config snapshots and log file housekeeping

use std::path::PathBuf;

use poise::serenity_prelude as serenity;
use tracing::{error, info};

use crate::commands::log::status_embed;
use crate::utils::config::colors;
use crate::utils::formatters::{format_file_size, truncate};
use crate::utils::logging::{clear_logs, log_file_stats, LogFileStat};
use crate::{Context, Error};

const DESCRIPTION_LIMIT: usize = 4096;

fn target_dir(ctx: Context<'_>, path: Option<String>) -> PathBuf {
    path.map(PathBuf::from)
        .unwrap_or_else(|| ctx.data().backup_dir.clone())
}

/// Snapshot every guild configuration into a directory
#[poise::command(slash_command, prefix_command, owners_only, hide_in_help)]
pub async fn backup(
    ctx: Context<'_>,
    #[description = "Backup directory (defaults to BACKUP_DIR)"] path: Option<String>,
) -> Result<(), Error> {
    let dir = target_dir(ctx, path);
    ctx.defer().await?;

    match ctx.data().store.backup(&dir).await {
        Ok(()) => {
            info!("{} backed up configs to {}", ctx.author().tag(), dir.display());
            ctx.say(format!("✅ Configurations backed up to `{}`", dir.display()))
                .await?;
        }
        Err(e) => {
            error!("Backup to {} failed: {}", dir.display(), e);
            ctx.say(format!("❌ Backup failed: {}", e)).await?;
        }
    }
    Ok(())
}

/// Replace every guild configuration with a snapshot
#[poise::command(slash_command, prefix_command, owners_only, hide_in_help)]
pub async fn restore(
    ctx: Context<'_>,
    #[description = "Backup directory (defaults to BACKUP_DIR)"] path: Option<String>,
) -> Result<(), Error> {
    let dir = target_dir(ctx, path);
    ctx.defer().await?;

    match ctx.data().store.restore(&dir).await {
        Ok(()) => {
            info!("{} restored configs from {}", ctx.author().tag(), dir.display());
            ctx.say(format!("✅ Configurations restored from `{}`", dir.display()))
                .await?;
        }
        Err(e) => {
            error!("Restore from {} failed: {}", dir.display(), e);
            ctx.say(format!("❌ Restore failed: {}", e)).await?;
        }
    }
    Ok(())
}

/// Default template handed to servers without a configuration
#[poise::command(
    slash_command,
    prefix_command,
    owners_only,
    hide_in_help,
    subcommands("show", "reload", "save", "apply")
)]
pub async fn template(ctx: Context<'_>) -> Result<(), Error> {
    ctx.say("Use `template show`, `template reload`, `template save` or `template apply`.")
        .await?;
    Ok(())
}

async fn reply_template(ctx: Context<'_>) -> Result<(), Error> {
    let defaults = ctx.data().store.defaults().await;
    let embed = status_embed(&defaults, |_| true).title("Default Template");
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Show the default template
#[poise::command(slash_command, prefix_command, owners_only)]
pub async fn show(ctx: Context<'_>) -> Result<(), Error> {
    reply_template(ctx).await
}

/// Re-read the default template from disk
#[poise::command(slash_command, prefix_command, owners_only)]
pub async fn reload(ctx: Context<'_>) -> Result<(), Error> {
    ctx.data().store.load_default().await;
    info!("{} reloaded the default template", ctx.author().tag());
    reply_template(ctx).await
}

/// Make this server's configuration the default template
#[poise::command(slash_command, prefix_command, owners_only, guild_only)]
pub async fn save(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command can only be used in a server.")?;
    let store = &ctx.data().store;

    let config = store.get_config(guild_id).await;
    store.save_defaults(config).await?;
    info!("{} saved guild {} as the default template", ctx.author().tag(), guild_id);
    reply_template(ctx).await
}

/// Reset this server's switches and prefix to the template, keeping its channels
#[poise::command(slash_command, prefix_command, owners_only, guild_only)]
pub async fn apply(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command can only be used in a server.")?;
    let store = &ctx.data().store;

    let mut config = store.defaults().await;
    config.log_channels = store.get_config(guild_id).await.log_channels;
    store.save_config(guild_id, config).await?;

    info!("{} applied the default template to guild {}", ctx.author().tag(), guild_id);
    ctx.say("✅ Default template applied. Log channels were kept.").await?;
    Ok(())
}

/// Runtime counters shown next to the log files
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeStats {
    pub cached_configs: usize,
    pub tracked_messages: usize,
}

pub fn log_stats_embed(stats: &[LogFileStat], runtime: RuntimeStats) -> serenity::CreateEmbed {
    let total: u64 = stats.iter().map(|s| s.size).sum();
    let lines: Vec<String> = stats
        .iter()
        .map(|stat| {
            let modified = stat
                .modified
                .map(|m| m.format("%Y-%m-%d %H:%M UTC").to_string())
                .unwrap_or_else(|| "Unknown".to_string());
            format!("`{}` - {} - {}", stat.name, format_file_size(stat.size), modified)
        })
        .collect();

    let description = if lines.is_empty() {
        "No log files found.".to_string()
    } else {
        truncate(&lines.join("\n"), DESCRIPTION_LIMIT)
    };

    serenity::CreateEmbed::new()
        .title("Log Files")
        .description(description)
        .color(colors::INFO)
        .field("Files", stats.len().to_string(), true)
        .field("Total Size", format_file_size(total), true)
        .field("Cached Configs", runtime.cached_configs.to_string(), true)
        .field("Tracked Messages", runtime.tracked_messages.to_string(), true)
}

/// Show log file sizes, optionally truncating them first
#[poise::command(slash_command, prefix_command, owners_only, hide_in_help)]
pub async fn logstats(
    ctx: Context<'_>,
    #[description = "Truncate every log file first"] clear: Option<bool>,
) -> Result<(), Error> {
    let data = ctx.data();
    let dir = data.log_dir.clone();

    if clear.unwrap_or(false) {
        let cleared = clear_logs(&dir).await?;
        info!("{} cleared {} log files", ctx.author().tag(), cleared);
    }

    let stats = log_file_stats(&dir).await?;
    let runtime = RuntimeStats {
        cached_configs: data.store.cached_guilds(),
        tracked_messages: data.messages.len().await,
    };
    ctx.send(poise::CreateReply::default().embed(log_stats_embed(&stats, runtime)))
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_log_stats_embed() {
        let stats = vec![
            LogFileStat {
                name: "bot.2026-10-19.log".to_string(),
                size: 2048,
                modified: Utc.with_ymd_and_hms(2026, 10, 19, 8, 30, 0).single(),
            },
            LogFileStat {
                name: "errors.2026-10-19.log".to_string(),
                size: 0,
                modified: None,
            },
        ];

        let runtime = RuntimeStats {
            cached_configs: 4,
            tracked_messages: 120,
        };
        let embed = serde_json::to_value(log_stats_embed(&stats, runtime)).unwrap();
        assert_eq!(
            embed["description"],
            "`bot.2026-10-19.log` - 2.0 KB - 2026-10-19 08:30 UTC\n\
            `errors.2026-10-19.log` - 0 B - Unknown"
        );
        assert_eq!(embed["fields"][0]["value"], "2");
        assert_eq!(embed["fields"][1]["value"], "2.0 KB");
        assert_eq!(embed["fields"][2]["value"], "4");
        assert_eq!(embed["fields"][3]["value"], "120");
    }

    #[test]
    fn test_log_stats_embed_empty() {
        let embed = serde_json::to_value(log_stats_embed(&[], RuntimeStats::default())).unwrap();
        assert_eq!(embed["description"], "No log files found.");
        assert_eq!(embed["fields"][1]["value"], "0 B");
    }
}
