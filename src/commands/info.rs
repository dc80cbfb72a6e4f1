// Info commands - latency and bot overview

use std::time::Duration;

use poise::serenity_prelude as serenity;

use crate::utils::config::colors;
use crate::{Context, Error};

pub fn latency_text(latency: Duration) -> String {
    if latency.is_zero() {
        "Bot latency: measuring...".to_string()
    } else {
        format!("Bot latency: {}ms", latency.as_millis())
    }
}

/// Check gateway latency
#[poise::command(slash_command, prefix_command)]
pub async fn ping(ctx: Context<'_>) -> Result<(), Error> {
    let embed = serenity::CreateEmbed::new()
        .title("🏓 Pong!")
        .description(latency_text(ctx.ping().await))
        .color(colors::SUCCESS);

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

pub fn info_embed(guilds: usize, users: usize) -> serenity::CreateEmbed {
    serenity::CreateEmbed::new()
        .title("Discord Logging Bot")
        .description("Server logging with message tracking and administrative controls")
        .color(colors::INFO)
        .field("Servers", guilds.to_string(), true)
        .field("Users", users.to_string(), true)
        .field(
            "Features",
            "• Message Logging\n\
            • Edit/Delete Tracking\n\
            • User Activity\n\
            • Voice Logging\n\
            • Role Changes\n\
            • Configurable Settings",
            false,
        )
        .field("Commands", "Use `log help` for all logging commands", false)
        .footer(serenity::CreateEmbedFooter::new("Built with Serenity & Poise"))
}

/// Show bot information
#[poise::command(slash_command, prefix_command)]
pub async fn info(ctx: Context<'_>) -> Result<(), Error> {
    let cache = ctx.cache();
    let embed = info_embed(cache.guild_count(), cache.user_count());

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}
