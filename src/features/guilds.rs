// Guild lifecycle: ready, joined, removed

use anyhow::Result;
use poise::serenity_prelude as serenity;
use tracing::info;

use crate::Data;

/// "Watching N servers"
pub fn presence_text(guild_count: usize) -> String {
    format!("{} servers", guild_count)
}

pub async fn on_ready(ctx: &serenity::Context, ready: &serenity::Ready) -> Result<()> {
    let guild_count = ready.guilds.len();
    info!("{} has connected to Discord", ready.user.tag());
    info!("Bot is in {} guilds", guild_count);

    ctx.set_activity(Some(serenity::ActivityData::watching(presence_text(guild_count))));
    Ok(())
}

/// A first-time join gets a config seeded from the default template
pub async fn on_guild_create(data: &Data, guild: &serenity::Guild, is_new: Option<bool>) -> Result<()> {
    if is_new != Some(true) {
        return Ok(());
    }

    data.store.create_default_config(guild.id).await?;
    info!("Joined guild {} ({}), default config created", guild.name, guild.id);
    Ok(())
}

/// Outages also arrive as guild deletes; only a real removal drops the config
pub async fn on_guild_delete(data: &Data, incomplete: &serenity::UnavailableGuild) -> Result<()> {
    if incomplete.unavailable {
        return Ok(());
    }

    data.store.delete_config(incomplete.id).await?;
    info!("Removed from guild {}, config deleted", incomplete.id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presence_text() {
        assert_eq!(presence_text(0), "0 servers");
        assert_eq!(presence_text(42), "42 servers");
    }
}
