// Gateway event handlers
// Each handler turns one kind of guild activity into a log entry

pub mod guilds;
pub mod members;
pub mod message_cache;
pub mod messages;
pub mod voice;

use poise::serenity_prelude as serenity;
use tracing::{debug, error, warn};

use crate::models::guild::LogCategory;
use crate::utils::logging::EVENT_TARGET;
use crate::{Data, Error};

/// poise `event_handler` entry point
pub async fn handle_event(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    let result = match event {
        serenity::FullEvent::Ready { data_about_bot } => guilds::on_ready(ctx, data_about_bot).await,
        serenity::FullEvent::GuildCreate { guild, is_new } => {
            guilds::on_guild_create(data, guild, *is_new).await
        }
        serenity::FullEvent::GuildDelete { incomplete, .. } => {
            guilds::on_guild_delete(data, incomplete).await
        }
        serenity::FullEvent::Message { new_message } => {
            messages::on_message(ctx, data, new_message).await
        }
        serenity::FullEvent::MessageUpdate { event, .. } => {
            messages::on_message_edit(ctx, data, event).await
        }
        serenity::FullEvent::MessageDelete {
            deleted_message_id,
            guild_id,
            ..
        } => messages::on_message_delete(ctx, data, *guild_id, *deleted_message_id).await,
        serenity::FullEvent::GuildMemberAddition { new_member } => {
            members::on_member_join(ctx, data, new_member).await
        }
        serenity::FullEvent::GuildMemberRemoval {
            guild_id,
            user,
            member_data_if_available,
        } => {
            members::on_member_leave(ctx, data, *guild_id, user, member_data_if_available.as_ref())
                .await
        }
        serenity::FullEvent::GuildMemberUpdate {
            old_if_available,
            event,
            ..
        } => members::on_member_update(ctx, data, old_if_available.as_ref(), event).await,
        serenity::FullEvent::VoiceStateUpdate { old, new } => {
            voice::on_voice_state_update(ctx, data, old.as_ref(), new).await
        }
        _ => Ok(()),
    };

    // Handler errors stop here
    if let Err(e) = result {
        error!(target: EVENT_TARGET, "Error handling {}: {:?}", event.snake_case_name(), e);
    }

    Ok(())
}

/// Channel a guild wants `category` entries in, if that kind of logging is on
pub(crate) async fn destination(
    data: &Data,
    guild_id: serenity::GuildId,
    category: LogCategory,
) -> Option<serenity::ChannelId> {
    let channel = data.store.get_config(guild_id).await.route(category);
    if channel.is_none() {
        debug!(target: EVENT_TARGET, "{} logging off for guild {}", category.as_str(), guild_id);
    }
    channel
}

/// Post a log entry; send failures are logged and swallowed
pub(crate) async fn deliver(
    ctx: &serenity::Context,
    channel_id: serenity::ChannelId,
    embed: serenity::CreateEmbed,
) {
    let message = serenity::CreateMessage::new().embed(embed);
    if let Err(e) = channel_id.send_message(&ctx.http, message).await {
        warn!(target: EVENT_TARGET, "Failed to post log entry to {}: {}", channel_id, e);
    }
}
