// Message sent / edited / deleted logging

use ::serenity::model::guild::audit_log::{Action, MessageAction};
use anyhow::Result;
use poise::serenity_prelude as serenity;
use tracing::{debug, info};

use super::message_cache::TrackedMessage;
use super::{deliver, destination};
use crate::models::guild::LogCategory;
use crate::utils::embeds;
use crate::utils::logging::EVENT_TARGET;
use crate::Data;

pub async fn on_message(ctx: &serenity::Context, data: &Data, msg: &serenity::Message) -> Result<()> {
    if msg.author.bot {
        return Ok(());
    }
    let Some(tracked) = TrackedMessage::from_message(msg) else {
        return Ok(());
    };

    // Tracked even when message logging is off so edits and deletions still resolve
    data.messages.track(tracked.clone()).await;

    let Some(channel) = destination(data, tracked.guild_id, LogCategory::Messages).await else {
        return Ok(());
    };

    let embed = embeds::message_sent(
        &tracked.author,
        tracked.channel_id,
        tracked.id,
        &tracked.content,
        &tracked.attachment_urls,
        tracked.created_at,
    );
    deliver(ctx, channel, embed).await;

    info!(
        target: EVENT_TARGET,
        "Message {} by {} in guild {}", tracked.id, tracked.author.id, tracked.guild_id
    );
    Ok(())
}

/// Only human edits that change the text are logged
fn is_loggable_edit(previous: &TrackedMessage, content: &str) -> bool {
    !previous.author_is_bot && previous.content != content
}

pub async fn on_message_edit(
    ctx: &serenity::Context,
    data: &Data,
    event: &serenity::MessageUpdateEvent,
) -> Result<()> {
    if event.guild_id.is_none() {
        return Ok(());
    }
    // Embed unfurls arrive as updates without content
    let Some(content) = event.content.as_deref() else {
        return Ok(());
    };
    let Some(previous) = data.messages.update_content(event.id, content).await else {
        debug!(target: EVENT_TARGET, "Edited message {} not in cache", event.id);
        return Ok(());
    };
    if !is_loggable_edit(&previous, content) {
        return Ok(());
    }

    let Some(channel) = destination(data, previous.guild_id, LogCategory::Edits).await else {
        return Ok(());
    };

    let embed = embeds::message_edited(
        &previous.author,
        previous.channel_id,
        previous.id,
        &previous.content,
        content,
        &previous.jump_url(),
        event.edited_timestamp,
    );
    deliver(ctx, channel, embed).await;

    info!(
        target: EVENT_TARGET,
        "Message {} edited by {} in guild {}", previous.id, previous.author.id, previous.guild_id
    );
    Ok(())
}

/// Most recent message-delete audit entry targeting `author`, if visible
async fn find_deleter(
    ctx: &serenity::Context,
    guild_id: serenity::GuildId,
    author: serenity::UserId,
) -> Option<serenity::UserId> {
    let action = Action::Message(MessageAction::Delete);
    match guild_id.audit_logs(&ctx.http, Some(action), None, None, Some(1)).await {
        Ok(logs) => logs
            .entries
            .into_iter()
            .find(|entry| entry.target_id.map(|t| t.get()) == Some(author.get()))
            .map(|entry| entry.user_id),
        Err(e) => {
            debug!(target: EVENT_TARGET, "Audit log unavailable for guild {}: {}", guild_id, e);
            None
        }
    }
}

pub async fn on_message_delete(
    ctx: &serenity::Context,
    data: &Data,
    guild_id: Option<serenity::GuildId>,
    message_id: serenity::MessageId,
) -> Result<()> {
    if guild_id.is_none() {
        return Ok(());
    }
    let Some(deleted) = data.messages.remove(message_id).await else {
        debug!(target: EVENT_TARGET, "Deleted message {} not in cache", message_id);
        return Ok(());
    };
    if deleted.author_is_bot {
        return Ok(());
    }

    let Some(channel) = destination(data, deleted.guild_id, LogCategory::Deletions).await else {
        return Ok(());
    };

    let deleted_by = find_deleter(ctx, deleted.guild_id, deleted.author.id).await;
    let embed = embeds::message_deleted(
        &deleted.author,
        deleted.channel_id,
        deleted.id,
        deleted.created_at,
        deleted_by,
        &deleted.content,
        &deleted.attachment_names,
    );
    deliver(ctx, channel, embed).await;

    info!(
        target: EVENT_TARGET,
        "Message {} by {} deleted in guild {}", deleted.id, deleted.author.id, deleted.guild_id
    );
    Ok(())
}
