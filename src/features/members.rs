// Member join / leave / role change logging

use anyhow::Result;
use poise::serenity_prelude as serenity;
use serenity::Mentionable;
use tracing::info;

use super::{deliver, destination};
use crate::models::guild::LogCategory;
use crate::utils::embeds::{self, Subject};
use crate::utils::formatters::escape_markdown;
use crate::utils::logging::EVENT_TARGET;
use crate::Data;

fn member_count(ctx: &serenity::Context, guild_id: serenity::GuildId) -> Option<u64> {
    ctx.cache.guild(guild_id).map(|guild| guild.member_count)
}

/// Role names from the cache; unknown roles fall back to a mention
fn role_names(
    ctx: &serenity::Context,
    guild_id: serenity::GuildId,
    roles: &[serenity::RoleId],
) -> Vec<String> {
    let guild = ctx.cache.guild(guild_id);
    roles
        .iter()
        .map(|id| {
            guild
                .as_ref()
                .and_then(|g| g.roles.get(id))
                .map(|role| escape_markdown(&role.name))
                .unwrap_or_else(|| id.mention().to_string())
        })
        .collect()
}

/// Roles present only in `after`, and roles present only in `before`
pub fn diff_roles(
    before: &[serenity::RoleId],
    after: &[serenity::RoleId],
) -> (Vec<serenity::RoleId>, Vec<serenity::RoleId>) {
    let added = after.iter().filter(|r| !before.contains(r)).copied().collect();
    let removed = before.iter().filter(|r| !after.contains(r)).copied().collect();
    (added, removed)
}

pub async fn on_member_join(ctx: &serenity::Context, data: &Data, member: &serenity::Member) -> Result<()> {
    let Some(channel) = destination(data, member.guild_id, LogCategory::Joins).await else {
        return Ok(());
    };

    let subject = Subject::mention(&member.user);
    let embed = embeds::member_joined(
        &subject,
        member.user.id.created_at(),
        member_count(ctx, member.guild_id),
    );
    deliver(ctx, channel, embed).await;

    info!(target: EVENT_TARGET, "{} joined guild {}", member.user.tag(), member.guild_id);
    Ok(())
}

pub async fn on_member_leave(
    ctx: &serenity::Context,
    data: &Data,
    guild_id: serenity::GuildId,
    user: &serenity::User,
    member: Option<&serenity::Member>,
) -> Result<()> {
    let Some(channel) = destination(data, guild_id, LogCategory::Leaves).await else {
        return Ok(());
    };

    // A departed user can no longer be mentioned reliably
    let subject = Subject::tag(user);
    let roles = member
        .map(|m| role_names(ctx, guild_id, &m.roles))
        .unwrap_or_default();
    let embed = embeds::member_left(
        &subject,
        member.and_then(|m| m.joined_at),
        member_count(ctx, guild_id),
        &roles,
    );
    deliver(ctx, channel, embed).await;

    info!(target: EVENT_TARGET, "{} left guild {}", user.tag(), guild_id);
    Ok(())
}

pub async fn on_member_update(
    ctx: &serenity::Context,
    data: &Data,
    old: Option<&serenity::Member>,
    event: &serenity::GuildMemberUpdateEvent,
) -> Result<()> {
    // Without the previous state there is nothing to compare against
    let Some(old) = old else {
        return Ok(());
    };
    let (added, removed) = diff_roles(&old.roles, &event.roles);
    if added.is_empty() && removed.is_empty() {
        return Ok(());
    }

    let Some(channel) = destination(data, event.guild_id, LogCategory::Roles).await else {
        return Ok(());
    };

    let subject = Subject::mention(&event.user);
    let embed = embeds::roles_updated(
        &subject,
        &role_names(ctx, event.guild_id, &added),
        &role_names(ctx, event.guild_id, &removed),
    );
    deliver(ctx, channel, embed).await;

    info!(
        target: EVENT_TARGET,
        "Roles of {} changed in guild {}: +{} -{}",
        event.user.tag(),
        event.guild_id,
        added.len(),
        removed.len()
    );
    Ok(())
}
