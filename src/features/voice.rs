// Voice channel join / leave / switch logging

use anyhow::Result;
use poise::serenity_prelude as serenity;
use serenity::Mentionable;
use tracing::info;

use super::{deliver, destination};
use crate::models::guild::LogCategory;
use crate::utils::embeds::{self, Subject};
use crate::utils::logging::EVENT_TARGET;
use crate::Data;

/// What a voice state change means for the member
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceTransition {
    Joined(serenity::ChannelId),
    Left(serenity::ChannelId),
    Switched {
        from: serenity::ChannelId,
        to: serenity::ChannelId,
    },
}

/// `None` for mute, deafen, stream and other same-channel updates
pub fn classify(
    before: Option<serenity::ChannelId>,
    after: Option<serenity::ChannelId>,
) -> Option<VoiceTransition> {
    match (before, after) {
        (None, Some(to)) => Some(VoiceTransition::Joined(to)),
        (Some(from), None) => Some(VoiceTransition::Left(from)),
        (Some(from), Some(to)) if from != to => Some(VoiceTransition::Switched { from, to }),
        _ => None,
    }
}

/// `name (<#id>)`, or just the mention for channels missing from the cache
fn channel_label(name: Option<&str>, channel_id: serenity::ChannelId) -> String {
    match name {
        Some(name) => format!("{} ({})", name, channel_id.mention()),
        None => channel_id.mention().to_string(),
    }
}

fn channel_name(
    ctx: &serenity::Context,
    guild_id: serenity::GuildId,
    channel_id: serenity::ChannelId,
) -> String {
    let name = ctx
        .cache
        .guild(guild_id)
        .and_then(|guild| guild.channels.get(&channel_id).map(|c| c.name.clone()));
    channel_label(name.as_deref(), channel_id)
}

pub async fn on_voice_state_update(
    ctx: &serenity::Context,
    data: &Data,
    old: Option<&serenity::VoiceState>,
    new: &serenity::VoiceState,
) -> Result<()> {
    let Some(guild_id) = new.guild_id else {
        return Ok(());
    };
    let Some(transition) = classify(old.and_then(|s| s.channel_id), new.channel_id) else {
        return Ok(());
    };

    let Some(channel) = destination(data, guild_id, LogCategory::Voice).await else {
        return Ok(());
    };

    let subject = match &new.member {
        Some(member) => Subject::mention(&member.user),
        None => Subject::mention(&new.user_id.to_user(ctx).await?),
    };

    let name = |id| channel_name(ctx, guild_id, id);
    let embed = match transition {
        VoiceTransition::Joined(to) => embeds::voice_joined(&subject, &name(to)),
        VoiceTransition::Left(from) => embeds::voice_left(&subject, &name(from)),
        VoiceTransition::Switched { from, to } => {
            embeds::voice_switched(&subject, &name(from), &name(to))
        }
    };
    deliver(ctx, channel, embed).await;

    info!(target: EVENT_TARGET, "Voice {:?} by {} in guild {}", transition, subject.id, guild_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ch(id: u64) -> Option<serenity::ChannelId> {
        Some(serenity::ChannelId::new(id))
    }

    #[test]
    fn test_classify_join_and_leave() {
        assert_eq!(
            classify(None, ch(1)),
            Some(VoiceTransition::Joined(serenity::ChannelId::new(1)))
        );
        assert_eq!(
            classify(ch(1), None),
            Some(VoiceTransition::Left(serenity::ChannelId::new(1)))
        );
    }

    #[test]
    fn test_classify_switch() {
        assert_eq!(
            classify(ch(1), ch(2)),
            Some(VoiceTransition::Switched {
                from: serenity::ChannelId::new(1),
                to: serenity::ChannelId::new(2),
            })
        );
    }

    #[test]
    fn test_classify_same_channel_is_ignored() {
        assert_eq!(classify(ch(1), ch(1)), None);
        assert_eq!(classify(None, None), None);
    }

    #[test]
    fn test_channel_label() {
        let id = serenity::ChannelId::new(42);
        assert_eq!(channel_label(Some("General"), id), "General (<#42>)");
        assert_eq!(channel_label(None, id), "<#42>");
    }
}
