// Recently seen messages
// Delete events only carry ids, so the last N guild messages are kept here
// to know what was removed.

use std::num::NonZeroUsize;

use lru::LruCache;
use poise::serenity_prelude as serenity;
use tokio::sync::Mutex;

use crate::utils::embeds::Subject;

const FALLBACK_CAPACITY: NonZeroUsize = match NonZeroUsize::new(500) {
    Some(n) => n,
    None => unreachable!(),
};

/// Snapshot of a message as it was last seen
#[derive(Debug, Clone)]
pub struct TrackedMessage {
    pub id: serenity::MessageId,
    pub guild_id: serenity::GuildId,
    pub channel_id: serenity::ChannelId,
    pub author: Subject,
    pub author_is_bot: bool,
    pub content: String,
    pub attachment_urls: Vec<String>,
    pub attachment_names: Vec<String>,
    pub created_at: serenity::Timestamp,
}

impl TrackedMessage {
    /// Returns `None` for messages outside a guild
    pub fn from_message(msg: &serenity::Message) -> Option<Self> {
        let guild_id = msg.guild_id?;
        Some(Self {
            id: msg.id,
            guild_id,
            channel_id: msg.channel_id,
            author: Subject::mention(&msg.author),
            author_is_bot: msg.author.bot,
            content: msg.content.clone(),
            attachment_urls: msg.attachments.iter().map(|a| a.url.clone()).collect(),
            attachment_names: msg.attachments.iter().map(|a| a.filename.clone()).collect(),
            created_at: msg.timestamp,
        })
    }

    pub fn jump_url(&self) -> String {
        format!(
            "https://discord.com/channels/{}/{}/{}",
            self.guild_id, self.channel_id, self.id
        )
    }
}

/// Bounded LRU of tracked messages
pub struct MessageTracker {
    messages: Mutex<LruCache<serenity::MessageId, TrackedMessage>>,
}

impl MessageTracker {
    /// A capacity of zero falls back to 500
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(FALLBACK_CAPACITY);
        Self {
            messages: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub async fn track(&self, message: TrackedMessage) {
        self.messages.lock().await.put(message.id, message);
    }

    /// Replace the content of a tracked message, returning the previous snapshot
    pub async fn update_content(
        &self,
        id: serenity::MessageId,
        content: &str,
    ) -> Option<TrackedMessage> {
        let mut messages = self.messages.lock().await;
        let entry = messages.get_mut(&id)?;
        let previous = entry.clone();
        entry.content = content.to_string();
        Some(previous)
    }

    /// Forget a message, returning its last snapshot
    pub async fn remove(&self, id: serenity::MessageId) -> Option<TrackedMessage> {
        self.messages.lock().await.pop(&id)
    }

    pub async fn len(&self) -> usize {
        self.messages.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracked(id: u64, content: &str) -> TrackedMessage {
        TrackedMessage {
            id: serenity::MessageId::new(id),
            guild_id: serenity::GuildId::new(1),
            channel_id: serenity::ChannelId::new(2),
            author: Subject {
                id: serenity::UserId::new(3),
                label: "<@3>".to_string(),
                avatar_url: String::new(),
            },
            author_is_bot: false,
            content: content.to_string(),
            attachment_urls: Vec::new(),
            attachment_names: Vec::new(),
            created_at: serenity::Timestamp::now(),
        }
    }

    #[tokio::test]
    async fn test_track_and_remove() {
        let tracker = MessageTracker::new(10);
        tracker.track(tracked(100, "hello")).await;

        let removed = tracker.remove(serenity::MessageId::new(100)).await.unwrap();
        assert_eq!(removed.content, "hello");
        assert!(tracker.remove(serenity::MessageId::new(100)).await.is_none());
    }

    #[tokio::test]
    async fn test_update_returns_previous() {
        let tracker = MessageTracker::new(10);
        tracker.track(tracked(100, "before")).await;

        let previous = tracker
            .update_content(serenity::MessageId::new(100), "after")
            .await
            .unwrap();
        assert_eq!(previous.content, "before");

        let current = tracker.remove(serenity::MessageId::new(100)).await.unwrap();
        assert_eq!(current.content, "after");

        assert!(tracker
            .update_content(serenity::MessageId::new(999), "x")
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_capacity_evicts_oldest() {
        let tracker = MessageTracker::new(2);
        for id in 1..=3 {
            tracker.track(tracked(id, "m")).await;
        }

        assert_eq!(tracker.len().await, 2);
        assert!(tracker.remove(serenity::MessageId::new(1)).await.is_none());
        assert!(tracker.remove(serenity::MessageId::new(3)).await.is_some());
    }

    #[tokio::test]
    async fn test_zero_capacity_falls_back() {
        let tracker = MessageTracker::new(0);
        tracker.track(tracked(1, "m")).await;
        assert_eq!(tracker.len().await, 1);
    }

    #[test]
    fn test_jump_url() {
        assert_eq!(
            tracked(100, "").jump_url(),
            "https://discord.com/channels/1/2/100"
        );
    }
}
