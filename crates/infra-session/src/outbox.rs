// Outbox Notifier - bounded queue of rendered notices for the chat bridge

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use eduqueue_core::domain::{ChannelId, GuildId, Notice, ParticipantId, QueueIdentity};
use eduqueue_core::port::{IdProvider, Notifier, NotifyError, TimeProvider};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::presence::PresenceTable;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboxRecipient {
    Participant {
        guild: GuildId,
        participant: ParticipantId,
    },
    Channel {
        guild: GuildId,
        channel: ChannelId,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct OutboxEntry {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub recipient: OutboxRecipient,
    /// Plain-text rendering
    pub text: String,
    /// Structured form, for bridges that render their own wording
    pub notice: Notice,
}

/// Notifier that buffers notices until the bridge drains them.
///
/// Direct notices are only accepted for members the presence table knows
/// about. When full, the oldest entry is dropped.
pub struct OutboxNotifier {
    entries: Mutex<VecDeque<OutboxEntry>>,
    capacity: usize,
    roster: Arc<PresenceTable>,
    id_provider: Arc<dyn IdProvider>,
    time_provider: Arc<dyn TimeProvider>,
}

impl OutboxNotifier {
    pub fn new(
        capacity: usize,
        roster: Arc<PresenceTable>,
        id_provider: Arc<dyn IdProvider>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
            capacity: capacity.max(1),
            roster,
            id_provider,
            time_provider,
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Take up to `limit` entries (all when None), oldest first
    pub async fn drain(&self, limit: Option<usize>) -> Vec<OutboxEntry> {
        let mut entries = self.entries.lock().await;
        let count = limit.unwrap_or(entries.len()).min(entries.len());
        entries.drain(..count).collect()
    }

    async fn push(&self, recipient: OutboxRecipient, notice: &Notice) {
        let entry = OutboxEntry {
            id: self.id_provider.generate_id(),
            created_at: crate::timestamp(self.time_provider.now_millis()),
            recipient,
            text: notice.to_string(),
            notice: notice.clone(),
        };

        let mut entries = self.entries.lock().await;
        if entries.len() >= self.capacity {
            if let Some(dropped) = entries.pop_front() {
                warn!(id = %dropped.id, capacity = self.capacity, "Outbox full, dropping oldest notice");
            }
        }
        debug!(id = %entry.id, "Notice queued");
        entries.push_back(entry);
    }
}

#[async_trait]
impl Notifier for OutboxNotifier {
    async fn notify_participant(
        &self,
        guild: GuildId,
        participant: ParticipantId,
        notice: &Notice,
    ) -> Result<(), NotifyError> {
        if !self.roster.is_known(guild, participant).await {
            return Err(NotifyError::UnknownRecipient(format!("{guild}/{participant}")));
        }
        self.push(OutboxRecipient::Participant { guild, participant }, notice)
            .await;
        Ok(())
    }

    async fn notify_channel(&self, identity: QueueIdentity, notice: &Notice) -> Result<(), NotifyError> {
        self.push(
            OutboxRecipient::Channel {
                guild: identity.guild,
                channel: identity.channel,
            },
            notice,
        )
        .await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presence::PresenceUpdate;
    use eduqueue_core::port::id_provider::mocks::SequentialIdProvider;
    use eduqueue_core::port::time_provider::mocks::FixedTimeProvider;

    async fn outbox(capacity: usize) -> OutboxNotifier {
        let ids: Arc<dyn IdProvider> = Arc::new(SequentialIdProvider::new());
        let clock: Arc<dyn TimeProvider> = Arc::new(FixedTimeProvider::new(0));
        let roster = Arc::new(PresenceTable::new(ids.clone(), clock.clone()));
        roster
            .apply([PresenceUpdate {
                guild: GuildId(1),
                participant: ParticipantId(5),
                location: None,
                left: false,
            }])
            .await;
        OutboxNotifier::new(capacity, roster, ids, clock)
    }

    fn notice(position: usize) -> Notice {
        Notice::ReturnedToQueue {
            channel: ChannelId(2),
            position,
        }
    }

    #[tokio::test]
    async fn test_unknown_participant_is_rejected() {
        let outbox = outbox(10).await;
        let err = outbox
            .notify_participant(GuildId(1), ParticipantId(6), &notice(0))
            .await
            .unwrap_err();
        assert!(matches!(err, NotifyError::UnknownRecipient(_)));
        assert!(outbox.is_empty().await);
    }

    #[tokio::test]
    async fn test_entries_are_rendered_and_drained_in_order() {
        let outbox = outbox(10).await;
        outbox
            .notify_participant(GuildId(1), ParticipantId(5), &notice(0))
            .await
            .unwrap();
        outbox
            .notify_channel(QueueIdentity::new(1u64, 2u64), &notice(1))
            .await
            .unwrap();

        let first = outbox.drain(Some(1)).await;
        assert_eq!(first.len(), 1);
        assert!(first[0].text.contains("position 1"));
        assert_eq!(
            first[0].recipient,
            OutboxRecipient::Participant {
                guild: GuildId(1),
                participant: ParticipantId(5)
            }
        );

        let rest = outbox.drain(None).await;
        assert_eq!(rest.len(), 1);
        assert!(outbox.is_empty().await);

        let json = serde_json::to_value(&rest[0]).unwrap();
        assert_eq!(json["recipient"]["type"], "channel");
        assert_eq!(json["notice"]["kind"], "returned_to_queue");
    }

    #[tokio::test]
    async fn test_full_outbox_drops_oldest() {
        let outbox = outbox(2).await;
        let channel = QueueIdentity::new(1u64, 2u64);
        for position in 0..3 {
            outbox.notify_channel(channel, &notice(position)).await.unwrap();
        }

        let entries = outbox.drain(None).await;
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].notice, notice(1));
        assert_eq!(entries[1].id, "id-3");
    }
}
