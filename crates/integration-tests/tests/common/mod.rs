//! Shared wiring: the real file store and session adapters

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use eduqueue_core::application::{QueueRegistry, QueueService};
use eduqueue_core::domain::{GuildId, ParticipantId, QueueIdentity, VariantTag, VoiceLocation};
use eduqueue_core::port::{SystemTimeProvider, UuidProvider};
use eduqueue_infra_fs::JsonFileQueueStore;
use eduqueue_infra_session::{OutboxNotifier, PresenceTable, PresenceUpdate};

pub const GUILD: u64 = 4242;
pub const CHANNEL: u64 = 77;
pub const REVIEWER: ParticipantId = ParticipantId(9000);
pub const REVIEW_ROOM: VoiceLocation = VoiceLocation(555);

pub struct Stack {
    pub service: Arc<QueueService>,
    pub registry: Arc<QueueRegistry>,
    pub presence: Arc<PresenceTable>,
    pub outbox: Arc<OutboxNotifier>,
}

pub fn stack(data_dir: &Path) -> Stack {
    let ids = Arc::new(UuidProvider);
    let clock = Arc::new(SystemTimeProvider);
    let presence = Arc::new(PresenceTable::new(ids.clone(), clock.clone()));
    let outbox = Arc::new(OutboxNotifier::new(256, presence.clone(), ids, clock));
    let registry = Arc::new(QueueRegistry::new(Arc::new(JsonFileQueueStore::new(data_dir))));
    let service = Arc::new(QueueService::new(
        registry.clone(),
        presence.clone(),
        outbox.clone(),
    ));
    Stack {
        service,
        registry,
        presence,
        outbox,
    }
}

pub fn identity() -> QueueIdentity {
    QueueIdentity::new(GUILD, CHANNEL)
}

pub fn p(id: u64) -> ParticipantId {
    ParticipantId(id)
}

impl Stack {
    pub async fn create(&self, variant: VariantTag) {
        self.service
            .create_queue(identity(), variant, "CS 101", "office-hours")
            .await
            .unwrap();
    }

    /// Put participants in voice (`Some`) or mark them known but absent
    pub async fn presence(&self, members: &[(u64, Option<u64>)]) {
        self.presence
            .apply(members.iter().map(|(participant, location)| PresenceUpdate {
                guild: GuildId(GUILD),
                participant: ParticipantId(*participant),
                location: location.map(VoiceLocation),
                left: false,
            }))
            .await;
    }

    pub async fn reviewer_in_voice(&self) {
        self.presence(&[(REVIEWER.0, Some(REVIEW_ROOM.0))]).await;
    }
}
