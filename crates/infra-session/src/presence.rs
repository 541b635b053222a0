// Presence Table - in-memory voice membership fed by the chat bridge

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use eduqueue_core::domain::{GuildId, ParticipantId, VoiceLocation};
use eduqueue_core::port::{IdProvider, TimeProvider, VoiceCapability, VoiceError};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Pending moves kept before the oldest is dropped
pub const DEFAULT_MOVE_CAPACITY: usize = 1024;

/// One membership report from the bridge; `location: None` means the
/// member is known but not in voice, `left` drops the member entirely
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceUpdate {
    pub guild: GuildId,
    pub participant: ParticipantId,
    #[serde(default)]
    pub location: Option<VoiceLocation>,
    #[serde(default)]
    pub left: bool,
}

/// A move the bridge must carry out on the chat platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveRequest {
    pub id: String,
    pub guild: GuildId,
    pub participant: ParticipantId,
    pub destination: VoiceLocation,
    pub requested_at: DateTime<Utc>,
}

pub struct PresenceTable {
    roster: Mutex<HashMap<(GuildId, ParticipantId), Option<VoiceLocation>>>,
    moves: Mutex<VecDeque<MoveRequest>>,
    move_capacity: usize,
    id_provider: Arc<dyn IdProvider>,
    time_provider: Arc<dyn TimeProvider>,
}

impl PresenceTable {
    pub fn new(id_provider: Arc<dyn IdProvider>, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            roster: Mutex::new(HashMap::new()),
            moves: Mutex::new(VecDeque::new()),
            move_capacity: DEFAULT_MOVE_CAPACITY,
            id_provider,
            time_provider,
        }
    }

    /// Bound the pending-move queue; when full, the oldest move is dropped
    pub fn with_move_capacity(mut self, capacity: usize) -> Self {
        self.move_capacity = capacity.max(1);
        self
    }

    /// Apply a batch of reports; returns how many were applied
    pub async fn apply(&self, updates: impl IntoIterator<Item = PresenceUpdate>) -> usize {
        let mut roster = self.roster.lock().await;
        let mut applied = 0;
        for update in updates {
            let key = (update.guild, update.participant);
            if update.left {
                roster.remove(&key);
            } else {
                roster.insert(key, update.location);
            }
            applied += 1;
        }
        debug!(applied, members = roster.len(), "Presence updated");
        applied
    }

    pub async fn is_known(&self, guild: GuildId, participant: ParticipantId) -> bool {
        self.roster.lock().await.contains_key(&(guild, participant))
    }

    /// Members currently in any voice channel
    pub async fn connected_count(&self) -> usize {
        self.roster
            .lock()
            .await
            .values()
            .filter(|location| location.is_some())
            .count()
    }

    /// Hand pending moves to the bridge, oldest first
    pub async fn drain_moves(&self) -> Vec<MoveRequest> {
        self.moves.lock().await.drain(..).collect()
    }
}

#[async_trait]
impl VoiceCapability for PresenceTable {
    async fn location_of(&self, guild: GuildId, participant: ParticipantId) -> Option<VoiceLocation> {
        self.roster
            .lock()
            .await
            .get(&(guild, participant))
            .copied()
            .flatten()
    }

    async fn move_participant(
        &self,
        guild: GuildId,
        participant: ParticipantId,
        destination: VoiceLocation,
    ) -> Result<(), VoiceError> {
        {
            let mut roster = self.roster.lock().await;
            match roster.get_mut(&(guild, participant)) {
                Some(location) if location.is_some() => *location = Some(destination),
                _ => return Err(VoiceError::NotConnected(participant)),
            }
        }

        let request = MoveRequest {
            id: self.id_provider.generate_id(),
            guild,
            participant,
            destination,
            requested_at: crate::timestamp(self.time_provider.now_millis()),
        };
        debug!(participant = %participant, destination = %destination, "Move requested");
        let mut moves = self.moves.lock().await;
        if moves.len() >= self.move_capacity {
            if let Some(dropped) = moves.pop_front() {
                warn!(id = %dropped.id, capacity = self.move_capacity, "Move queue full, dropping oldest move");
            }
        }
        moves.push_back(request);
        Ok(())
    }
}
