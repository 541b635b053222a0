// Live-session (voice) capability port
// reason: async-trait 필요 (dyn 호환 async port)
use crate::domain::{GuildId, ParticipantId, VoiceLocation};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VoiceError {
    #[error("Participant {0} is not in a voice channel")]
    NotConnected(ParticipantId),

    #[error("Voice backend unavailable: {0}")]
    Unavailable(String),
}

/// Presence and movement of participants between voice channels
///
/// Readiness for admission is `location_of(..).is_some()`.
#[async_trait]
pub trait VoiceCapability: Send + Sync {
    /// Current voice channel of a participant, if any
    async fn location_of(&self, guild: GuildId, participant: ParticipantId) -> Option<VoiceLocation>;

    /// Move a connected participant to `destination`
    ///
    /// # Arguments
    /// * `guild` - Guild the participant belongs to
    /// * `participant` - Who to move
    /// * `destination` - Target voice channel
    async fn move_participant(
        &self,
        guild: GuildId,
        participant: ParticipantId,
        destination: VoiceLocation,
    ) -> Result<(), VoiceError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory voice presence; every move is recorded
    #[derive(Default)]
    pub struct MockVoice {
        locations: Mutex<HashMap<ParticipantId, VoiceLocation>>,
        moves: Mutex<Vec<(ParticipantId, VoiceLocation)>>,
        fail_moves: Mutex<bool>,
    }

    impl MockVoice {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn join(&self, participant: ParticipantId, location: VoiceLocation) {
            self.locations.lock().unwrap().insert(participant, location);
        }

        pub fn leave(&self, participant: ParticipantId) {
            self.locations.lock().unwrap().remove(&participant);
        }

        pub fn set_fail_moves(&self, fail: bool) {
            *self.fail_moves.lock().unwrap() = fail;
        }

        pub fn moves(&self) -> Vec<(ParticipantId, VoiceLocation)> {
            self.moves.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl VoiceCapability for MockVoice {
        async fn location_of(&self, _guild: GuildId, participant: ParticipantId) -> Option<VoiceLocation> {
            self.locations.lock().unwrap().get(&participant).copied()
        }

        async fn move_participant(
            &self,
            _guild: GuildId,
            participant: ParticipantId,
            destination: VoiceLocation,
        ) -> Result<(), VoiceError> {
            if *self.fail_moves.lock().unwrap() {
                return Err(VoiceError::Unavailable("mock failure".to_string()));
            }
            let mut locations = self.locations.lock().unwrap();
            if !locations.contains_key(&participant) {
                return Err(VoiceError::NotConnected(participant));
            }
            locations.insert(participant, destination);
            self.moves.lock().unwrap().push((participant, destination));
            Ok(())
        }
    }
}
