// Notification port
// reason: async-trait 필요 (dyn 호환 async port)
use crate::domain::{GuildId, Notice, ParticipantId, QueueIdentity};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotifyError {
    #[error("Unknown recipient: {0}")]
    UnknownRecipient(String),

    #[error("Notifier unavailable: {0}")]
    Unavailable(String),
}

/// Delivery of notices to participants and channels
///
/// Callers treat every failure as best-effort: it is logged and the queue
/// operation still succeeds.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Direct message to one participant
    async fn notify_participant(
        &self,
        guild: GuildId,
        participant: ParticipantId,
        notice: &Notice,
    ) -> Result<(), NotifyError>;

    /// Message posted in the queue's own channel
    async fn notify_channel(&self, identity: QueueIdentity, notice: &Notice) -> Result<(), NotifyError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// Where a recorded notice was sent
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Recipient {
        Participant(ParticipantId),
        Channel(QueueIdentity),
    }

    /// Records every notice; selected participants can be made unreachable
    #[derive(Default)]
    pub struct RecordingNotifier {
        sent: Mutex<Vec<(Recipient, Notice)>>,
        unreachable: Mutex<HashSet<ParticipantId>>,
    }

    impl RecordingNotifier {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn make_unreachable(&self, participant: ParticipantId) {
            self.unreachable.lock().unwrap().insert(participant);
        }

        pub fn sent(&self) -> Vec<(Recipient, Notice)> {
            self.sent.lock().unwrap().clone()
        }

        pub fn sent_to(&self, participant: ParticipantId) -> Vec<Notice> {
            self.sent
                .lock()
                .unwrap()
                .iter()
                .filter(|(to, _)| *to == Recipient::Participant(participant))
                .map(|(_, notice)| notice.clone())
                .collect()
        }

        pub fn clear(&self) {
            self.sent.lock().unwrap().clear();
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify_participant(
            &self,
            _guild: GuildId,
            participant: ParticipantId,
            notice: &Notice,
        ) -> Result<(), NotifyError> {
            if self.unreachable.lock().unwrap().contains(&participant) {
                return Err(NotifyError::UnknownRecipient(participant.to_string()));
            }
            self.sent
                .lock()
                .unwrap()
                .push((Recipient::Participant(participant), notice.clone()));
            Ok(())
        }

        async fn notify_channel(&self, identity: QueueIdentity, notice: &Notice) -> Result<(), NotifyError> {
            self.sent
                .lock()
                .unwrap()
                .push((Recipient::Channel(identity), notice.clone()));
            Ok(())
        }
    }
}
