// Take-next admission loop
//
// Shared by both review variants. Runs on one waiting line while the
// caller holds the queue's lock; the only suspension points are the
// readiness queries and the skip notices.

use crate::domain::admission::{heads_up_targets, reinsert_unready};
use crate::domain::{GuildId, Notice, ParticipantId, QueueIdentity, VoiceLocation};
use crate::port::{Notifier, VoiceCapability};
use std::collections::VecDeque;
use tracing::{debug, warn};

/// Ports and identity needed while admitting
pub(crate) struct AdmissionContext<'a> {
    pub identity: QueueIdentity,
    pub voice: &'a dyn VoiceCapability,
    pub notifier: &'a dyn Notifier,
}

impl AdmissionContext<'_> {
    fn guild(&self) -> GuildId {
        self.identity.guild
    }

    pub(crate) async fn location_of(&self, participant: ParticipantId) -> Option<VoiceLocation> {
        self.voice.location_of(self.guild(), participant).await
    }

    /// Best-effort direct notice
    pub(crate) async fn notify(&self, participant: ParticipantId, notice: &Notice) {
        if let Err(e) = self
            .notifier
            .notify_participant(self.guild(), participant, notice)
            .await
        {
            warn!(
                guild = %self.identity.guild,
                channel = %self.identity.channel,
                participant = %participant,
                error = %e,
                "Failed to notify participant"
            );
        }
    }

    /// Best-effort move; the queue state is already committed
    pub(crate) async fn move_to(&self, participant: ParticipantId, destination: VoiceLocation) {
        if let Err(e) = self
            .voice
            .move_participant(self.guild(), participant, destination)
            .await
        {
            warn!(
                guild = %self.identity.guild,
                channel = %self.identity.channel,
                participant = %participant,
                destination = %destination,
                error = %e,
                "Failed to move participant"
            );
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Admission {
    Empty,
    /// Nobody was ready; the line is back in its original order
    NoneReady { skipped: usize },
    Admitted {
        participant: ParticipantId,
        prior_location: VoiceLocation,
        skipped: usize,
    },
}

/// Pop until a ready participant is found. Skipped participants are told
/// so and re-inserted as one block (see [`reinsert_unready`]).
pub(crate) async fn admit_next(lane: &mut VecDeque<ParticipantId>, ctx: &AdmissionContext<'_>) -> Admission {
    if lane.is_empty() {
        return Admission::Empty;
    }

    let channel = ctx.identity.channel;
    let mut unready: Vec<ParticipantId> = Vec::new();

    while let Some(candidate) = lane.pop_front() {
        if let Some(location) = ctx.location_of(candidate).await {
            let skipped = unready.len();
            reinsert_unready(lane, unready);
            return Admission::Admitted {
                participant: candidate,
                prior_location: location,
                skipped,
            };
        }

        debug!(channel = %channel, participant = %candidate, "Skipping participant not in voice");
        ctx.notify(candidate, &Notice::SkippedNotReady { channel }).await;
        unready.push(candidate);
    }

    let skipped = unready.len();
    lane.extend(unready);
    Admission::NoneReady { skipped }
}

/// Heads-up notices for the new front of the line
pub(crate) async fn send_heads_up(lane: &VecDeque<ParticipantId>, ctx: &AdmissionContext<'_>) {
    let channel = ctx.identity.channel;
    for (place, participant) in heads_up_targets(lane) {
        let in_voice = ctx.location_of(participant).await.is_some();
        ctx.notify(
            participant,
            &Notice::HeadsUp {
                channel,
                place,
                in_voice,
            },
        )
        .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::notifier::mocks::RecordingNotifier;
    use crate::port::voice::mocks::MockVoice;

    fn p(id: u64) -> ParticipantId {
        ParticipantId(id)
    }

    fn ids(lane: &VecDeque<ParticipantId>) -> Vec<u64> {
        lane.iter().map(|x| x.0).collect()
    }

    #[tokio::test]
    async fn test_admits_first_ready_and_reinserts_skipped() {
        let voice = MockVoice::new();
        let notifier = RecordingNotifier::new();
        voice.join(p(3), VoiceLocation(77));
        let ctx = AdmissionContext {
            identity: QueueIdentity::new(1u64, 2u64),
            voice: &voice,
            notifier: &notifier,
        };

        let mut lane: VecDeque<ParticipantId> = [1, 2, 3, 4].into_iter().map(p).collect();
        let admission = admit_next(&mut lane, &ctx).await;

        assert_eq!(
            admission,
            Admission::Admitted {
                participant: p(3),
                prior_location: VoiceLocation(77),
                skipped: 2
            }
        );
        // one remaining, two skipped: short line, block goes to the tail
        assert_eq!(ids(&lane), vec![4, 1, 2]);
        assert_eq!(notifier.sent_to(p(1)), vec![Notice::SkippedNotReady { channel: 2u64.into() }]);
        assert!(notifier.sent_to(p(4)).is_empty());
    }

    #[tokio::test]
    async fn test_none_ready_restores_order() {
        let voice = MockVoice::new();
        let notifier = RecordingNotifier::new();
        let ctx = AdmissionContext {
            identity: QueueIdentity::new(1u64, 2u64),
            voice: &voice,
            notifier: &notifier,
        };

        let mut lane: VecDeque<ParticipantId> = [5, 6, 7].into_iter().map(p).collect();
        assert_eq!(admit_next(&mut lane, &ctx).await, Admission::NoneReady { skipped: 3 });
        assert_eq!(ids(&lane), vec![5, 6, 7]);
    }

    #[tokio::test]
    async fn test_empty_lane_sends_nothing() {
        let voice = MockVoice::new();
        let notifier = RecordingNotifier::new();
        let ctx = AdmissionContext {
            identity: QueueIdentity::new(1u64, 2u64),
            voice: &voice,
            notifier: &notifier,
        };

        let mut lane = VecDeque::new();
        assert_eq!(admit_next(&mut lane, &ctx).await, Admission::Empty);
        assert!(notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_participant_is_still_skipped() {
        let voice = MockVoice::new();
        let notifier = RecordingNotifier::new();
        notifier.make_unreachable(p(1));
        voice.join(p(2), VoiceLocation(1));
        let ctx = AdmissionContext {
            identity: QueueIdentity::new(1u64, 2u64),
            voice: &voice,
            notifier: &notifier,
        };

        let mut lane: VecDeque<ParticipantId> = [1, 2].into_iter().map(p).collect();
        let admission = admit_next(&mut lane, &ctx).await;
        assert!(matches!(admission, Admission::Admitted { participant, .. } if participant == p(2)));
        assert_eq!(ids(&lane), vec![1]);
    }

    #[tokio::test]
    async fn test_heads_up_flags_voice_presence() {
        let voice = MockVoice::new();
        let notifier = RecordingNotifier::new();
        voice.join(p(2), VoiceLocation(9));
        let ctx = AdmissionContext {
            identity: QueueIdentity::new(1u64, 2u64),
            voice: &voice,
            notifier: &notifier,
        };

        let lane: VecDeque<ParticipantId> = [1, 2].into_iter().map(p).collect();
        send_heads_up(&lane, &ctx).await;

        let to_first = notifier.sent_to(p(1));
        let to_second = notifier.sent_to(p(2));
        assert!(matches!(to_first[0], Notice::HeadsUp { in_voice: false, .. }));
        assert!(matches!(to_second[0], Notice::HeadsUp { in_voice: true, .. }));
    }
}
