//! RPC Request/Response Types
//!
//! Every queue-scoped request carries the queue identity inline as
//! `guild` and `channel`. Results are the core outcome types serialized
//! as-is.

use eduqueue_core::application::TakeNextOptions;
use eduqueue_core::domain::{AssignmentId, ParticipantId, QuestionIndex, QueueIdentity};
use eduqueue_infra_session::{MoveRequest, OutboxEntry, PresenceUpdate};
use serde::{Deserialize, Serialize};

/// queue.size.v1, admin.save.v1, admin.load.v1
#[derive(Debug, Deserialize)]
pub struct QueueRef {
    #[serde(flatten)]
    pub queue: QueueIdentity,
}

/// queue.create.v1
#[derive(Debug, Deserialize)]
pub struct CreateQueueRequest {
    #[serde(flatten)]
    pub queue: QueueIdentity,
    /// `review`, `multireview` or `question` (case-insensitive)
    pub variant: String,
    #[serde(default)]
    pub guild_name: String,
    #[serde(default)]
    pub channel_name: String,
}

/// queue.convert.v1
#[derive(Debug, Deserialize)]
pub struct ConvertQueueRequest {
    #[serde(flatten)]
    pub queue: QueueIdentity,
    pub variant: String,
    #[serde(default)]
    pub seed: Option<AssignmentId>,
}

/// queue.position.v1, question.followable.v1
#[derive(Debug, Deserialize)]
pub struct ParticipantRequest {
    #[serde(flatten)]
    pub queue: QueueIdentity,
    pub participant: ParticipantId,
}

/// review.add.v1, review.remove.v1
#[derive(Debug, Deserialize)]
pub struct MembershipRequest {
    #[serde(flatten)]
    pub queue: QueueIdentity,
    pub participant: ParticipantId,
    #[serde(default)]
    pub assignment: Option<AssignmentId>,
}

/// review.take_next.v1
#[derive(Debug, Deserialize)]
pub struct TakeNextRequest {
    #[serde(flatten)]
    pub queue: QueueIdentity,
    pub reviewer: ParticipantId,
    #[serde(flatten)]
    pub options: TakeNextOptions,
}

/// review.put_back.v1
#[derive(Debug, Deserialize)]
pub struct PutBackRequest {
    #[serde(flatten)]
    pub queue: QueueIdentity,
    pub reviewer: ParticipantId,
    /// 0-based; defaults to 10
    #[serde(default)]
    pub position: Option<usize>,
}

/// review.toggle_assignment.v1
#[derive(Debug, Deserialize)]
pub struct ToggleAssignmentRequest {
    #[serde(flatten)]
    pub queue: QueueIdentity,
    pub assignment: AssignmentId,
}

/// question.ask.v1
#[derive(Debug, Deserialize)]
pub struct AskQuestionRequest {
    #[serde(flatten)]
    pub queue: QueueIdentity,
    pub participant: ParticipantId,
    pub text: String,
}

/// question.follow.v1
#[derive(Debug, Deserialize)]
pub struct FollowQuestionRequest {
    #[serde(flatten)]
    pub queue: QueueIdentity,
    pub participant: ParticipantId,
    pub index: QuestionIndex,
}

/// question.answer.v1 - omit `text` to answer live in voice
#[derive(Debug, Deserialize)]
pub struct AnswerQuestionRequest {
    #[serde(flatten)]
    pub queue: QueueIdentity,
    pub index: QuestionIndex,
    pub answerer: ParticipantId,
    #[serde(default)]
    pub text: Option<String>,
}

/// question.amend.v1
#[derive(Debug, Deserialize)]
pub struct AmendAnswerRequest {
    #[serde(flatten)]
    pub queue: QueueIdentity,
    pub index: QuestionIndex,
    pub author: ParticipantId,
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SaveQueueResponse {
    pub queue: QueueIdentity,
    pub saved: bool,
}

/// presence.update.v1
#[derive(Debug, Deserialize)]
pub struct PresenceUpdateRequest {
    pub updates: Vec<PresenceUpdate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PresenceUpdateResponse {
    pub applied: usize,
    pub connected: usize,
}

/// notices.drain.v1
#[derive(Debug, Default, Deserialize)]
pub struct DrainNoticesRequest {
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DrainNoticesResponse {
    pub notices: Vec<OutboxEntry>,
    pub moves: Vec<MoveRequest>,
}

/// admin.stats.v1
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub queues: usize,
    pub waiting: usize,
    pub connected: usize,
    pub pending_notices: usize,
    pub uptime_seconds: u64,
}
