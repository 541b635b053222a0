// Operation outcomes
//
// Structural results (empty queue, unknown question, ...) are ordinary
// values, not errors: every variant is something the caller reports back
// to the user.

use crate::domain::identity::{AssignmentId, ParticipantId, QuestionIndex, VoiceLocation};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AddOutcome {
    /// Already waiting; the 0-based position is unchanged
    AlreadyQueued { position: usize },
    Added { position: usize },
    /// Multi-assignment queue is not accepting this assignment
    NotReviewing { assignment: AssignmentId },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RemoveOutcome {
    NotFound,
    Removed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TakeNextOutcome {
    Admitted { participant: ParticipantId },
    Empty,
    NoneReady,
    /// The reviewer is not in a live session to receive the participant
    NoDestination,
    NotReviewing { assignment: AssignmentId },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PutBackOutcome {
    NoAssignment,
    Returned {
        participant: ParticipantId,
        position: usize,
    },
    /// The checked assignment was closed; the assignment is kept
    NotReviewing { assignment: AssignmentId },
}

/// A newly asked question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuestionAsked {
    pub index: QuestionIndex,
    /// 0-based position among open questions
    pub position: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FollowOutcome {
    NoSuchQuestion,
    AlreadyFollowing,
    Followed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AnswerOutcome {
    NoSuchQuestion,
    /// Voice answer requested but the answerer has no live session
    NoDestination,
    TextAnswered { followers: Vec<ParticipantId> },
    VoiceAnswered {
        location: VoiceLocation,
        followers: Vec<ParticipantId>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AmendOutcome {
    NoSuchAnsweredQuestion,
    Amended { followers: Vec<ParticipantId> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ToggleOutcome {
    Opened { assignment: AssignmentId },
    Closed {
        assignment: AssignmentId,
        evicted: Vec<ParticipantId>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ConvertOutcome {
    /// Already the requested variant
    Unchanged,
    Converted { migrated: usize },
}

/// Where a participant stands in a queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PositionReport {
    NotQueued,
    /// Review queue: 0-based index in the waiting line
    Queued { position: usize },
    /// Multi-assignment queue: one entry per sub-queue
    Lanes { lanes: Vec<LanePosition> },
    /// Question queue: every followed open question
    Questions { questions: Vec<QuestionPosition> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LanePosition {
    pub assignment: AssignmentId,
    pub position: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionPosition {
    pub index: QuestionIndex,
    pub position: usize,
    /// The participant asked it (follower 0)
    pub own: bool,
}
