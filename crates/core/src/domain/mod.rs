// Domain Layer - Pure queue state and rules, no I/O

pub mod admission;
pub mod error;
pub mod identity;
pub mod multi_review;
pub mod notice;
pub mod outcome;
pub mod question;
pub mod record;
pub mod review;
pub mod snapshot;

// Re-exports
pub use admission::{HeadsUp, DEFAULT_PUT_BACK_POSITION, REINSERT_CAP};
pub use error::DomainError;
pub use identity::{
    AssignmentId, ChannelId, GuildId, ParticipantId, QuestionIndex, QueueIdentity, ReviewerId,
    VariantTag, VoiceLocation,
};
pub use multi_review::{ActiveAssignment, MultiAssignmentReviewQueue};
pub use notice::Notice;
pub use outcome::{
    AddOutcome, AmendOutcome, AnswerOutcome, ConvertOutcome, FollowOutcome, LanePosition,
    PositionReport, PutBackOutcome, QuestionAsked, QuestionPosition, RemoveOutcome, TakeNextOutcome,
    ToggleOutcome,
};
pub use question::{Amendment, Answer, AnsweredQuestion, FollowableQuestion, Question, QuestionQueue};
pub use record::{QueueBody, QueueHeader, QueueRecord, QueueSize};
pub use review::{Assignment, SimpleReviewQueue};
pub use snapshot::QueueSnapshot;
