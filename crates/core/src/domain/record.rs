// Queue Record - one per (guild, channel), closed set of variants

use crate::domain::error::{DomainError, Result};
use crate::domain::identity::{AssignmentId, ParticipantId, QueueIdentity, VariantTag};
use crate::domain::multi_review::{ActiveAssignment, MultiAssignmentReviewQueue};
use crate::domain::outcome::{ConvertOutcome, PositionReport};
use crate::domain::question::QuestionQueue;
use crate::domain::review::{Assignment, SimpleReviewQueue};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Identity plus denormalized names (display and logging only)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueHeader {
    pub identity: QueueIdentity,
    pub guild_name: String,
    pub channel_name: String,
}

impl QueueHeader {
    pub fn new(
        identity: QueueIdentity,
        guild_name: impl Into<String>,
        channel_name: impl Into<String>,
    ) -> Self {
        Self {
            identity,
            guild_name: guild_name.into(),
            channel_name: channel_name.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum QueueBody {
    Review(SimpleReviewQueue),
    MultiReview(MultiAssignmentReviewQueue),
    Question(QuestionQueue),
}

impl QueueBody {
    /// Factory table: variant tag -> empty queue
    pub fn empty(tag: VariantTag) -> Self {
        match tag {
            VariantTag::Review => QueueBody::Review(SimpleReviewQueue::new()),
            VariantTag::MultiReview => QueueBody::MultiReview(MultiAssignmentReviewQueue::new()),
            VariantTag::Question => QueueBody::Question(QuestionQueue::new()),
        }
    }

    pub fn variant_tag(&self) -> VariantTag {
        match self {
            QueueBody::Review(_) => VariantTag::Review,
            QueueBody::MultiReview(_) => VariantTag::MultiReview,
            QueueBody::Question(_) => VariantTag::Question,
        }
    }
}

/// Queue size as reported to users
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueSize {
    pub variant: VariantTag,
    /// Distinct waiting participants, or open questions
    pub total: usize,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub lanes: BTreeMap<AssignmentId, usize>,
}

#[derive(Debug, Clone)]
pub struct QueueRecord {
    pub header: QueueHeader,
    pub body: QueueBody,
}

impl QueueRecord {
    pub fn empty(header: QueueHeader, tag: VariantTag) -> Self {
        Self {
            header,
            body: QueueBody::empty(tag),
        }
    }

    pub fn identity(&self) -> QueueIdentity {
        self.header.identity
    }

    pub fn variant_tag(&self) -> VariantTag {
        self.body.variant_tag()
    }

    pub fn size(&self) -> QueueSize {
        let (total, lanes) = match &self.body {
            QueueBody::Review(q) => (q.len(), BTreeMap::new()),
            QueueBody::MultiReview(q) => (q.waiting_count(), q.lane_sizes()),
            QueueBody::Question(q) => (q.len(), BTreeMap::new()),
        };
        QueueSize {
            variant: self.variant_tag(),
            total,
            lanes,
        }
    }

    pub fn where_is(&self, participant: ParticipantId) -> PositionReport {
        match &self.body {
            QueueBody::Review(q) => q.where_is(participant),
            QueueBody::MultiReview(q) => q.where_is(participant),
            QueueBody::Question(q) => q.where_is(participant),
        }
    }

    /// Replace the body with a fresh queue of `target` in place, migrating
    /// live state between the two review variants. Anything involving
    /// questions starts empty. On error the record is untouched.
    pub fn convert(
        &mut self,
        target: VariantTag,
        seed: Option<AssignmentId>,
    ) -> Result<ConvertOutcome> {
        if self.variant_tag() == target {
            return Ok(ConvertOutcome::Unchanged);
        }

        let seed = match &self.body {
            QueueBody::Review(review) if target == VariantTag::MultiReview => {
                let seed = seed.or_else(|| review.open_assignments().iter().next().copied());
                let has_state = !review.is_empty() || review.assignments().next().is_some();
                if seed.is_none() && has_state {
                    return Err(DomainError::ValidationError(
                        "a seed assignment is required to move waiting participants into a sub-queue"
                            .to_string(),
                    ));
                }
                seed
            }
            _ => seed,
        };

        let previous = std::mem::replace(&mut self.body, QueueBody::empty(target));
        let migrated = match (previous, seed) {
            (QueueBody::Review(review), Some(seed)) if target == VariantTag::MultiReview => {
                let (queue, migrated) = review_to_multi(review, seed);
                self.body = QueueBody::MultiReview(queue);
                migrated
            }
            (QueueBody::MultiReview(multi), seed) if target == VariantTag::Review => {
                let queue = multi_to_review(multi, seed);
                let migrated = queue.len();
                self.body = QueueBody::Review(queue);
                migrated
            }
            _ => 0,
        };

        Ok(ConvertOutcome::Converted { migrated })
    }
}

fn review_to_multi(
    review: SimpleReviewQueue,
    seed: AssignmentId,
) -> (MultiAssignmentReviewQueue, usize) {
    let (waiting, assigned, open) = review.into_parts();

    let migrated = waiting.len();
    let mut lanes = open;
    lanes.insert(seed);
    let queue = MultiAssignmentReviewQueue::from_lanes(lanes, [(seed, Vec::from(waiting))]);

    let assigned: HashMap<_, _> = assigned
        .into_iter()
        .map(|(reviewer, held)| {
            (
                reviewer,
                ActiveAssignment {
                    participant: held.participant,
                    assignment_checked: seed,
                    prior_location: held.prior_location,
                    all_assignment_ids: BTreeSet::from([seed]),
                },
            )
        })
        .collect();

    (queue.with_assignments(assigned), migrated)
}

fn multi_to_review(
    multi: MultiAssignmentReviewQueue,
    seed: Option<AssignmentId>,
) -> SimpleReviewQueue {
    let (mut lanes, assigned) = multi.into_parts();
    let open: BTreeSet<AssignmentId> = lanes.keys().copied().collect();

    // seed lane first, then the rest in assignment order
    let mut waiting: Vec<ParticipantId> = Vec::new();
    if let Some(first) = seed.and_then(|seed| lanes.remove(&seed)) {
        waiting.extend(first);
    }
    for (_, lane) in lanes {
        waiting.extend(lane);
    }

    let assigned: HashMap<_, _> = assigned
        .into_iter()
        .map(|(reviewer, held)| {
            (
                reviewer,
                Assignment {
                    participant: held.participant,
                    prior_location: held.prior_location,
                },
            )
        })
        .collect();

    SimpleReviewQueue::from_parts(waiting, assigned, open)
}
