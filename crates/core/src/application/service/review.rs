// Review use cases: add/remove, take-next, put-back, assignment toggling

use super::{wrong_variant, QueueService};
use crate::application::admission::{admit_next, send_heads_up, Admission};
use crate::domain::{
    ActiveAssignment, AddOutcome, Assignment, AssignmentId, Notice, ParticipantId, PutBackOutcome,
    QueueBody, QueueIdentity, RemoveOutcome, ReviewerId, TakeNextOutcome, ToggleOutcome, VariantTag,
};
use crate::error::{AppError, Result};
use serde::Deserialize;
use tracing::{debug, info};

const REVIEW_QUEUE: &str = "a review queue";

/// Options for take-next on a multi-assignment queue; ignored otherwise
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct TakeNextOptions {
    /// Sub-queue to admit from; default is the lowest non-empty one
    #[serde(default)]
    pub assignment: Option<AssignmentId>,
    /// Evict the previous assignee from every sub-queue instead of only
    /// the one it was checked for
    #[serde(default)]
    pub drop_from_all: bool,
}

impl QueueService {
    /// Add a participant to the waiting line (a sub-queue for multi-assignment queues)
    pub async fn add_participant(
        &self,
        identity: QueueIdentity,
        participant: ParticipantId,
        assignment: Option<AssignmentId>,
    ) -> Result<AddOutcome> {
        let handle = self.registry.lookup(identity).await?;
        let mut record = handle.lock().await;

        let outcome = match &mut record.body {
            QueueBody::Review(queue) => queue.add(participant),
            QueueBody::MultiReview(queue) => {
                let assignment = assignment.ok_or_else(|| {
                    AppError::Validation(format!(
                        "queue {identity} reviews several assignments; name the assignment to queue for"
                    ))
                })?;
                queue.add(participant, assignment)
            }
            QueueBody::Question(_) => {
                return Err(wrong_variant(identity, VariantTag::Question, "add", REVIEW_QUEUE));
            }
        };

        debug!(
            guild = %identity.guild,
            channel = %identity.channel,
            participant = %participant,
            outcome = ?outcome,
            "Add participant"
        );
        Ok(outcome)
    }

    /// Remove a participant from the line, or from one/all sub-queues
    pub async fn remove_participant(
        &self,
        identity: QueueIdentity,
        participant: ParticipantId,
        assignment: Option<AssignmentId>,
    ) -> Result<RemoveOutcome> {
        let handle = self.registry.lookup(identity).await?;
        let mut record = handle.lock().await;

        match &mut record.body {
            QueueBody::Review(queue) => Ok(queue.remove(participant)),
            QueueBody::MultiReview(queue) => Ok(queue.remove(participant, assignment)),
            QueueBody::Question(_) => Err(wrong_variant(
                identity,
                VariantTag::Question,
                "remove",
                REVIEW_QUEUE,
            )),
        }
    }

    /// Admit the next ready participant to `reviewer`'s voice channel
    ///
    /// Preconditions are checked in order: the reviewer must be in voice
    /// (`NoDestination`), the chosen sub-queue must be open (`NotReviewing`),
    /// and someone must be waiting (`Empty`). None of these mutate the queue.
    pub async fn take_next(
        &self,
        identity: QueueIdentity,
        reviewer: ReviewerId,
        options: TakeNextOptions,
    ) -> Result<TakeNextOutcome> {
        let handle = self.registry.lookup(identity).await?;
        let mut record = handle.lock().await;
        let ctx = self.context(identity);

        if let QueueBody::Question(_) = &record.body {
            return Err(wrong_variant(identity, VariantTag::Question, "take next", REVIEW_QUEUE));
        }

        let Some(destination) = ctx.location_of(reviewer).await else {
            debug!(channel = %identity.channel, reviewer = %reviewer, "Reviewer has no voice channel");
            return Ok(TakeNextOutcome::NoDestination);
        };

        let (participant, skipped) = match &mut record.body {
            QueueBody::Review(queue) => {
                let (participant, prior_location, skipped) =
                    match admit_next(queue.waiting_mut(), &ctx).await {
                        Admission::Empty => return Ok(TakeNextOutcome::Empty),
                        Admission::NoneReady { .. } => return Ok(TakeNextOutcome::NoneReady),
                        Admission::Admitted {
                            participant,
                            prior_location,
                            skipped,
                        } => (participant, prior_location, skipped),
                    };

                queue.assign(
                    reviewer,
                    Assignment {
                        participant,
                        prior_location: Some(prior_location),
                    },
                );
                ctx.move_to(participant, destination).await;
                send_heads_up(queue.waiting(), &ctx).await;
                (participant, skipped)
            }

            QueueBody::MultiReview(queue) => {
                let lane_id = match options.assignment {
                    Some(assignment) if !queue.is_reviewing(assignment) => {
                        return Ok(TakeNextOutcome::NotReviewing { assignment });
                    }
                    Some(assignment) => assignment,
                    None => match queue.default_lane() {
                        Some(assignment) => assignment,
                        None => return Ok(TakeNextOutcome::Empty),
                    },
                };

                let Some(lane) = queue.lane_mut(lane_id) else {
                    return Ok(TakeNextOutcome::NotReviewing { assignment: lane_id });
                };
                let (participant, prior_location, skipped) = match admit_next(lane, &ctx).await {
                    Admission::Empty => return Ok(TakeNextOutcome::Empty),
                    Admission::NoneReady { .. } => return Ok(TakeNextOutcome::NoneReady),
                    Admission::Admitted {
                        participant,
                        prior_location,
                        skipped,
                    } => (participant, prior_location, skipped),
                };

                let all_assignment_ids = queue.assignments_of(participant);
                queue.mark_admitted(participant, lane_id);
                // evict only after a successful admission
                let evicted = queue.evict_previous(reviewer, options.drop_from_all);
                if !evicted.is_empty() {
                    debug!(reviewer = %reviewer, evicted_from = ?evicted, "Previous assignee evicted");
                }
                queue.assign(
                    reviewer,
                    ActiveAssignment {
                        participant,
                        assignment_checked: lane_id,
                        prior_location: Some(prior_location),
                        all_assignment_ids,
                    },
                );
                ctx.move_to(participant, destination).await;
                if let Some(lane) = queue.lane(lane_id) {
                    send_heads_up(lane, &ctx).await;
                }
                (participant, skipped)
            }

            QueueBody::Question(_) => {
                return Err(wrong_variant(identity, VariantTag::Question, "take next", REVIEW_QUEUE));
            }
        };

        info!(
            guild = %identity.guild,
            channel = %identity.channel,
            reviewer = %reviewer,
            participant = %participant,
            skipped,
            "Participant admitted"
        );
        Ok(TakeNextOutcome::Admitted { participant })
    }

    /// Return the reviewer's current assignee to the line
    ///
    /// # Arguments
    /// * `position` - 0-based insert position, clamped to the line length;
    ///   defaults to [`crate::domain::DEFAULT_PUT_BACK_POSITION`]
    pub async fn put_back(
        &self,
        identity: QueueIdentity,
        reviewer: ReviewerId,
        position: Option<usize>,
    ) -> Result<PutBackOutcome> {
        let handle = self.registry.lookup(identity).await?;
        let mut record = handle.lock().await;
        let ctx = self.context(identity);

        let (participant, prior_location, position) = match &mut record.body {
            QueueBody::Review(queue) => {
                let Some(held) = queue.take_assignment(reviewer) else {
                    return Ok(PutBackOutcome::NoAssignment);
                };
                let position = queue.insert_at(held.participant, position);
                (held.participant, held.prior_location, position)
            }
            QueueBody::MultiReview(queue) => {
                let Some(held) = queue.assignment(reviewer).cloned() else {
                    return Ok(PutBackOutcome::NoAssignment);
                };
                let Some(position) = queue.insert_at(held.participant, held.assignment_checked, position)
                else {
                    return Ok(PutBackOutcome::NotReviewing {
                        assignment: held.assignment_checked,
                    });
                };
                queue.take_assignment(reviewer);
                (held.participant, held.prior_location, position)
            }
            QueueBody::Question(_) => {
                return Err(wrong_variant(identity, VariantTag::Question, "put back", REVIEW_QUEUE));
            }
        };

        // only participants still connected can be moved back
        if let Some(prior) = prior_location {
            if ctx.location_of(participant).await.is_some() {
                ctx.move_to(participant, prior).await;
            }
        }
        ctx.notify(
            participant,
            &Notice::ReturnedToQueue {
                channel: identity.channel,
                position,
            },
        )
        .await;

        info!(
            guild = %identity.guild,
            channel = %identity.channel,
            reviewer = %reviewer,
            participant = %participant,
            position,
            "Participant put back"
        );
        Ok(PutBackOutcome::Returned {
            participant,
            position,
        })
    }

    /// Open or close an assignment. On a multi-assignment queue closing
    /// evicts (and notifies) everyone waiting for it.
    pub async fn toggle_assignment(
        &self,
        identity: QueueIdentity,
        assignment: AssignmentId,
    ) -> Result<ToggleOutcome> {
        let handle = self.registry.lookup(identity).await?;
        let mut record = handle.lock().await;
        let ctx = self.context(identity);

        let outcome = match &mut record.body {
            QueueBody::Review(queue) => {
                if queue.toggle_assignment(assignment) {
                    ToggleOutcome::Opened { assignment }
                } else {
                    ToggleOutcome::Closed {
                        assignment,
                        evicted: Vec::new(),
                    }
                }
            }
            QueueBody::MultiReview(queue) => match queue.stop_reviewing(assignment) {
                Some(evicted) => {
                    for participant in &evicted {
                        ctx.notify(
                            *participant,
                            &Notice::AssignmentClosed {
                                channel: identity.channel,
                                assignment,
                            },
                        )
                        .await;
                    }
                    ToggleOutcome::Closed {
                        assignment,
                        evicted,
                    }
                }
                None => {
                    queue.start_reviewing(assignment);
                    ToggleOutcome::Opened { assignment }
                }
            },
            QueueBody::Question(_) => {
                return Err(wrong_variant(
                    identity,
                    VariantTag::Question,
                    "toggle assignment",
                    REVIEW_QUEUE,
                ));
            }
        };

        info!(
            guild = %identity.guild,
            channel = %identity.channel,
            assignment = %assignment,
            outcome = ?outcome,
            "Assignment toggled"
        );
        Ok(outcome)
    }
}
