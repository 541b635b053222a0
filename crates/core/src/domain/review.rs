// Simple Review Queue Domain Model

use crate::domain::admission::clamp_position;
use crate::domain::identity::{AssignmentId, ParticipantId, ReviewerId, VoiceLocation};
use crate::domain::outcome::{AddOutcome, PositionReport, RemoveOutcome};
use std::collections::{BTreeSet, HashMap, VecDeque};
use tracing::debug;

/// A participant currently held by a reviewer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub participant: ParticipantId,
    /// Where the participant was before being moved to the reviewer
    pub prior_location: Option<VoiceLocation>,
}

/// FIFO of participants waiting for any reviewer.
///
/// Invariants:
/// - a participant id appears at most once in `waiting`
/// - a participant is assigned to at most one reviewer
#[derive(Debug, Clone, Default)]
pub struct SimpleReviewQueue {
    waiting: VecDeque<ParticipantId>,
    assigned: HashMap<ReviewerId, Assignment>,
    open_assignments: BTreeSet<AssignmentId>,
}

impl SimpleReviewQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a persisted waiting list; later duplicates are dropped
    pub fn from_waiting(ids: impl IntoIterator<Item = ParticipantId>) -> Self {
        let mut queue = Self::new();
        for id in ids {
            queue.add(id);
        }
        queue
    }

    pub fn len(&self) -> usize {
        self.waiting.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waiting.is_empty()
    }

    pub fn waiting(&self) -> &VecDeque<ParticipantId> {
        &self.waiting
    }

    /// Mutable access for the admission loop, which only pops and re-inserts
    pub(crate) fn waiting_mut(&mut self) -> &mut VecDeque<ParticipantId> {
        &mut self.waiting
    }

    pub fn position(&self, participant: ParticipantId) -> Option<usize> {
        self.waiting.iter().position(|p| *p == participant)
    }

    pub fn add(&mut self, participant: ParticipantId) -> AddOutcome {
        if let Some(position) = self.position(participant) {
            return AddOutcome::AlreadyQueued { position };
        }
        self.waiting.push_back(participant);
        AddOutcome::Added {
            position: self.waiting.len() - 1,
        }
    }

    pub fn remove(&mut self, participant: ParticipantId) -> RemoveOutcome {
        match self.position(participant) {
            Some(position) => {
                self.waiting.remove(position);
                RemoveOutcome::Removed
            }
            None => RemoveOutcome::NotFound,
        }
    }

    pub fn where_is(&self, participant: ParticipantId) -> PositionReport {
        match self.position(participant) {
            Some(position) => PositionReport::Queued { position },
            None => PositionReport::NotQueued,
        }
    }

    /// Insert at a clamped position, moving the participant if already waiting.
    /// Returns the final 0-based position.
    pub fn insert_at(&mut self, participant: ParticipantId, requested: Option<usize>) -> usize {
        self.remove(participant);
        let position = clamp_position(requested, self.waiting.len());
        self.waiting.insert(position, participant);
        position
    }

    pub fn assignment(&self, reviewer: ReviewerId) -> Option<&Assignment> {
        self.assigned.get(&reviewer)
    }

    pub fn assignments(&self) -> impl Iterator<Item = (&ReviewerId, &Assignment)> {
        self.assigned.iter()
    }

    /// Record a reviewer's assignment.
    ///
    /// A previous assignment of the same reviewer is overwritten without
    /// re-queueing; another reviewer holding the same participant loses it.
    pub fn assign(&mut self, reviewer: ReviewerId, assignment: Assignment) -> Option<Assignment> {
        let participant = assignment.participant;
        self.assigned.retain(|other, held| {
            let stale = *other != reviewer && held.participant == participant;
            if stale {
                debug!(reviewer = %other, participant = %participant, "Assignment taken over by another reviewer");
            }
            !stale
        });
        self.assigned.insert(reviewer, assignment)
    }

    pub fn take_assignment(&mut self, reviewer: ReviewerId) -> Option<Assignment> {
        self.assigned.remove(&reviewer)
    }

    pub fn open_assignments(&self) -> &BTreeSet<AssignmentId> {
        &self.open_assignments
    }

    /// Flip the display-only "accepting assignment" flag; true when now open
    pub fn toggle_assignment(&mut self, assignment: AssignmentId) -> bool {
        if self.open_assignments.remove(&assignment) {
            false
        } else {
            self.open_assignments.insert(assignment);
            true
        }
    }

    pub(crate) fn into_parts(
        self,
    ) -> (
        VecDeque<ParticipantId>,
        HashMap<ReviewerId, Assignment>,
        BTreeSet<AssignmentId>,
    ) {
        (self.waiting, self.assigned, self.open_assignments)
    }

    pub(crate) fn from_parts(
        waiting: impl IntoIterator<Item = ParticipantId>,
        assigned: HashMap<ReviewerId, Assignment>,
        open_assignments: BTreeSet<AssignmentId>,
    ) -> Self {
        let mut queue = Self::from_waiting(waiting);
        queue.assigned = assigned;
        queue.open_assignments = open_assignments;
        queue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(id: u64) -> ParticipantId {
        ParticipantId(id)
    }

    #[test]
    fn test_add_reports_zero_based_positions() {
        let mut q = SimpleReviewQueue::new();
        assert_eq!(q.add(p(1)), AddOutcome::Added { position: 0 });
        assert_eq!(q.add(p(2)), AddOutcome::Added { position: 1 });
        assert_eq!(q.where_is(p(2)), PositionReport::Queued { position: 1 });
    }

    #[test]
    fn test_add_is_idempotent() {
        let mut q = SimpleReviewQueue::new();
        q.add(p(1));
        q.add(p(2));
        assert_eq!(q.add(p(1)), AddOutcome::AlreadyQueued { position: 0 });
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn test_from_waiting_drops_duplicates() {
        let q = SimpleReviewQueue::from_waiting([p(3), p(1), p(3), p(2)]);
        assert_eq!(q.waiting().iter().map(|x| x.0).collect::<Vec<_>>(), vec![3, 1, 2]);
    }

    #[test]
    fn test_remove() {
        let mut q = SimpleReviewQueue::from_waiting([p(1), p(2)]);
        assert_eq!(q.remove(p(1)), RemoveOutcome::Removed);
        assert_eq!(q.remove(p(1)), RemoveOutcome::NotFound);
        assert_eq!(q.where_is(p(2)), PositionReport::Queued { position: 0 });
        assert_eq!(q.where_is(p(1)), PositionReport::NotQueued);
    }

    #[test]
    fn test_insert_at_clamps_and_never_duplicates() {
        let mut q = SimpleReviewQueue::from_waiting([p(1), p(2), p(3)]);
        assert_eq!(q.insert_at(p(9), Some(50)), 3);
        assert_eq!(q.insert_at(p(2), Some(0)), 0);
        assert_eq!(
            q.waiting().iter().map(|x| x.0).collect::<Vec<_>>(),
            vec![2, 1, 3, 9]
        );
    }

    #[test]
    fn test_assign_transfers_ownership() {
        let mut q = SimpleReviewQueue::new();
        let a = Assignment {
            participant: p(7),
            prior_location: None,
        };
        q.assign(p(100), a.clone());
        q.assign(p(200), a);
        assert!(q.assignment(p(100)).is_none());
        assert_eq!(q.assignment(p(200)).unwrap().participant, p(7));
    }

    #[test]
    fn test_assign_overwrites_previous_silently() {
        let mut q = SimpleReviewQueue::new();
        q.assign(
            p(100),
            Assignment {
                participant: p(1),
                prior_location: None,
            },
        );
        let previous = q.assign(
            p(100),
            Assignment {
                participant: p(2),
                prior_location: None,
            },
        );
        assert_eq!(previous.unwrap().participant, p(1));
        assert!(q.is_empty());
    }

    #[test]
    fn test_toggle_assignment() {
        let mut q = SimpleReviewQueue::new();
        assert!(q.toggle_assignment(AssignmentId(3)));
        assert!(q.open_assignments().contains(&AssignmentId(3)));
        assert!(!q.toggle_assignment(AssignmentId(3)));
        assert!(q.open_assignments().is_empty());
    }
}
