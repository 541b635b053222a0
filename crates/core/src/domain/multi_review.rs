// Multi-Assignment Review Queue Domain Model
//
// One FIFO per open assignment. `participant_index` mirrors `sub_queues`
// and is only touched through the methods below.

use crate::domain::admission::clamp_position;
use crate::domain::identity::{AssignmentId, ParticipantId, ReviewerId, VoiceLocation};
use crate::domain::outcome::{AddOutcome, LanePosition, PositionReport, RemoveOutcome};
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use tracing::{debug, error};

/// A participant held by a reviewer, with the sub-queue it was checked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveAssignment {
    pub participant: ParticipantId,
    pub assignment_checked: AssignmentId,
    pub prior_location: Option<VoiceLocation>,
    /// Every sub-queue the participant was waiting in when admitted
    pub all_assignment_ids: BTreeSet<AssignmentId>,
}

#[derive(Debug, Clone, Default)]
pub struct MultiAssignmentReviewQueue {
    sub_queues: BTreeMap<AssignmentId, VecDeque<ParticipantId>>,
    participant_index: HashMap<ParticipantId, BTreeSet<AssignmentId>>,
    assigned: HashMap<ReviewerId, ActiveAssignment>,
}

impl MultiAssignmentReviewQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from persisted sub-queues; the index is derived, never loaded
    pub fn from_lanes(
        open: impl IntoIterator<Item = AssignmentId>,
        lanes: impl IntoIterator<Item = (AssignmentId, Vec<ParticipantId>)>,
    ) -> Self {
        let mut queue = Self::new();
        for assignment in open {
            queue.start_reviewing(assignment);
        }
        for (assignment, participants) in lanes {
            // lanes for closed assignments are dropped, not reopened
            if !queue.is_reviewing(assignment) {
                debug!(assignment = %assignment, "Ignoring sub-queue of a closed assignment");
                continue;
            }
            for participant in participants {
                queue.add(participant, assignment);
            }
        }
        queue
    }

    // ---- assignments being reviewed ----

    pub fn is_reviewing(&self, assignment: AssignmentId) -> bool {
        self.sub_queues.contains_key(&assignment)
    }

    pub fn open_assignments(&self) -> impl Iterator<Item = AssignmentId> + '_ {
        self.sub_queues.keys().copied()
    }

    /// Open a sub-queue; false if it was already open
    pub fn start_reviewing(&mut self, assignment: AssignmentId) -> bool {
        if self.is_reviewing(assignment) {
            return false;
        }
        self.sub_queues.insert(assignment, VecDeque::new());
        true
    }

    /// Close a sub-queue, returning the evicted participants in queue order
    pub fn stop_reviewing(&mut self, assignment: AssignmentId) -> Option<Vec<ParticipantId>> {
        let evicted: Vec<ParticipantId> = self.sub_queues.remove(&assignment)?.into_iter().collect();
        for participant in &evicted {
            self.unindex(*participant, assignment);
        }
        self.verify_index();
        Some(evicted)
    }

    // ---- waiting lines ----

    pub fn lane(&self, assignment: AssignmentId) -> Option<&VecDeque<ParticipantId>> {
        self.sub_queues.get(&assignment)
    }

    /// Mutable lane access for the admission loop. Callers must finish with
    /// [`MultiAssignmentReviewQueue::mark_admitted`] for whoever they popped.
    pub(crate) fn lane_mut(&mut self, assignment: AssignmentId) -> Option<&mut VecDeque<ParticipantId>> {
        self.sub_queues.get_mut(&assignment)
    }

    /// Lowest open assignment with someone waiting
    pub fn default_lane(&self) -> Option<AssignmentId> {
        self.sub_queues
            .iter()
            .find(|(_, lane)| !lane.is_empty())
            .map(|(assignment, _)| *assignment)
    }

    pub fn lane_sizes(&self) -> BTreeMap<AssignmentId, usize> {
        self.sub_queues
            .iter()
            .map(|(assignment, lane)| (*assignment, lane.len()))
            .collect()
    }

    /// Distinct participants waiting in any sub-queue
    pub fn waiting_count(&self) -> usize {
        self.participant_index.len()
    }

    pub fn assignments_of(&self, participant: ParticipantId) -> BTreeSet<AssignmentId> {
        self.participant_index
            .get(&participant)
            .cloned()
            .unwrap_or_default()
    }

    pub fn add(&mut self, participant: ParticipantId, assignment: AssignmentId) -> AddOutcome {
        let Some(lane) = self.sub_queues.get_mut(&assignment) else {
            return AddOutcome::NotReviewing { assignment };
        };
        if let Some(position) = lane.iter().position(|p| *p == participant) {
            return AddOutcome::AlreadyQueued { position };
        }
        lane.push_back(participant);
        let position = lane.len() - 1;
        self.index(participant, assignment);
        AddOutcome::Added { position }
    }

    /// Remove from one sub-queue, or from all of them when `assignment` is None
    pub fn remove(&mut self, participant: ParticipantId, assignment: Option<AssignmentId>) -> RemoveOutcome {
        let removed = match assignment {
            Some(assignment) => self.remove_from(participant, assignment),
            None => !self.remove_everywhere(participant).is_empty(),
        };
        if removed {
            RemoveOutcome::Removed
        } else {
            RemoveOutcome::NotFound
        }
    }

    pub fn remove_from(&mut self, participant: ParticipantId, assignment: AssignmentId) -> bool {
        let Some(lane) = self.sub_queues.get_mut(&assignment) else {
            return false;
        };
        let Some(position) = lane.iter().position(|p| *p == participant) else {
            return false;
        };
        lane.remove(position);
        self.unindex(participant, assignment);
        self.verify_index();
        true
    }

    /// Remove from every sub-queue; returns the assignments it was removed from
    pub fn remove_everywhere(&mut self, participant: ParticipantId) -> Vec<AssignmentId> {
        let assignments: Vec<AssignmentId> = self.assignments_of(participant).into_iter().collect();
        for assignment in &assignments {
            if let Some(lane) = self.sub_queues.get_mut(assignment) {
                lane.retain(|p| *p != participant);
            }
        }
        self.participant_index.remove(&participant);
        self.verify_index();
        assignments
    }

    /// Insert into one sub-queue at a clamped position; None if closed
    pub fn insert_at(
        &mut self,
        participant: ParticipantId,
        assignment: AssignmentId,
        requested: Option<usize>,
    ) -> Option<usize> {
        let lane = self.sub_queues.get_mut(&assignment)?;
        lane.retain(|p| *p != participant);
        let position = clamp_position(requested, lane.len());
        lane.insert(position, participant);
        self.index(participant, assignment);
        self.verify_index();
        Some(position)
    }

    pub fn where_is(&self, participant: ParticipantId) -> PositionReport {
        let lanes: Vec<LanePosition> = self
            .assignments_of(participant)
            .into_iter()
            .filter_map(|assignment| {
                let lane = self.sub_queues.get(&assignment)?;
                let position = lane.iter().position(|p| *p == participant)?;
                Some(LanePosition {
                    assignment,
                    position,
                })
            })
            .collect();

        if lanes.is_empty() {
            PositionReport::NotQueued
        } else {
            PositionReport::Lanes { lanes }
        }
    }

    // ---- reviewer assignments ----

    pub fn assignment(&self, reviewer: ReviewerId) -> Option<&ActiveAssignment> {
        self.assigned.get(&reviewer)
    }

    pub fn assignments(&self) -> impl Iterator<Item = (&ReviewerId, &ActiveAssignment)> {
        self.assigned.iter()
    }

    /// Sync the index after the admission loop popped `participant` from `assignment`
    pub(crate) fn mark_admitted(&mut self, participant: ParticipantId, assignment: AssignmentId) {
        self.unindex(participant, assignment);
        self.verify_index();
    }

    pub fn assign(&mut self, reviewer: ReviewerId, assignment: ActiveAssignment) -> Option<ActiveAssignment> {
        let participant = assignment.participant;
        self.assigned
            .retain(|other, held| *other == reviewer || held.participant != participant);
        self.assigned.insert(reviewer, assignment)
    }

    pub fn take_assignment(&mut self, reviewer: ReviewerId) -> Option<ActiveAssignment> {
        self.assigned.remove(&reviewer)
    }

    /// Evict the reviewer's previous assignee when the reviewer moves on:
    /// from the sub-queue it was checked for, or from every sub-queue.
    /// The assignment record itself is left for the caller to overwrite.
    pub fn evict_previous(&mut self, reviewer: ReviewerId, drop_from_all: bool) -> Vec<AssignmentId> {
        let Some(previous) = self.assigned.get(&reviewer).cloned() else {
            return Vec::new();
        };
        if drop_from_all {
            self.remove_everywhere(previous.participant)
        } else if self.remove_from(previous.participant, previous.assignment_checked) {
            vec![previous.assignment_checked]
        } else {
            Vec::new()
        }
    }

    // ---- index maintenance ----

    fn index(&mut self, participant: ParticipantId, assignment: AssignmentId) {
        self.participant_index
            .entry(participant)
            .or_default()
            .insert(assignment);
    }

    fn unindex(&mut self, participant: ParticipantId, assignment: AssignmentId) {
        if let Some(set) = self.participant_index.get_mut(&participant) {
            set.remove(&assignment);
            if set.is_empty() {
                self.participant_index.remove(&participant);
            }
        }
    }

    fn derived_index(&self) -> HashMap<ParticipantId, BTreeSet<AssignmentId>> {
        let mut index: HashMap<ParticipantId, BTreeSet<AssignmentId>> = HashMap::new();
        for (assignment, lane) in &self.sub_queues {
            for participant in lane {
                index.entry(*participant).or_default().insert(*assignment);
            }
        }
        index
    }

    /// Panics in debug builds when the index drifted; logs and rebuilds otherwise
    pub fn verify_index(&mut self) {
        let derived = self.derived_index();
        if derived != self.participant_index {
            error!(
                indexed = self.participant_index.len(),
                derived = derived.len(),
                "Participant index out of sync with sub-queues, rebuilding"
            );
            debug_assert!(false, "participant index out of sync with sub-queues");
            self.participant_index = derived;
        }
    }

    // ---- conversion ----

    pub(crate) fn into_parts(
        self,
    ) -> (
        BTreeMap<AssignmentId, VecDeque<ParticipantId>>,
        HashMap<ReviewerId, ActiveAssignment>,
    ) {
        (self.sub_queues, self.assigned)
    }

    pub(crate) fn with_assignments(mut self, assigned: HashMap<ReviewerId, ActiveAssignment>) -> Self {
        self.assigned = assigned;
        self
    }

    #[cfg(test)]
    pub(crate) fn corrupt_index_for_test(&mut self, participant: ParticipantId, assignment: AssignmentId) {
        self.index(participant, assignment);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(id: u64) -> ParticipantId {
        ParticipantId(id)
    }

    fn a(id: u32) -> AssignmentId {
        AssignmentId(id)
    }

    fn queue_with(open: &[u32]) -> MultiAssignmentReviewQueue {
        let mut q = MultiAssignmentReviewQueue::new();
        for id in open {
            q.start_reviewing(a(*id));
        }
        q
    }

    #[test]
    fn test_add_requires_open_assignment() {
        let mut q = queue_with(&[1]);
        assert_eq!(q.add(p(5), a(2)), AddOutcome::NotReviewing { assignment: a(2) });
        assert_eq!(q.add(p(5), a(1)), AddOutcome::Added { position: 0 });
        assert_eq!(q.add(p(5), a(1)), AddOutcome::AlreadyQueued { position: 0 });
    }

    #[test]
    fn test_participant_can_wait_in_several_lanes() {
        let mut q = queue_with(&[1, 2]);
        q.add(p(5), a(1));
        q.add(p(6), a(2));
        q.add(p(5), a(2));

        assert_eq!(q.assignments_of(p(5)), BTreeSet::from([a(1), a(2)]));
        assert_eq!(q.waiting_count(), 2);
        assert_eq!(
            q.where_is(p(5)),
            PositionReport::Lanes {
                lanes: vec![
                    LanePosition { assignment: a(1), position: 0 },
                    LanePosition { assignment: a(2), position: 1 },
                ]
            }
        );
    }

    #[test]
    fn test_stop_reviewing_evicts_and_updates_index() {
        let mut q = queue_with(&[1, 2]);
        q.add(p(5), a(1));
        q.add(p(6), a(1));
        q.add(p(5), a(2));

        let evicted = q.stop_reviewing(a(1)).unwrap();
        assert_eq!(evicted, vec![p(5), p(6)]);
        assert_eq!(q.assignments_of(p(5)), BTreeSet::from([a(2)]));
        assert!(q.assignments_of(p(6)).is_empty());
        assert!(q.stop_reviewing(a(1)).is_none());
    }

    #[test]
    fn test_remove_single_and_everywhere() {
        let mut q = queue_with(&[1, 2]);
        q.add(p(5), a(1));
        q.add(p(5), a(2));

        assert_eq!(q.remove(p(5), Some(a(1))), RemoveOutcome::Removed);
        assert_eq!(q.remove(p(5), Some(a(1))), RemoveOutcome::NotFound);
        assert_eq!(q.remove(p(5), None), RemoveOutcome::Removed);
        assert_eq!(q.where_is(p(5)), PositionReport::NotQueued);
    }

    #[test]
    fn test_default_lane_is_lowest_non_empty() {
        let mut q = queue_with(&[1, 2, 3]);
        assert_eq!(q.default_lane(), None);
        q.add(p(5), a(3));
        q.add(p(6), a(2));
        assert_eq!(q.default_lane(), Some(a(2)));
    }

    #[test]
    fn test_evict_previous_scope() {
        let mut q = queue_with(&[1, 2]);
        q.add(p(5), a(1));
        q.add(p(5), a(2));
        q.assign(
            p(100),
            ActiveAssignment {
                participant: p(5),
                assignment_checked: a(1),
                prior_location: None,
                all_assignment_ids: BTreeSet::from([a(1), a(2)]),
            },
        );

        assert_eq!(q.evict_previous(p(100), false), vec![a(1)]);
        assert_eq!(q.assignments_of(p(5)), BTreeSet::from([a(2)]));

        q.add(p(5), a(1));
        let mut evicted = q.evict_previous(p(100), true);
        evicted.sort();
        assert_eq!(evicted, vec![a(1), a(2)]);
        assert_eq!(q.waiting_count(), 0);
    }

    #[test]
    fn test_from_lanes_rebuilds_index_and_skips_closed() {
        let q = MultiAssignmentReviewQueue::from_lanes(
            [a(1), a(2)],
            [(a(1), vec![p(1), p(2)]), (a(2), vec![p(2)]), (a(9), vec![p(3)])],
        );
        assert_eq!(q.assignments_of(p(2)), BTreeSet::from([a(1), a(2)]));
        assert!(!q.is_reviewing(a(9)));
        assert_eq!(q.waiting_count(), 2);
    }

    #[test]
    fn test_insert_at_closed_lane_is_rejected() {
        let mut q = queue_with(&[1]);
        assert_eq!(q.insert_at(p(1), a(2), Some(0)), None);
        assert_eq!(q.insert_at(p(1), a(1), Some(7)), Some(0));
    }

    #[test]
    #[should_panic(expected = "participant index out of sync")]
    fn test_index_drift_panics_in_debug() {
        let mut q = queue_with(&[1]);
        q.corrupt_index_for_test(p(42), a(1));
        q.verify_index();
    }
}
