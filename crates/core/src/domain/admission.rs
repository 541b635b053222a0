// Admission rules: where skipped (unready) participants go back in line

use crate::domain::identity::ParticipantId;
use serde::Serialize;
use std::collections::VecDeque;

/// Skipped participants never land deeper than this index (unless appended)
pub const REINSERT_CAP: usize = 10;

/// Position used by put-back when the reviewer does not pick one
pub const DEFAULT_PUT_BACK_POSITION: usize = 10;

/// Index at which a block of `skipped` participants is re-inserted into a
/// queue that has `remaining` participants left after admission.
///
/// Short queues (`remaining <= skipped`) send the block to the tail; longer
/// ones place it at `min(remaining / 2, REINSERT_CAP)` so the unready are
/// retried sooner than last, but never ahead of the front half.
pub fn reinsert_index(remaining: usize, skipped: usize) -> usize {
    if remaining <= skipped {
        remaining
    } else {
        (remaining / 2).min(REINSERT_CAP)
    }
}

/// Re-insert `unready` (in pop order) as one contiguous block.
pub fn reinsert_unready(lane: &mut VecDeque<ParticipantId>, unready: Vec<ParticipantId>) {
    if unready.is_empty() {
        return;
    }
    let at = reinsert_index(lane.len(), unready.len());
    let tail = lane.split_off(at);
    lane.extend(unready);
    lane.extend(tail);
}

/// Heads-up notices sent after an admission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HeadsUp {
    Next,
    Second,
    Fifth,
}

impl HeadsUp {
    /// 0-based queue index each heads-up targets
    pub const fn index(self) -> usize {
        match self {
            HeadsUp::Next => 0,
            HeadsUp::Second => 1,
            HeadsUp::Fifth => 4,
        }
    }
}

/// Participants that should receive a heads-up, in notification order
pub fn heads_up_targets(lane: &VecDeque<ParticipantId>) -> Vec<(HeadsUp, ParticipantId)> {
    [HeadsUp::Next, HeadsUp::Second, HeadsUp::Fifth]
        .into_iter()
        .filter_map(|place| lane.get(place.index()).map(|p| (place, *p)))
        .collect()
}

/// Clamp a requested insert position into `[0, len]`
pub fn clamp_position(requested: Option<usize>, len: usize) -> usize {
    requested.unwrap_or(DEFAULT_PUT_BACK_POSITION).min(len)
}
