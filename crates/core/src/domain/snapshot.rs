// Persisted queue schema
//
// One JSON document per queue identity:
//   { "variantTag": .., "guildName": .., "channelName": .., "data": <payload> }
// The payload shape depends on the variant tag.

use crate::domain::error::{DomainError, Result};
use crate::domain::identity::{AssignmentId, ParticipantId, QuestionIndex, QueueIdentity, VariantTag};
use crate::domain::multi_review::MultiAssignmentReviewQueue;
use crate::domain::question::{AnsweredQuestion, Question, QuestionQueue};
use crate::domain::record::{QueueBody, QueueHeader, QueueRecord};
use crate::domain::review::SimpleReviewQueue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueSnapshot {
    pub variant_tag: VariantTag,
    pub guild_name: String,
    pub channel_name: String,
    pub data: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct MultiReviewData {
    assignments: Vec<AssignmentId>,
    #[serde(default)]
    queue: BTreeMap<AssignmentId, Vec<ParticipantId>>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuestionData {
    next_index: u32,
    open: Vec<(QuestionIndex, String, Vec<ParticipantId>)>,
    #[serde(default)]
    answered: Vec<AnsweredEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
struct AnsweredEntry {
    index: QuestionIndex,
    #[serde(flatten)]
    question: AnsweredQuestion,
}

/// Accepted question payloads; the positional form predates explicit indices
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredQuestions {
    Indexed(QuestionData),
    Positional(Vec<(String, Vec<ParticipantId>)>),
}

impl QueueRecord {
    /// Capture the persisted form. Reviewer assignments are live-session
    /// state and are not persisted.
    pub fn to_snapshot(&self) -> Result<QueueSnapshot> {
        let data = match &self.body {
            QueueBody::Review(q) => serde_json::to_value(q.waiting()),
            QueueBody::MultiReview(q) => serde_json::to_value(MultiReviewData {
                assignments: q.open_assignments().collect(),
                queue: q
                    .open_assignments()
                    .filter_map(|a| q.lane(a).map(|lane| (a, lane.iter().copied().collect::<Vec<_>>())))
                    .collect(),
            }),
            QueueBody::Question(q) => serde_json::to_value(QuestionData {
                next_index: q.next_index().0,
                open: q
                    .open_questions()
                    .map(|(index, question)| {
                        (*index, question.text().to_string(), question.followers().to_vec())
                    })
                    .collect(),
                answered: q
                    .answered_questions()
                    .map(|(index, question)| AnsweredEntry {
                        index: *index,
                        question: question.clone(),
                    })
                    .collect(),
            }),
        }
        .map_err(|e| payload_error(self.variant_tag(), e))?;

        Ok(QueueSnapshot {
            variant_tag: self.variant_tag(),
            guild_name: self.header.guild_name.clone(),
            channel_name: self.header.channel_name.clone(),
            data,
        })
    }

    /// Rebuild a record from its persisted form. The identity comes from the
    /// file name, not the document.
    pub fn from_snapshot(identity: QueueIdentity, snapshot: QueueSnapshot) -> Result<Self> {
        let tag = snapshot.variant_tag;
        let body = match tag {
            VariantTag::Review => {
                let waiting: Vec<ParticipantId> =
                    serde_json::from_value(snapshot.data).map_err(|e| payload_error(tag, e))?;
                QueueBody::Review(SimpleReviewQueue::from_waiting(waiting))
            }
            VariantTag::MultiReview => {
                let data: MultiReviewData =
                    serde_json::from_value(snapshot.data).map_err(|e| payload_error(tag, e))?;
                QueueBody::MultiReview(MultiAssignmentReviewQueue::from_lanes(
                    data.assignments,
                    data.queue,
                ))
            }
            VariantTag::Question => {
                let stored: StoredQuestions =
                    serde_json::from_value(snapshot.data).map_err(|e| payload_error(tag, e))?;
                QueueBody::Question(restore_questions(stored))
            }
        };

        Ok(QueueRecord {
            header: QueueHeader::new(identity, snapshot.guild_name, snapshot.channel_name),
            body,
        })
    }
}

fn restore_questions(stored: StoredQuestions) -> QuestionQueue {
    match stored {
        StoredQuestions::Indexed(data) => QuestionQueue::restore(
            data.next_index,
            data.open.into_iter().map(|(index, text, followers)| {
                (index, Question::with_followers(text, followers))
            }),
            data.answered
                .into_iter()
                .map(|entry| (entry.index, entry.question)),
        ),
        StoredQuestions::Positional(entries) => {
            let open: Vec<(QuestionIndex, Question)> = entries
                .into_iter()
                .zip(1u32..)
                .map(|((text, followers), n)| {
                    (QuestionIndex(n), Question::with_followers(text, followers))
                })
                .collect();
            QuestionQueue::restore(1, open, std::iter::empty())
        }
    }
}

fn payload_error(variant: VariantTag, err: serde_json::Error) -> DomainError {
    DomainError::InvalidPayload {
        variant: variant.to_string(),
        reason: err.to_string(),
    }
}
