// Question Queue Domain Model

use crate::domain::identity::{ParticipantId, QuestionIndex, VoiceLocation};
use crate::domain::outcome::{FollowOutcome, PositionReport, QuestionPosition};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Open question; `followers[0]` is always the asker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    text: String,
    followers: Vec<ParticipantId>,
}

impl Question {
    pub fn new(asker: ParticipantId, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            followers: vec![asker],
        }
    }

    pub(crate) fn with_followers(text: String, followers: Vec<ParticipantId>) -> Self {
        let mut deduped: Vec<ParticipantId> = Vec::with_capacity(followers.len());
        for follower in followers {
            if !deduped.contains(&follower) {
                deduped.push(follower);
            }
        }
        Self {
            text,
            followers: deduped,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn asker(&self) -> Option<ParticipantId> {
        self.followers.first().copied()
    }

    pub fn followers(&self) -> &[ParticipantId] {
        &self.followers
    }

    pub fn is_following(&self, participant: ParticipantId) -> bool {
        self.followers.contains(&participant)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Answer {
    Text {
        answerer: ParticipantId,
        text: String,
    },
    /// Answered live in the answerer's voice channel
    Voice {
        answerer: ParticipantId,
        location: VoiceLocation,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amendment {
    pub author: ParticipantId,
    pub text: String,
}

/// Answered question, kept so the answer can be amended later
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnsweredQuestion {
    pub text: String,
    pub followers: Vec<ParticipantId>,
    pub answer: Answer,
    #[serde(default)]
    pub amendments: Vec<Amendment>,
}

/// Open question as listed for `follow` without an index
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FollowableQuestion {
    pub index: QuestionIndex,
    pub text: String,
    pub following: bool,
}

#[derive(Debug, Clone)]
pub struct QuestionQueue {
    open: BTreeMap<QuestionIndex, Question>,
    answered: BTreeMap<QuestionIndex, AnsweredQuestion>,
    next_index: u32,
}

impl Default for QuestionQueue {
    fn default() -> Self {
        Self {
            open: BTreeMap::new(),
            answered: BTreeMap::new(),
            next_index: 1,
        }
    }
}

impl QuestionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore from persisted state. `next_index` is raised past every
    /// known index so a damaged counter can never cause reuse.
    pub fn restore(
        next_index: u32,
        open: impl IntoIterator<Item = (QuestionIndex, Question)>,
        answered: impl IntoIterator<Item = (QuestionIndex, AnsweredQuestion)>,
    ) -> Self {
        let open: BTreeMap<QuestionIndex, Question> = open.into_iter().collect();
        let answered: BTreeMap<QuestionIndex, AnsweredQuestion> = answered.into_iter().collect();
        let highest = open
            .keys()
            .chain(answered.keys())
            .map(|index| index.0)
            .max()
            .unwrap_or(0);
        Self {
            open,
            answered,
            next_index: next_index.max(highest + 1),
        }
    }

    pub fn len(&self) -> usize {
        self.open.len()
    }

    pub fn is_empty(&self) -> bool {
        self.open.is_empty()
    }

    pub fn next_index(&self) -> QuestionIndex {
        QuestionIndex(self.next_index)
    }

    pub fn open_questions(&self) -> impl Iterator<Item = (&QuestionIndex, &Question)> {
        self.open.iter()
    }

    pub fn answered_questions(&self) -> impl Iterator<Item = (&QuestionIndex, &AnsweredQuestion)> {
        self.answered.iter()
    }

    pub fn is_open(&self, index: QuestionIndex) -> bool {
        self.open.contains_key(&index)
    }

    pub fn question(&self, index: QuestionIndex) -> Option<&Question> {
        self.open.get(&index)
    }

    pub fn answered(&self, index: QuestionIndex) -> Option<&AnsweredQuestion> {
        self.answered.get(&index)
    }

    /// Ask a question; returns its index and its 0-based position among open questions
    pub fn add(&mut self, asker: ParticipantId, text: impl Into<String>) -> (QuestionIndex, usize) {
        let index = QuestionIndex(self.next_index);
        self.next_index += 1;
        self.open.insert(index, Question::new(asker, text));
        (index, self.open.len() - 1)
    }

    pub fn follow(&mut self, participant: ParticipantId, index: QuestionIndex) -> FollowOutcome {
        let Some(question) = self.open.get_mut(&index) else {
            return FollowOutcome::NoSuchQuestion;
        };
        if question.is_following(participant) {
            return FollowOutcome::AlreadyFollowing;
        }
        question.followers.push(participant);
        FollowOutcome::Followed
    }

    pub fn followable(&self, participant: ParticipantId) -> Vec<FollowableQuestion> {
        self.open
            .iter()
            .map(|(index, question)| FollowableQuestion {
                index: *index,
                text: question.text.clone(),
                following: question.is_following(participant),
            })
            .collect()
    }

    /// Close an open question with its answer; None if not open
    pub fn answer(&mut self, index: QuestionIndex, answer: Answer) -> Option<&AnsweredQuestion> {
        let question = self.open.remove(&index)?;
        self.answered.insert(
            index,
            AnsweredQuestion {
                text: question.text,
                followers: question.followers,
                answer,
                amendments: Vec::new(),
            },
        );
        self.answered.get(&index)
    }

    /// Append an addendum to an answered question; the question stays closed
    pub fn amend(&mut self, index: QuestionIndex, amendment: Amendment) -> Option<&AnsweredQuestion> {
        let answered = self.answered.get_mut(&index)?;
        answered.amendments.push(amendment);
        Some(answered)
    }

    pub fn where_is(&self, participant: ParticipantId) -> PositionReport {
        let questions: Vec<QuestionPosition> = self
            .open
            .iter()
            .enumerate()
            .filter(|(_, (_, question))| question.is_following(participant))
            .map(|(position, (index, question))| QuestionPosition {
                index: *index,
                position,
                own: question.asker() == Some(participant),
            })
            .collect();

        if questions.is_empty() {
            PositionReport::NotQueued
        } else {
            PositionReport::Questions { questions }
        }
    }
}
