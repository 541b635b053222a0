// Notices emitted by queue operations
//
// Notices are structured; wording is decided by whoever delivers them.
// The Display impl is a plain-text fallback.

use crate::domain::admission::HeadsUp;
use crate::domain::identity::{AssignmentId, ChannelId, QuestionIndex};
use crate::domain::question::Answer;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    /// Popped by take-next while not in voice; placed back in line
    SkippedNotReady { channel: ChannelId },

    /// Informational position update after an admission
    HeadsUp {
        channel: ChannelId,
        place: HeadsUp,
        in_voice: bool,
    },

    /// Put back by a reviewer; `position` is 0-based
    ReturnedToQueue { channel: ChannelId, position: usize },

    /// Reviewing of an assignment stopped while the participant waited for it
    AssignmentClosed {
        channel: ChannelId,
        assignment: AssignmentId,
    },

    QuestionAnswered {
        channel: ChannelId,
        index: QuestionIndex,
        question: String,
        answer: Answer,
    },

    AnswerAmended {
        channel: ChannelId,
        index: QuestionIndex,
        question: String,
        amendment: String,
    },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::SkippedNotReady { channel } => write!(
                f,
                "You were invited by a reviewer in <#{channel}>, but you're not in a voice channel yet! \
                 You will be placed back in the queue."
            ),
            Notice::HeadsUp {
                channel,
                place,
                in_voice,
            } => {
                match place {
                    HeadsUp::Next => write!(f, "Get ready! You're next in line for the queue in <#{channel}>!")?,
                    HeadsUp::Second => write!(f, "Almost there, you're second in line for the queue in <#{channel}>!")?,
                    HeadsUp::Fifth => write!(f, "You're fifth in line for the queue in <#{channel}>!")?,
                }
                if !in_voice {
                    write!(f, " Please join a general voice channel so you can be moved!")?;
                }
                Ok(())
            }
            Notice::ReturnedToQueue { channel, position } => write!(
                f,
                "You were moved back into the queue in <#{channel}> at position {}, \
                 probably because you didn't respond.",
                position + 1
            ),
            Notice::AssignmentClosed {
                channel,
                assignment,
            } => write!(
                f,
                "Reviewing of assignment {assignment} in <#{channel}> has stopped; you were removed from its queue."
            ),
            Notice::QuestionAnswered {
                index,
                question,
                answer,
                ..
            } => match answer {
                Answer::Text { text, .. } => write!(
                    f,
                    "Question {index} has been answered!\nQuestion: {question}\nAnswer: {text}"
                ),
                Answer::Voice { answerer, location } => write!(
                    f,
                    "Question {index} will be answered in voice channel <#{location}> by <@{answerer}>!\nQuestion: {question}"
                ),
            },
            Notice::AnswerAmended {
                index,
                question,
                amendment,
                ..
            } => write!(
                f,
                "The answer to question {index} was amended.\nQuestion: {question}\nAddendum: {amendment}"
            ),
        }
    }
}
