// Question use cases

use super::{wrong_variant, QueueService};
use crate::domain::{
    AmendOutcome, Amendment, Answer, AnswerOutcome, FollowOutcome, FollowableQuestion, Notice,
    ParticipantId, QuestionAsked, QuestionIndex, QuestionQueue, QueueBody, QueueIdentity,
    QueueRecord, VariantTag,
};
use crate::error::{AppError, Result};
use tracing::{info, warn};

const QUESTION_QUEUE: &str = "a question queue";

fn questions<'a>(
    record: &'a mut QueueRecord,
    operation: &'static str,
) -> Result<&'a mut QuestionQueue> {
    let identity = record.identity();
    match &mut record.body {
        QueueBody::Question(queue) => Ok(queue),
        other => Err(wrong_variant(identity, other.variant_tag(), operation, QUESTION_QUEUE)),
    }
}

impl QueueService {
    pub async fn ask_question(
        &self,
        identity: QueueIdentity,
        asker: ParticipantId,
        text: &str,
    ) -> Result<QuestionAsked> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::Validation("question text cannot be empty".to_string()));
        }

        let handle = self.registry.lookup(identity).await?;
        let mut record = handle.lock().await;
        let (index, position) = questions(&mut record, "ask")?.add(asker, text);

        info!(
            guild = %identity.guild,
            channel = %identity.channel,
            participant = %asker,
            index = %index,
            "Question asked"
        );
        Ok(QuestionAsked { index, position })
    }

    pub async fn follow_question(
        &self,
        identity: QueueIdentity,
        participant: ParticipantId,
        index: QuestionIndex,
    ) -> Result<FollowOutcome> {
        let handle = self.registry.lookup(identity).await?;
        let mut record = handle.lock().await;
        Ok(questions(&mut record, "follow")?.follow(participant, index))
    }

    /// Open questions with an "already following" flag
    pub async fn followable_questions(
        &self,
        identity: QueueIdentity,
        participant: ParticipantId,
    ) -> Result<Vec<FollowableQuestion>> {
        let handle = self.registry.lookup(identity).await?;
        let mut record = handle.lock().await;
        Ok(questions(&mut record, "follow")?.followable(participant))
    }

    /// Answer an open question in text, or live in the answerer's voice
    /// channel when `text` is None. Followers and the channel are notified.
    pub async fn answer_question(
        &self,
        identity: QueueIdentity,
        index: QuestionIndex,
        answerer: ParticipantId,
        text: Option<String>,
    ) -> Result<AnswerOutcome> {
        let handle = self.registry.lookup(identity).await?;
        let mut record = handle.lock().await;
        let ctx = self.context(identity);
        let queue = questions(&mut record, "answer")?;

        if !queue.is_open(index) {
            return Ok(AnswerOutcome::NoSuchQuestion);
        }

        let answer = match text {
            Some(text) => Answer::Text { answerer, text },
            None => match ctx.location_of(answerer).await {
                Some(location) => Answer::Voice { answerer, location },
                None => return Ok(AnswerOutcome::NoDestination),
            },
        };

        let Some(answered) = queue.answer(index, answer).cloned() else {
            return Ok(AnswerOutcome::NoSuchQuestion);
        };

        let notice = Notice::QuestionAnswered {
            channel: identity.channel,
            index,
            question: answered.text.clone(),
            answer: answered.answer.clone(),
        };
        for follower in &answered.followers {
            ctx.notify(*follower, &notice).await;
        }
        if let Err(e) = self.notifier.notify_channel(identity, &notice).await {
            warn!(channel = %identity.channel, error = %e, "Failed to post answer in channel");
        }

        info!(
            guild = %identity.guild,
            channel = %identity.channel,
            index = %index,
            answerer = %answerer,
            followers = answered.followers.len(),
            "Question answered"
        );

        Ok(match answered.answer {
            Answer::Text { .. } => AnswerOutcome::TextAnswered {
                followers: answered.followers,
            },
            Answer::Voice { location, .. } => AnswerOutcome::VoiceAnswered {
                location,
                followers: answered.followers,
            },
        })
    }

    /// Add an addendum to an answered question; it stays answered
    pub async fn amend_answer(
        &self,
        identity: QueueIdentity,
        index: QuestionIndex,
        author: ParticipantId,
        amendment: &str,
    ) -> Result<AmendOutcome> {
        let handle = self.registry.lookup(identity).await?;
        let mut record = handle.lock().await;
        let ctx = self.context(identity);
        let queue = questions(&mut record, "amend")?;

        let Some(amended) = queue
            .amend(
                index,
                Amendment {
                    author,
                    text: amendment.to_string(),
                },
            )
            .cloned()
        else {
            return Ok(AmendOutcome::NoSuchAnsweredQuestion);
        };

        let notice = Notice::AnswerAmended {
            channel: identity.channel,
            index,
            question: amended.text.clone(),
            amendment: amendment.to_string(),
        };
        for follower in &amended.followers {
            ctx.notify(*follower, &notice).await;
        }

        info!(channel = %identity.channel, index = %index, author = %author, "Answer amended");
        Ok(AmendOutcome::Amended {
            followers: amended.followers,
        })
    }
}
