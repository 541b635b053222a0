//! Question queue flows, including a save/reload in the middle

mod common;

use common::*;
use eduqueue_core::domain::{
    AmendOutcome, AnswerOutcome, FollowOutcome, Notice, PositionReport, QuestionIndex,
    QuestionPosition, VariantTag,
};
use eduqueue_infra_session::OutboxRecipient;

const STAFF: u64 = 8000;

#[tokio::test]
async fn test_ask_follow_answer_amend() {
    let dir = tempfile::tempdir().unwrap();
    let stack = stack(dir.path());
    stack.create(VariantTag::Question).await;
    stack.presence(&[(1, None), (2, None), (STAFF, Some(600))]).await;

    let asked = stack
        .service
        .ask_question(identity(), p(1), "Does the midterm cover recursion?")
        .await
        .unwrap();
    assert_eq!(asked.index, QuestionIndex(1));

    assert_eq!(
        stack.service.follow_question(identity(), p(2), asked.index).await.unwrap(),
        FollowOutcome::Followed
    );
    assert_eq!(
        stack.service.follow_question(identity(), p(2), asked.index).await.unwrap(),
        FollowOutcome::AlreadyFollowing
    );
    assert_eq!(
        stack.service.follow_question(identity(), p(2), QuestionIndex(9)).await.unwrap(),
        FollowOutcome::NoSuchQuestion
    );

    assert_eq!(
        stack.service.queue_position(identity(), p(2)).await.unwrap(),
        PositionReport::Questions {
            questions: vec![QuestionPosition {
                index: asked.index,
                position: 0,
                own: false
            }]
        }
    );

    // voice answer: staff is in voice
    let answered = stack
        .service
        .answer_question(identity(), asked.index, p(STAFF), None)
        .await
        .unwrap();
    assert!(matches!(answered, AnswerOutcome::VoiceAnswered { ref followers, .. } if followers.len() == 2));

    let notices = stack.outbox.drain(None).await;
    let answered_to: Vec<_> = notices
        .iter()
        .filter(|entry| matches!(entry.notice, Notice::QuestionAnswered { .. }))
        .map(|entry| entry.recipient.clone())
        .collect();
    assert_eq!(answered_to.len(), 3, "two followers plus the channel");
    assert!(answered_to
        .iter()
        .any(|r| matches!(r, OutboxRecipient::Channel { .. })));

    assert_eq!(
        stack
            .service
            .amend_answer(identity(), asked.index, p(STAFF), "Yes, chapters 3 and 4.")
            .await
            .unwrap(),
        AmendOutcome::Amended {
            followers: vec![p(1), p(2)]
        }
    );
    assert_eq!(stack.service.queue_size(identity()).await.unwrap().total, 0);
}

#[tokio::test]
async fn test_indices_survive_answer_and_reload() {
    let dir = tempfile::tempdir().unwrap();
    let stack = stack(dir.path());
    stack.create(VariantTag::Question).await;

    for text in ["first", "second", "third"] {
        stack.service.ask_question(identity(), p(1), text).await.unwrap();
    }
    stack
        .service
        .answer_question(identity(), QuestionIndex(1), p(STAFF), Some("done".to_string()))
        .await
        .unwrap();

    stack.service.save_queue(identity()).await.unwrap();

    // a fresh process over the same directory
    let restarted = common::stack(dir.path());
    let outcomes = restarted.service.load_all().await.unwrap();
    assert_eq!(outcomes.len(), 1);

    let followable = restarted
        .service
        .followable_questions(identity(), p(2))
        .await
        .unwrap();
    let indices: Vec<QuestionIndex> = followable.iter().map(|q| q.index).collect();
    assert_eq!(indices, vec![QuestionIndex(2), QuestionIndex(3)]);

    // answered question kept, so it can still be amended
    assert_eq!(
        restarted
            .service
            .amend_answer(identity(), QuestionIndex(1), p(STAFF), "see slides")
            .await
            .unwrap(),
        AmendOutcome::Amended {
            followers: vec![p(1)]
        }
    );

    let next = restarted
        .service
        .ask_question(identity(), p(4), "fourth")
        .await
        .unwrap();
    assert_eq!(next.index, QuestionIndex(4));
}
