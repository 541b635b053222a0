//! Review queue flows against the presence table and outbox

mod common;

use common::*;
use eduqueue_core::application::TakeNextOptions;
use eduqueue_core::domain::{
    AddOutcome, AssignmentId, Notice, PositionReport, PutBackOutcome, TakeNextOutcome, VariantTag,
    VoiceLocation,
};
use eduqueue_infra_session::OutboxRecipient;

fn options() -> TakeNextOptions {
    TakeNextOptions::default()
}

/// add A, add B, add A again, take next admits A
#[tokio::test]
async fn test_add_is_idempotent_and_take_next_admits_head() {
    let dir = tempfile::tempdir().unwrap();
    let stack = stack(dir.path());
    stack.create(VariantTag::Review).await;
    stack.reviewer_in_voice().await;
    stack.presence(&[(1, Some(10)), (2, Some(20))]).await;

    let service = &stack.service;
    assert_eq!(
        service.add_participant(identity(), p(1), None).await.unwrap(),
        AddOutcome::Added { position: 0 }
    );
    assert_eq!(
        service.add_participant(identity(), p(2), None).await.unwrap(),
        AddOutcome::Added { position: 1 }
    );
    assert_eq!(
        service.add_participant(identity(), p(1), None).await.unwrap(),
        AddOutcome::AlreadyQueued { position: 0 }
    );
    assert_eq!(service.queue_size(identity()).await.unwrap().total, 2);

    let outcome = service.take_next(identity(), REVIEWER, options()).await.unwrap();
    assert_eq!(outcome, TakeNextOutcome::Admitted { participant: p(1) });
    assert_eq!(
        service.queue_position(identity(), p(2)).await.unwrap(),
        PositionReport::Queued { position: 0 }
    );

    let moves = stack.presence.drain_moves().await;
    assert_eq!(moves.len(), 1);
    assert_eq!(moves[0].participant, p(1));
    assert_eq!(moves[0].destination, REVIEW_ROOM);

    // B is now at the front and hears about it
    let notices = stack.outbox.drain(None).await;
    assert!(notices.iter().any(|entry| matches!(
        entry.recipient,
        OutboxRecipient::Participant { participant, .. } if participant == p(2)
    ) && matches!(entry.notice, Notice::HeadsUp { .. })));
}

/// waiting [A, B, C], only C in voice: C admitted, [A, B] go to the tail
#[tokio::test]
async fn test_unready_participants_are_skipped_and_kept_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let stack = stack(dir.path());
    stack.create(VariantTag::Review).await;
    stack.reviewer_in_voice().await;
    stack.presence(&[(1, None), (2, None), (3, Some(30))]).await;

    for id in [1, 2, 3] {
        stack.service.add_participant(identity(), p(id), None).await.unwrap();
    }

    let outcome = stack
        .service
        .take_next(identity(), REVIEWER, options())
        .await
        .unwrap();
    assert_eq!(outcome, TakeNextOutcome::Admitted { participant: p(3) });

    assert_eq!(
        stack.service.queue_position(identity(), p(1)).await.unwrap(),
        PositionReport::Queued { position: 0 }
    );
    assert_eq!(
        stack.service.queue_position(identity(), p(2)).await.unwrap(),
        PositionReport::Queued { position: 1 }
    );

    let skipped: Vec<_> = stack
        .outbox
        .drain(None)
        .await
        .into_iter()
        .filter(|entry| matches!(entry.notice, Notice::SkippedNotReady { .. }))
        .collect();
    assert_eq!(skipped.len(), 2);
}

#[tokio::test]
async fn test_nobody_ready_leaves_line_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let stack = stack(dir.path());
    stack.create(VariantTag::Review).await;
    stack.reviewer_in_voice().await;

    for id in [1, 2] {
        stack.service.add_participant(identity(), p(id), None).await.unwrap();
    }

    let outcome = stack
        .service
        .take_next(identity(), REVIEWER, options())
        .await
        .unwrap();
    assert_eq!(outcome, TakeNextOutcome::NoneReady);
    assert_eq!(
        stack.service.queue_position(identity(), p(1)).await.unwrap(),
        PositionReport::Queued { position: 0 }
    );
    assert!(stack.presence.drain_moves().await.is_empty());
}

#[tokio::test]
async fn test_reviewer_outside_voice_gets_no_destination() {
    let dir = tempfile::tempdir().unwrap();
    let stack = stack(dir.path());
    stack.create(VariantTag::Review).await;
    stack.presence(&[(1, Some(10))]).await;
    stack.service.add_participant(identity(), p(1), None).await.unwrap();

    let outcome = stack
        .service
        .take_next(identity(), REVIEWER, options())
        .await
        .unwrap();
    assert_eq!(outcome, TakeNextOutcome::NoDestination);
    assert_eq!(stack.service.queue_size(identity()).await.unwrap().total, 1);
}

#[tokio::test]
async fn test_put_back_then_take_next_admits_same_participant() {
    let dir = tempfile::tempdir().unwrap();
    let stack = stack(dir.path());
    stack.create(VariantTag::Review).await;
    stack.reviewer_in_voice().await;
    stack.presence(&[(1, Some(10))]).await;
    stack.service.add_participant(identity(), p(1), None).await.unwrap();

    stack
        .service
        .take_next(identity(), REVIEWER, options())
        .await
        .unwrap();

    let returned = stack.service.put_back(identity(), REVIEWER, None).await.unwrap();
    assert_eq!(
        returned,
        PutBackOutcome::Returned {
            participant: p(1),
            position: 0
        }
    );

    // moved into the review room, then back where they came from
    let moves = stack.presence.drain_moves().await;
    assert_eq!(moves.len(), 2);
    assert_eq!(moves[1].destination, VoiceLocation(10));

    let again = stack
        .service
        .take_next(identity(), REVIEWER, options())
        .await
        .unwrap();
    assert_eq!(again, TakeNextOutcome::Admitted { participant: p(1) });

    assert_eq!(
        stack.service.put_back(identity(), p(1), None).await.unwrap(),
        PutBackOutcome::NoAssignment
    );
}

#[tokio::test]
async fn test_multi_assignment_drop_from_all() {
    let dir = tempfile::tempdir().unwrap();
    let stack = stack(dir.path());
    stack.create(VariantTag::MultiReview).await;
    stack.reviewer_in_voice().await;
    stack.presence(&[(1, Some(10)), (2, Some(20))]).await;

    let (lab1, lab2) = (AssignmentId(1), AssignmentId(2));
    stack.service.toggle_assignment(identity(), lab1).await.unwrap();
    stack.service.toggle_assignment(identity(), lab2).await.unwrap();

    assert_eq!(
        stack.service.add_participant(identity(), p(1), Some(AssignmentId(3))).await.unwrap(),
        AddOutcome::NotReviewing {
            assignment: AssignmentId(3)
        }
    );
    for (id, lab) in [(1, lab1), (1, lab2), (2, lab1)] {
        stack.service.add_participant(identity(), p(id), Some(lab)).await.unwrap();
    }

    let first = stack
        .service
        .take_next(
            identity(),
            REVIEWER,
            TakeNextOptions {
                assignment: Some(lab1),
                drop_from_all: false,
            },
        )
        .await
        .unwrap();
    assert_eq!(first, TakeNextOutcome::Admitted { participant: p(1) });
    // still waiting for the second lab
    assert_eq!(stack.service.queue_size(identity()).await.unwrap().total, 2);

    let second = stack
        .service
        .take_next(
            identity(),
            REVIEWER,
            TakeNextOptions {
                assignment: Some(lab1),
                drop_from_all: true,
            },
        )
        .await
        .unwrap();
    assert_eq!(second, TakeNextOutcome::Admitted { participant: p(2) });
    assert_eq!(stack.service.queue_size(identity()).await.unwrap().total, 0);
    assert_eq!(
        stack.service.queue_position(identity(), p(1)).await.unwrap(),
        PositionReport::NotQueued
    );
}
