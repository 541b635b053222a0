//! RPC Method Handlers
//!
//! Thin adapters from request types onto `QueueService` and the session
//! adapters.

use crate::error::to_rpc_error;
use crate::types::{
    AmendAnswerRequest, AnswerQuestionRequest, AskQuestionRequest, ConvertQueueRequest,
    CreateQueueRequest, DrainNoticesRequest, DrainNoticesResponse, FollowQuestionRequest,
    MembershipRequest, ParticipantRequest, PresenceUpdateRequest, PresenceUpdateResponse,
    PutBackRequest, QueueRef, SaveQueueResponse, StatsResponse, TakeNextRequest,
    ToggleAssignmentRequest,
};
use eduqueue_core::application::{
    LoadOutcome, LoadReport, QueueService, QueueSummary, SaveReport,
};
use eduqueue_core::domain::{
    AddOutcome, AmendOutcome, AnswerOutcome, ConvertOutcome, FollowOutcome, FollowableQuestion,
    PositionReport, PutBackOutcome, QuestionAsked, QueueSize, RemoveOutcome, TakeNextOutcome,
    ToggleOutcome, VariantTag,
};
use eduqueue_core::error::AppError;
use eduqueue_infra_session::{OutboxNotifier, PresenceTable};
use jsonrpsee::types::ErrorObjectOwned;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

type RpcResult<T> = Result<T, ErrorObjectOwned>;

fn parse_variant(raw: &str) -> RpcResult<VariantTag> {
    raw.parse::<VariantTag>()
        .map_err(|e| to_rpc_error(AppError::Domain(e)))
}

/// RPC Handler with injected dependencies
pub struct RpcHandler {
    service: Arc<QueueService>,
    presence: Arc<PresenceTable>,
    outbox: Arc<OutboxNotifier>,
    start_time: Instant,
}

impl RpcHandler {
    pub fn new(
        service: Arc<QueueService>,
        presence: Arc<PresenceTable>,
        outbox: Arc<OutboxNotifier>,
    ) -> Self {
        Self {
            service,
            presence,
            outbox,
            start_time: Instant::now(),
        }
    }

    // ---- queue.* ----

    pub async fn create_queue(&self, req: CreateQueueRequest) -> RpcResult<QueueSummary> {
        let variant = parse_variant(&req.variant)?;
        self.service
            .create_queue(req.queue, variant, &req.guild_name, &req.channel_name)
            .await
            .map_err(to_rpc_error)
    }

    pub async fn convert_queue(&self, req: ConvertQueueRequest) -> RpcResult<ConvertOutcome> {
        let variant = parse_variant(&req.variant)?;
        self.service
            .convert_queue_variant(req.queue, variant, req.seed)
            .await
            .map_err(to_rpc_error)
    }

    pub async fn queue_position(&self, req: ParticipantRequest) -> RpcResult<PositionReport> {
        self.service
            .queue_position(req.queue, req.participant)
            .await
            .map_err(to_rpc_error)
    }

    pub async fn queue_size(&self, req: QueueRef) -> RpcResult<QueueSize> {
        self.service.queue_size(req.queue).await.map_err(to_rpc_error)
    }

    pub async fn list_queues(&self) -> RpcResult<Vec<QueueSummary>> {
        Ok(self.service.list_queues().await)
    }

    // ---- review.* ----

    pub async fn add_participant(&self, req: MembershipRequest) -> RpcResult<AddOutcome> {
        self.service
            .add_participant(req.queue, req.participant, req.assignment)
            .await
            .map_err(to_rpc_error)
    }

    pub async fn remove_participant(&self, req: MembershipRequest) -> RpcResult<RemoveOutcome> {
        self.service
            .remove_participant(req.queue, req.participant, req.assignment)
            .await
            .map_err(to_rpc_error)
    }

    pub async fn take_next(&self, req: TakeNextRequest) -> RpcResult<TakeNextOutcome> {
        self.service
            .take_next(req.queue, req.reviewer, req.options)
            .await
            .map_err(to_rpc_error)
    }

    pub async fn put_back(&self, req: PutBackRequest) -> RpcResult<PutBackOutcome> {
        self.service
            .put_back(req.queue, req.reviewer, req.position)
            .await
            .map_err(to_rpc_error)
    }

    pub async fn toggle_assignment(
        &self,
        req: ToggleAssignmentRequest,
    ) -> RpcResult<ToggleOutcome> {
        self.service
            .toggle_assignment(req.queue, req.assignment)
            .await
            .map_err(to_rpc_error)
    }

    // ---- question.* ----

    pub async fn ask_question(&self, req: AskQuestionRequest) -> RpcResult<QuestionAsked> {
        self.service
            .ask_question(req.queue, req.participant, &req.text)
            .await
            .map_err(to_rpc_error)
    }

    pub async fn follow_question(&self, req: FollowQuestionRequest) -> RpcResult<FollowOutcome> {
        self.service
            .follow_question(req.queue, req.participant, req.index)
            .await
            .map_err(to_rpc_error)
    }

    pub async fn followable_questions(
        &self,
        req: ParticipantRequest,
    ) -> RpcResult<Vec<FollowableQuestion>> {
        self.service
            .followable_questions(req.queue, req.participant)
            .await
            .map_err(to_rpc_error)
    }

    pub async fn answer_question(&self, req: AnswerQuestionRequest) -> RpcResult<AnswerOutcome> {
        self.service
            .answer_question(req.queue, req.index, req.answerer, req.text)
            .await
            .map_err(to_rpc_error)
    }

    pub async fn amend_answer(&self, req: AmendAnswerRequest) -> RpcResult<AmendOutcome> {
        self.service
            .amend_answer(req.queue, req.index, req.author, &req.text)
            .await
            .map_err(to_rpc_error)
    }

    // ---- admin.* ----

    pub async fn save_queue(&self, req: QueueRef) -> RpcResult<SaveQueueResponse> {
        self.service.save_queue(req.queue).await.map_err(to_rpc_error)?;
        Ok(SaveQueueResponse {
            queue: req.queue,
            saved: true,
        })
    }

    pub async fn load_queue(&self, req: QueueRef) -> RpcResult<LoadReport> {
        self.service.load_queue(req.queue).await.map_err(to_rpc_error)
    }

    pub async fn save_all(&self) -> RpcResult<SaveReport> {
        Ok(self.service.save_all().await)
    }

    pub async fn load_all(&self) -> RpcResult<Vec<LoadOutcome>> {
        self.service.load_all().await.map_err(to_rpc_error)
    }

    pub async fn stats(&self) -> RpcResult<StatsResponse> {
        let queues = self.service.list_queues().await;
        Ok(StatsResponse {
            waiting: queues.iter().map(|q| q.size.total).sum(),
            queues: queues.len(),
            connected: self.presence.connected_count().await,
            pending_notices: self.outbox.len().await,
            uptime_seconds: self.start_time.elapsed().as_secs(),
        })
    }

    // ---- bridge ----

    pub async fn update_presence(
        &self,
        req: PresenceUpdateRequest,
    ) -> RpcResult<PresenceUpdateResponse> {
        let applied = self.presence.apply(req.updates).await;
        let connected = self.presence.connected_count().await;
        debug!(applied, connected, "Presence updated");
        Ok(PresenceUpdateResponse { applied, connected })
    }

    pub async fn drain_notices(&self, req: DrainNoticesRequest) -> RpcResult<DrainNoticesResponse> {
        Ok(DrainNoticesResponse {
            notices: self.outbox.drain(req.limit).await,
            moves: self.presence.drain_moves().await,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::code;
    use eduqueue_core::application::QueueRegistry;
    use eduqueue_core::domain::{ChannelId, GuildId, ParticipantId, QueueIdentity, VoiceLocation};
    use eduqueue_core::port::id_provider::mocks::SequentialIdProvider;
    use eduqueue_core::port::queue_store::mocks::InMemoryQueueStore;
    use eduqueue_core::port::time_provider::mocks::FixedTimeProvider;
    use eduqueue_infra_session::PresenceUpdate;

    const GUILD: u64 = 10;
    const CHANNEL: u64 = 20;

    fn handler() -> RpcHandler {
        let ids = Arc::new(SequentialIdProvider::new());
        let clock = Arc::new(FixedTimeProvider::new(1_700_000_000_000));
        let presence = Arc::new(PresenceTable::new(ids.clone(), clock.clone()));
        let outbox = Arc::new(OutboxNotifier::new(64, presence.clone(), ids, clock));
        let registry = Arc::new(QueueRegistry::new(Arc::new(InMemoryQueueStore::new())));
        let service = Arc::new(QueueService::new(registry, presence.clone(), outbox.clone()));
        RpcHandler::new(service, presence, outbox)
    }

    fn queue() -> QueueIdentity {
        QueueIdentity::new(GUILD, CHANNEL)
    }

    fn presence(participant: u64, location: Option<u64>) -> PresenceUpdate {
        PresenceUpdate {
            guild: GuildId(GUILD),
            participant: ParticipantId(participant),
            location: location.map(VoiceLocation),
            left: false,
        }
    }

    async fn create(handler: &RpcHandler, variant: &str) {
        handler
            .create_queue(CreateQueueRequest {
                queue: queue(),
                variant: variant.to_string(),
                guild_name: "Course".to_string(),
                channel_name: "office-hours".to_string(),
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_unknown_variant_is_validation_error() {
        let handler = handler();
        let err = handler
            .create_queue(CreateQueueRequest {
                queue: queue(),
                variant: "lottery".to_string(),
                guild_name: String::new(),
                channel_name: String::new(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), code::VALIDATION_ERROR);
    }

    #[tokio::test]
    async fn test_duplicate_create_is_conflict() {
        let handler = handler();
        create(&handler, "review").await;
        let err = handler
            .create_queue(CreateQueueRequest {
                queue: queue(),
                variant: "question".to_string(),
                guild_name: String::new(),
                channel_name: String::new(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), code::CONFLICT);
    }

    #[tokio::test]
    async fn test_missing_queue_is_not_found() {
        let handler = handler();
        let err = handler.queue_size(QueueRef { queue: queue() }).await.unwrap_err();
        assert_eq!(err.code(), code::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_take_next_produces_move_and_notices_for_bridge() {
        let handler = handler();
        create(&handler, "review").await;

        handler
            .update_presence(PresenceUpdateRequest {
                updates: vec![presence(1, Some(501)), presence(2, None), presence(99, Some(900))],
            })
            .await
            .unwrap();

        for participant in [2, 1] {
            handler
                .add_participant(MembershipRequest {
                    queue: queue(),
                    participant: ParticipantId(participant),
                    assignment: None,
                })
                .await
                .unwrap();
        }

        let outcome = handler
            .take_next(TakeNextRequest {
                queue: queue(),
                reviewer: ParticipantId(99),
                options: Default::default(),
            })
            .await
            .unwrap();
        assert_eq!(
            outcome,
            TakeNextOutcome::Admitted {
                participant: ParticipantId(1)
            }
        );

        let drained = handler
            .drain_notices(DrainNoticesRequest::default())
            .await
            .unwrap();
        assert_eq!(drained.moves.len(), 1);
        assert_eq!(drained.moves[0].participant, ParticipantId(1));
        assert_eq!(drained.moves[0].destination, VoiceLocation(900));
        // participant 2 was skipped, then got a heads-up as the new front
        assert!(drained.notices.len() >= 2);

        let stats = handler.stats().await.unwrap();
        assert_eq!(stats.queues, 1);
        assert_eq!(stats.waiting, 1);
        assert_eq!(stats.pending_notices, 0);
    }

    #[tokio::test]
    async fn test_question_method_on_review_queue_is_wrong_variant() {
        let handler = handler();
        create(&handler, "review").await;
        let err = handler
            .ask_question(AskQuestionRequest {
                queue: queue(),
                participant: ParticipantId(1),
                text: "Why?".to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), code::WRONG_VARIANT);
    }

    #[tokio::test]
    async fn test_save_then_load_through_admin_methods() {
        let handler = handler();
        create(&handler, "question").await;
        handler
            .ask_question(AskQuestionRequest {
                queue: queue(),
                participant: ParticipantId(4),
                text: "Is the lab due Friday?".to_string(),
            })
            .await
            .unwrap();

        let saved = handler.save_queue(QueueRef { queue: queue() }).await.unwrap();
        assert!(saved.saved);

        let report = handler.load_queue(QueueRef { queue: queue() }).await.unwrap();
        assert!(report.replaced);
        assert_eq!(report.summary.size.total, 1);
        assert_eq!(report.summary.identity.channel, ChannelId(CHANNEL));
    }
}
