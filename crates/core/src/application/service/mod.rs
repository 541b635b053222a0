// Queue Service - command-facing use cases
//
// Every operation resolves the queue, locks it for the whole call and
// returns an outcome enum. Registry-level failures (missing queue, wrong
// variant, persistence) are `AppError`s.

mod question;
mod review;

pub use review::TakeNextOptions;

use crate::application::admission::AdmissionContext;
use crate::application::registry::{LoadOutcome, LoadReport, QueueRegistry, QueueSummary, SaveReport};
use crate::domain::{
    AssignmentId, ConvertOutcome, ParticipantId, PositionReport, QueueIdentity, QueueSize,
    VariantTag,
};
use crate::error::{AppError, Result};
use crate::port::{Notifier, VoiceCapability};
use std::sync::Arc;

pub struct QueueService {
    registry: Arc<QueueRegistry>,
    voice: Arc<dyn VoiceCapability>,
    notifier: Arc<dyn Notifier>,
}

impl QueueService {
    pub fn new(
        registry: Arc<QueueRegistry>,
        voice: Arc<dyn VoiceCapability>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            registry,
            voice,
            notifier,
        }
    }

    pub fn registry(&self) -> &Arc<QueueRegistry> {
        &self.registry
    }

    fn context(&self, identity: QueueIdentity) -> AdmissionContext<'_> {
        AdmissionContext {
            identity,
            voice: self.voice.as_ref(),
            notifier: self.notifier.as_ref(),
        }
    }

    /// Create an empty queue in a channel
    pub async fn create_queue(
        &self,
        identity: QueueIdentity,
        variant: VariantTag,
        guild_name: &str,
        channel_name: &str,
    ) -> Result<QueueSummary> {
        self.registry
            .create(identity, variant, guild_name, channel_name)
            .await
    }

    pub async fn convert_queue_variant(
        &self,
        identity: QueueIdentity,
        target: VariantTag,
        seed: Option<AssignmentId>,
    ) -> Result<ConvertOutcome> {
        self.registry.convert(identity, target, seed).await
    }

    pub async fn queue_position(
        &self,
        identity: QueueIdentity,
        participant: ParticipantId,
    ) -> Result<PositionReport> {
        let handle = self.registry.lookup(identity).await?;
        let record = handle.lock().await;
        Ok(record.where_is(participant))
    }

    pub async fn queue_size(&self, identity: QueueIdentity) -> Result<QueueSize> {
        let handle = self.registry.lookup(identity).await?;
        let record = handle.lock().await;
        Ok(record.size())
    }

    pub async fn list_queues(&self) -> Vec<QueueSummary> {
        self.registry.list().await
    }

    pub async fn save_queue(&self, identity: QueueIdentity) -> Result<()> {
        self.registry.save(identity).await
    }

    pub async fn load_queue(&self, identity: QueueIdentity) -> Result<LoadReport> {
        self.registry.load(identity).await
    }

    pub async fn save_all(&self) -> SaveReport {
        self.registry.save_all().await
    }

    pub async fn load_all(&self) -> Result<Vec<LoadOutcome>> {
        self.registry.load_all().await
    }
}

fn wrong_variant(
    identity: QueueIdentity,
    actual: VariantTag,
    operation: &'static str,
    expected: &'static str,
) -> AppError {
    AppError::WrongVariant {
        identity,
        operation,
        expected,
        actual,
    }
}
