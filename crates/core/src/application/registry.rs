// Queue Registry - process-wide table of live queues
//
// Each record sits behind its own async mutex, held for the whole of one
// operation. The table itself is behind an RwLock; only create/load take
// the write side. Persistence I/O never happens while a record is locked.

use crate::domain::{
    AssignmentId, ConvertOutcome, QueueHeader, QueueIdentity, QueueRecord, QueueSize, VariantTag,
};
use crate::error::{AppError, Result};
use crate::port::QueueStore;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

pub type QueueHandle = Arc<Mutex<QueueRecord>>;

/// Listing entry for a live queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueSummary {
    pub identity: QueueIdentity,
    pub guild_name: String,
    pub channel_name: String,
    pub size: QueueSize,
}

impl QueueSummary {
    fn of(record: &QueueRecord) -> Self {
        Self {
            identity: record.identity(),
            guild_name: record.header.guild_name.clone(),
            channel_name: record.header.channel_name.clone(),
            size: record.size(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SaveReport {
    pub saved: Vec<QueueIdentity>,
    pub failed: Vec<SaveFailure>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SaveFailure {
    pub identity: QueueIdentity,
    pub reason: String,
}

/// Result of loading one persisted queue
#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
    pub summary: QueueSummary,
    /// A live queue at the same identity was overwritten
    pub replaced: bool,
}

/// Per-document outcome of `load_all`
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum LoadOutcome {
    Loaded(LoadReport),
    Failed { source: String, reason: String },
}

pub struct QueueRegistry {
    queues: RwLock<HashMap<QueueIdentity, QueueHandle>>,
    store: Arc<dyn QueueStore>,
}

impl QueueRegistry {
    pub fn new(store: Arc<dyn QueueStore>) -> Self {
        Self {
            queues: RwLock::new(HashMap::new()),
            store,
        }
    }

    /// Register an empty queue of `variant`
    ///
    /// # Errors
    /// `AlreadyExists` when a queue is live at `identity`; concurrent
    /// creates for one identity resolve to exactly one winner.
    pub async fn create(
        &self,
        identity: QueueIdentity,
        variant: VariantTag,
        guild_name: &str,
        channel_name: &str,
    ) -> Result<QueueSummary> {
        let mut queues = self.queues.write().await;
        if queues.contains_key(&identity) {
            return Err(AppError::AlreadyExists(identity));
        }

        let record = QueueRecord::empty(QueueHeader::new(identity, guild_name, channel_name), variant);
        let summary = QueueSummary::of(&record);
        queues.insert(identity, Arc::new(Mutex::new(record)));

        info!(
            guild = %identity.guild,
            channel = %identity.channel,
            variant = %variant,
            "Queue created"
        );
        Ok(summary)
    }

    pub async fn lookup(&self, identity: QueueIdentity) -> Result<QueueHandle> {
        self.queues
            .read()
            .await
            .get(&identity)
            .cloned()
            .ok_or(AppError::NotFound(identity))
    }

    /// Registered identities, sorted
    pub async fn identities(&self) -> Vec<QueueIdentity> {
        let mut identities: Vec<QueueIdentity> = self.queues.read().await.keys().copied().collect();
        identities.sort();
        identities
    }

    pub async fn list(&self) -> Vec<QueueSummary> {
        let mut summaries = Vec::new();
        for identity in self.identities().await {
            if let Ok(handle) = self.lookup(identity).await {
                summaries.push(QueueSummary::of(&*handle.lock().await));
            }
        }
        summaries
    }

    /// Swap the queue at `identity` for a `target` queue, inside the same
    /// slot so existing handles see the new variant.
    pub async fn convert(
        &self,
        identity: QueueIdentity,
        target: VariantTag,
        seed: Option<AssignmentId>,
    ) -> Result<ConvertOutcome> {
        let handle = self.lookup(identity).await?;
        let mut record = handle.lock().await;
        let from = record.variant_tag();

        let outcome = record.convert(target, seed)?;
        match &outcome {
            ConvertOutcome::Unchanged => {
                debug!(guild = %identity.guild, channel = %identity.channel, variant = %target, "Queue already has requested variant");
            }
            ConvertOutcome::Converted { migrated } => {
                if from == VariantTag::Question || target == VariantTag::Question {
                    warn!(
                        guild = %identity.guild,
                        channel = %identity.channel,
                        from = %from,
                        to = %target,
                        "Queue state discarded by conversion"
                    );
                }
                info!(
                    guild = %identity.guild,
                    channel = %identity.channel,
                    from = %from,
                    to = %target,
                    migrated = *migrated,
                    "Queue converted"
                );
            }
        }
        Ok(outcome)
    }

    /// Persist one queue
    pub async fn save(&self, identity: QueueIdentity) -> Result<()> {
        let handle = self.lookup(identity).await?;
        // lock held through the write: saves of one queue land in snapshot order
        let record = handle.lock().await;
        let snapshot = record.to_snapshot()?;
        self.store.save(&identity, &snapshot).await?;
        drop(record);
        debug!(guild = %identity.guild, channel = %identity.channel, "Queue saved");
        Ok(())
    }

    /// Persist every queue; one failure never aborts the batch
    pub async fn save_all(&self) -> SaveReport {
        let mut report = SaveReport::default();
        for identity in self.identities().await {
            match self.save(identity).await {
                Ok(()) => report.saved.push(identity),
                Err(e) => {
                    error!(guild = %identity.guild, channel = %identity.channel, error = %e, "Failed to save queue");
                    report.failed.push(SaveFailure {
                        identity,
                        reason: e.to_string(),
                    });
                }
            }
        }
        info!(
            saved = report.saved.len(),
            failed = report.failed.len(),
            "Saved all queues"
        );
        report
    }

    /// Load one queue from the store, replacing the live one in place if any
    pub async fn load(&self, identity: QueueIdentity) -> Result<LoadReport> {
        let snapshot = self
            .store
            .load(&identity)
            .await?
            .ok_or(AppError::NotFound(identity))?;
        let record = QueueRecord::from_snapshot(identity, snapshot)?;
        let summary = QueueSummary::of(&record);

        let mut queues = self.queues.write().await;
        let replaced = match queues.get(&identity) {
            Some(handle) => {
                *handle.lock().await = record;
                true
            }
            None => {
                queues.insert(identity, Arc::new(Mutex::new(record)));
                false
            }
        };

        info!(
            guild = %identity.guild,
            channel = %identity.channel,
            variant = %summary.size.variant,
            size = summary.size.total,
            replaced,
            "Queue loaded"
        );
        Ok(LoadReport { summary, replaced })
    }

    /// Load every stored queue, reporting per document instead of failing fast
    ///
    /// # Errors
    /// Only when the store cannot be listed at all.
    pub async fn load_all(&self) -> Result<Vec<LoadOutcome>> {
        let entries = self.store.list().await?;
        let mut outcomes = Vec::with_capacity(entries.len());

        for entry in entries {
            let Some(identity) = entry.identity else {
                warn!(source = %entry.name, "Skipping stored queue with unrecognised name");
                outcomes.push(LoadOutcome::Failed {
                    source: entry.name,
                    reason: "name does not encode a queue identity".to_string(),
                });
                continue;
            };

            match self.load(identity).await {
                Ok(report) => outcomes.push(LoadOutcome::Loaded(report)),
                Err(e) => {
                    error!(source = %entry.name, error = %e, "Failed to load queue");
                    outcomes.push(LoadOutcome::Failed {
                        source: entry.name,
                        reason: e.to_string(),
                    });
                }
            }
        }

        let loaded = outcomes
            .iter()
            .filter(|o| matches!(o, LoadOutcome::Loaded(_)))
            .count();
        info!(loaded, failed = outcomes.len() - loaded, "Loaded persisted queues");
        Ok(outcomes)
    }
}
