// Autosave scheduler
// Periodically persists every queue; the final save runs on shutdown.

use crate::application::registry::{QueueRegistry, SaveReport};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, warn};

/// Handle to a running autosave loop
pub struct AutosaveHandle {
    registry: Arc<QueueRegistry>,
    stop: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

pub struct AutosaveScheduler;

impl AutosaveScheduler {
    /// Spawn the loop. A zero period disables periodic saves; the handle
    /// still performs the final save on shutdown.
    ///
    /// # Arguments
    /// * `registry` - Queues to persist
    /// * `period` - Time between saves
    pub fn spawn(registry: Arc<QueueRegistry>, period: Duration) -> AutosaveHandle {
        let (stop, mut stopped) = watch::channel(false);

        let task = if period.is_zero() {
            info!("Autosave disabled");
            None
        } else {
            let registry = registry.clone();
            Some(tokio::spawn(async move {
                info!(period_secs = period.as_secs(), "Autosave scheduler started");
                let mut tick = interval(period);
                tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
                // first tick fires immediately; queues were just loaded
                tick.tick().await;

                loop {
                    tokio::select! {
                        _ = tick.tick() => {
                            let report = registry.save_all().await;
                            if !report.failed.is_empty() {
                                warn!(failed = report.failed.len(), "Autosave finished with failures");
                            }
                        }
                        changed = stopped.changed() => {
                            if changed.is_err() || *stopped.borrow() {
                                break;
                            }
                        }
                    }
                }
                info!("Autosave scheduler stopped");
            }))
        };

        AutosaveHandle {
            registry,
            stop,
            task,
        }
    }
}

impl AutosaveHandle {
    /// Stop the loop, wait for it, then save everything one last time
    pub async fn shutdown(mut self) -> SaveReport {
        let _ = self.stop.send(true);
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                error!(error = %e, "Autosave task ended abnormally");
            }
        }

        info!("Running final save");
        self.registry.save_all().await
    }
}
