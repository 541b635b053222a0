//! EduQueue Daemon - Main Entry Point
//!
//! Loads persisted queues, serves JSON-RPC, autosaves, and saves
//! everything once more on Ctrl+C.

mod config;
mod telemetry;

use anyhow::Result;
use std::sync::Arc;
use tracing::{error, info, warn};

use config::DaemonConfig;
use eduqueue_api_rpc::{RpcServer, RpcServerConfig};
use eduqueue_core::application::{AutosaveScheduler, LoadOutcome, QueueRegistry, QueueService};
use eduqueue_core::port::{SystemTimeProvider, UuidProvider};
use eduqueue_infra_fs::JsonFileQueueStore;
use eduqueue_infra_session::{OutboxNotifier, PresenceTable};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Configuration and logging
    let config = DaemonConfig::from_env()?;
    let _log_guard = telemetry::init(&config)?;

    info!("EduQueue daemon v{} starting...", VERSION);
    info!(
        data_dir = %config.data_dir.display(),
        autosave_secs = config.autosave.as_secs(),
        "Configuration loaded"
    );

    // 2. Wiring
    let time_provider = Arc::new(SystemTimeProvider);
    let id_provider = Arc::new(UuidProvider);

    let store = Arc::new(JsonFileQueueStore::new(&config.data_dir));
    let registry = Arc::new(QueueRegistry::new(store));
    let presence = Arc::new(
        PresenceTable::new(id_provider.clone(), time_provider.clone())
            .with_move_capacity(config.outbox_capacity),
    );
    let outbox = Arc::new(OutboxNotifier::new(
        config.outbox_capacity,
        presence.clone(),
        id_provider,
        time_provider,
    ));
    let service = Arc::new(QueueService::new(
        registry.clone(),
        presence.clone(),
        outbox.clone(),
    ));

    // 3. Restore persisted queues
    match service.load_all().await {
        Ok(outcomes) => {
            let mut loaded = 0;
            for outcome in &outcomes {
                match outcome {
                    LoadOutcome::Loaded(_) => loaded += 1,
                    LoadOutcome::Failed { source, reason } => {
                        warn!(source = %source, reason = %reason, "Skipped persisted queue")
                    }
                }
            }
            info!(loaded, skipped = outcomes.len() - loaded, "Persisted queues restored");
        }
        Err(e) => error!(error = %e, "Could not list persisted queues; starting empty"),
    }

    // 4. Autosave
    let autosave = AutosaveScheduler::spawn(registry, config.autosave);

    // 5. JSON-RPC server
    let rpc_config = RpcServerConfig {
        port: config.rpc_port,
        ..Default::default()
    };
    let rpc_handle = RpcServer::new(rpc_config, service, presence, outbox)
        .start()
        .await
        .map_err(|e| anyhow::anyhow!("RPC server start failed: {}", e))?;

    info!("System ready. Press Ctrl+C to shutdown");

    // 6. Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received. Saving queues...");

    rpc_handle
        .stop()
        .map_err(|e| anyhow::anyhow!("RPC server stop failed: {}", e))?;
    rpc_handle.stopped().await;

    let report = autosave.shutdown().await;
    for failure in &report.failed {
        error!(queue = %failure.identity, reason = %failure.reason, "Final save failed");
    }
    info!(
        saved = report.saved.len(),
        failed = report.failed.len(),
        "Shutdown complete"
    );

    telemetry::shutdown();
    Ok(())
}
