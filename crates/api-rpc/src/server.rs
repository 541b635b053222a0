//! JSON-RPC Server
//!
//! JSON-RPC 2.0 over TCP, bound to localhost.

use crate::handler::RpcHandler;
use eduqueue_core::application::QueueService;
use eduqueue_infra_session::{OutboxNotifier, PresenceTable};
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::types::ErrorObjectOwned;
use jsonrpsee::RpcModule;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tracing::info;

const DEFAULT_RPC_HOST: &str = "127.0.0.1";
pub const DEFAULT_RPC_PORT: u16 = 9630;

/// RPC Server Configuration
pub struct RpcServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for RpcServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_RPC_HOST.to_string(),
            port: DEFAULT_RPC_PORT,
        }
    }
}

/// Register a method whose params deserialize into `Req`
fn register<Req, Resp, F, Fut>(
    module: &mut RpcModule<()>,
    name: &'static str,
    handler: &Arc<RpcHandler>,
    call: F,
) -> Result<(), String>
where
    Req: DeserializeOwned + Send + 'static,
    Resp: Serialize + Clone + Send + 'static,
    F: Fn(Arc<RpcHandler>, Req) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Result<Resp, ErrorObjectOwned>> + Send + 'static,
{
    let handler = handler.clone();
    module
        .register_async_method(name, move |params, _, _| {
            let handler = handler.clone();
            let call = call.clone();
            async move {
                let req: Req = params.parse()?;
                call(handler, req).await
            }
        })
        .map_err(|e| e.to_string())?;
    Ok(())
}

/// Register a method that takes no params
fn register_bare<Resp, F, Fut>(
    module: &mut RpcModule<()>,
    name: &'static str,
    handler: &Arc<RpcHandler>,
    call: F,
) -> Result<(), String>
where
    Resp: Serialize + Clone + Send + 'static,
    F: Fn(Arc<RpcHandler>) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Result<Resp, ErrorObjectOwned>> + Send + 'static,
{
    let handler = handler.clone();
    module
        .register_async_method(name, move |_, _, _| {
            let handler = handler.clone();
            let call = call.clone();
            async move { call(handler).await }
        })
        .map_err(|e| e.to_string())?;
    Ok(())
}

/// RPC Server
pub struct RpcServer {
    config: RpcServerConfig,
    handler: Arc<RpcHandler>,
}

impl RpcServer {
    pub fn new(
        config: RpcServerConfig,
        service: Arc<QueueService>,
        presence: Arc<PresenceTable>,
        outbox: Arc<OutboxNotifier>,
    ) -> Self {
        Self {
            config,
            handler: Arc::new(RpcHandler::new(service, presence, outbox)),
        }
    }

    /// Build the method table; exposed separately so it can be served or
    /// called in-process
    pub fn module(&self) -> Result<RpcModule<()>, String> {
        let mut module = RpcModule::new(());
        let h = &self.handler;

        // queue.*
        register(&mut module, "queue.create.v1", h, |h, req| async move {
            h.create_queue(req).await
        })?;
        register(&mut module, "queue.convert.v1", h, |h, req| async move {
            h.convert_queue(req).await
        })?;
        register(&mut module, "queue.position.v1", h, |h, req| async move {
            h.queue_position(req).await
        })?;
        register(&mut module, "queue.size.v1", h, |h, req| async move {
            h.queue_size(req).await
        })?;
        register_bare(&mut module, "queue.list.v1", h, |h| async move {
            h.list_queues().await
        })?;

        // review.*
        register(&mut module, "review.add.v1", h, |h, req| async move {
            h.add_participant(req).await
        })?;
        register(&mut module, "review.remove.v1", h, |h, req| async move {
            h.remove_participant(req).await
        })?;
        register(&mut module, "review.take_next.v1", h, |h, req| async move {
            h.take_next(req).await
        })?;
        register(&mut module, "review.put_back.v1", h, |h, req| async move {
            h.put_back(req).await
        })?;
        register(&mut module, "review.toggle_assignment.v1", h, |h, req| async move {
            h.toggle_assignment(req).await
        })?;

        // question.*
        register(&mut module, "question.ask.v1", h, |h, req| async move {
            h.ask_question(req).await
        })?;
        register(&mut module, "question.follow.v1", h, |h, req| async move {
            h.follow_question(req).await
        })?;
        register(&mut module, "question.followable.v1", h, |h, req| async move {
            h.followable_questions(req).await
        })?;
        register(&mut module, "question.answer.v1", h, |h, req| async move {
            h.answer_question(req).await
        })?;
        register(&mut module, "question.amend.v1", h, |h, req| async move {
            h.amend_answer(req).await
        })?;

        // admin.*
        register(&mut module, "admin.save.v1", h, |h, req| async move {
            h.save_queue(req).await
        })?;
        register(&mut module, "admin.load.v1", h, |h, req| async move {
            h.load_queue(req).await
        })?;
        register_bare(&mut module, "admin.save_all.v1", h, |h| async move {
            h.save_all().await
        })?;
        register_bare(&mut module, "admin.load_all.v1", h, |h| async move {
            h.load_all().await
        })?;
        register_bare(&mut module, "admin.stats.v1", h, |h| async move {
            h.stats().await
        })?;

        // bridge
        register(&mut module, "presence.update.v1", h, |h, req| async move {
            h.update_presence(req).await
        })?;
        register(
            &mut module,
            "notices.drain.v1",
            h,
            |h, req: Option<crate::types::DrainNoticesRequest>| async move {
                h.drain_notices(req.unwrap_or_default()).await
            },
        )?;

        Ok(module)
    }

    /// Start the JSON-RPC server
    ///
    /// Security: Only binds to 127.0.0.1 by default (no external access)
    pub async fn start(self) -> Result<ServerHandle, String> {
        let addr = format!("{}:{}", self.config.host, self.config.port);

        info!(
            host = %self.config.host,
            port = %self.config.port,
            "Starting JSON-RPC server on TCP"
        );

        let module = self.module()?;
        let server = Server::builder()
            .build(&addr)
            .await
            .map_err(|e| format!("Failed to build server on {}: {}", addr, e))?;

        info!(methods = module.method_names().count(), "JSON-RPC server started successfully");
        Ok(server.start(module))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eduqueue_core::application::QueueRegistry;
    use eduqueue_core::port::id_provider::mocks::SequentialIdProvider;
    use eduqueue_core::port::queue_store::mocks::InMemoryQueueStore;
    use eduqueue_core::port::time_provider::mocks::FixedTimeProvider;
    use jsonrpsee::core::params::ObjectParams;
    use serde_json::{json, Value};

    fn server() -> RpcServer {
        let ids = Arc::new(SequentialIdProvider::new());
        let clock = Arc::new(FixedTimeProvider::new(0));
        let presence = Arc::new(PresenceTable::new(ids.clone(), clock.clone()));
        let outbox = Arc::new(OutboxNotifier::new(16, presence.clone(), ids, clock));
        let registry = Arc::new(QueueRegistry::new(Arc::new(InMemoryQueueStore::new())));
        let service = Arc::new(QueueService::new(registry, presence.clone(), outbox.clone()));
        RpcServer::new(RpcServerConfig::default(), service, presence, outbox)
    }

    #[test]
    fn test_all_methods_registered() {
        let module = server().module().unwrap();
        let names: Vec<&str> = module.method_names().collect();
        for name in [
            "queue.create.v1",
            "queue.list.v1",
            "review.take_next.v1",
            "question.answer.v1",
            "admin.save_all.v1",
            "presence.update.v1",
            "notices.drain.v1",
        ] {
            assert!(names.contains(&name), "missing {name}");
        }
    }

    fn params(value: Value) -> ObjectParams {
        let mut params = ObjectParams::new();
        if let Value::Object(map) = value {
            for (key, value) in map {
                params.insert(&key, value).unwrap();
            }
        }
        params
    }

    #[tokio::test]
    async fn test_call_through_module() {
        let module = server().module().unwrap();

        let created: Value = module
            .call(
                "queue.create.v1",
                params(json!({ "guild": 1, "channel": 2, "variant": "Question" })),
            )
            .await
            .unwrap();
        assert_eq!(created["size"]["total"], 0);

        let asked: Value = module
            .call(
                "question.ask.v1",
                params(json!({ "guild": 1, "channel": 2, "participant": 5, "text": "When is the exam?" })),
            )
            .await
            .unwrap();
        assert_eq!(asked["index"], 1);

        let listed: Vec<Value> = module.call("queue.list.v1", ObjectParams::new()).await.unwrap();
        assert_eq!(listed.len(), 1);

        let drained: Value = module.call("notices.drain.v1", ObjectParams::new()).await.unwrap();
        assert_eq!(drained["moves"], json!([]));
    }

    #[tokio::test]
    async fn test_presence_update_handles_leaving_members() {
        let module = server().module().unwrap();

        let joined: Value = module
            .call(
                "presence.update.v1",
                params(json!({ "updates": [
                    { "guild": 1, "participant": 5, "location": 10 },
                    { "guild": 1, "participant": 6, "location": 11 }
                ] })),
            )
            .await
            .unwrap();
        assert_eq!(joined["connected"], 2);

        let left: Value = module
            .call(
                "presence.update.v1",
                params(json!({ "updates": [{ "guild": 1, "participant": 5, "left": true }] })),
            )
            .await
            .unwrap();
        assert_eq!(left["applied"], 1);
        assert_eq!(left["connected"], 1);
    }
}
