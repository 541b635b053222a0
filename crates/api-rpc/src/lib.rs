// EduQueue API - JSON-RPC command surface
// Exposes QueueService operations plus the chat bridge methods (presence in,
// notices and voice moves out).

pub mod error;
pub mod handler;
pub mod server;
pub mod types;

pub use server::{RpcServer, RpcServerConfig};
