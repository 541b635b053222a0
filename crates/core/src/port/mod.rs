// Port Layer - Interfaces for external dependencies

pub mod id_provider; // For deterministic testing
pub mod notifier;
pub mod queue_store;
pub mod time_provider;
pub mod voice;

// Re-exports
pub use id_provider::{IdProvider, UuidProvider};
pub use notifier::{Notifier, NotifyError};
pub use queue_store::{QueueStore, StoreEntry};
pub use time_provider::{SystemTimeProvider, TimeProvider};
pub use voice::{VoiceCapability, VoiceError};
