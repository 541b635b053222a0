// Application Layer - Use Cases and Business Logic

pub(crate) mod admission;
pub mod autosave;
pub mod registry;
pub mod service;

// Re-exports
pub use autosave::{AutosaveHandle, AutosaveScheduler};
pub use registry::{
    LoadOutcome, LoadReport, QueueHandle, QueueRegistry, QueueSummary, SaveFailure, SaveReport,
};
pub use service::{QueueService, TakeNextOptions};
