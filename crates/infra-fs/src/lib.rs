// EduQueue Infrastructure - File Store Adapter
// Implements: QueueStore (one JSON document per queue identity)

mod queue_store;

pub use queue_store::JsonFileQueueStore;

// Note: std::io::Error converts into AppError::Io directly; paths are
// attached by the map_io_error helper for readable reports
