// Queue persistence port
// reason: async-trait 필요 (dyn 호환 async port)
use crate::domain::{QueueIdentity, QueueSnapshot};
use crate::error::Result;
use async_trait::async_trait;

/// One stored document, as found by `list`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreEntry {
    /// Storage name (file name) for reporting
    pub name: String,
    /// None when the name does not encode a queue identity
    pub identity: Option<QueueIdentity>,
}

/// Stable storage of queue snapshots keyed by identity
#[async_trait]
pub trait QueueStore: Send + Sync {
    /// Persist one snapshot, replacing any previous one atomically
    async fn save(&self, identity: &QueueIdentity, snapshot: &QueueSnapshot) -> Result<()>;

    /// Read one snapshot; Ok(None) when nothing is stored for `identity`
    async fn load(&self, identity: &QueueIdentity) -> Result<Option<QueueSnapshot>>;

    /// Every stored document, including ones with unusable names
    async fn list(&self) -> Result<Vec<StoreEntry>>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::error::AppError;
    use std::collections::{BTreeMap, HashSet};
    use std::sync::Mutex;

    /// In-memory store; saves for selected identities can be made to fail
    #[derive(Default)]
    pub struct InMemoryQueueStore {
        documents: Mutex<BTreeMap<QueueIdentity, QueueSnapshot>>,
        stray_names: Mutex<Vec<String>>,
        failing: Mutex<HashSet<QueueIdentity>>,
    }

    impl InMemoryQueueStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn insert(&self, identity: QueueIdentity, snapshot: QueueSnapshot) {
            self.documents.lock().unwrap().insert(identity, snapshot);
        }

        /// Simulate a file whose name is not `<guild>-<channel>`
        pub fn insert_stray(&self, name: &str) {
            self.stray_names.lock().unwrap().push(name.to_string());
        }

        pub fn fail_saves_for(&self, identity: QueueIdentity) {
            self.failing.lock().unwrap().insert(identity);
        }

        pub fn get(&self, identity: &QueueIdentity) -> Option<QueueSnapshot> {
            self.documents.lock().unwrap().get(identity).cloned()
        }

        pub fn len(&self) -> usize {
            self.documents.lock().unwrap().len()
        }

        pub fn is_empty(&self) -> bool {
            self.len() == 0
        }
    }

    #[async_trait]
    impl QueueStore for InMemoryQueueStore {
        async fn save(&self, identity: &QueueIdentity, snapshot: &QueueSnapshot) -> Result<()> {
            if self.failing.lock().unwrap().contains(identity) {
                return Err(AppError::Persistence(format!("{}: disk full", identity.file_stem())));
            }
            self.documents
                .lock()
                .unwrap()
                .insert(*identity, snapshot.clone());
            Ok(())
        }

        async fn load(&self, identity: &QueueIdentity) -> Result<Option<QueueSnapshot>> {
            Ok(self.get(identity))
        }

        async fn list(&self) -> Result<Vec<StoreEntry>> {
            let mut entries: Vec<StoreEntry> = self
                .documents
                .lock()
                .unwrap()
                .keys()
                .map(|identity| StoreEntry {
                    name: format!("{}.json", identity.file_stem()),
                    identity: Some(*identity),
                })
                .collect();
            entries.extend(self.stray_names.lock().unwrap().iter().map(|name| StoreEntry {
                name: name.clone(),
                identity: None,
            }));
            Ok(entries)
        }
    }
}
