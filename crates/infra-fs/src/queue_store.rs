// JSON File Queue Store
//
// Layout: <data_dir>/<guild>-<channel>.json
// Writes go to a uniquely named temp file in the same directory and are
// renamed into place. Leftover `*.tmp` files are ignored when listing.

use async_trait::async_trait;
use eduqueue_core::domain::{QueueIdentity, QueueSnapshot};
use eduqueue_core::error::{AppError, Result};
use eduqueue_core::port::{QueueStore, StoreEntry};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

const EXTENSION: &str = "json";
const TEMP_SUFFIX: &str = ".tmp";

/// Helper to attach the path to I/O failures
fn map_io_error(path: &Path, err: std::io::Error) -> AppError {
    match err.kind() {
        ErrorKind::PermissionDenied => {
            AppError::Persistence(format!("Permission denied: {}", path.display()))
        }
        ErrorKind::NotFound => AppError::Persistence(format!("Not found: {}", path.display())),
        _ => AppError::Persistence(format!("{}: {}", path.display(), err)),
    }
}

pub struct JsonFileQueueStore {
    data_dir: PathBuf,
}

impl JsonFileQueueStore {
    /// Store rooted at `data_dir`; the directory is created on first write
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn path_for(&self, identity: &QueueIdentity) -> PathBuf {
        self.data_dir
            .join(format!("{}.{}", identity.file_stem(), EXTENSION))
    }

    async fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.data_dir)
            .await
            .map_err(|e| map_io_error(&self.data_dir, e))
    }
}

/// Write `bytes` to a fresh temp file in `dir` and rename it over `path`;
/// the temp file is removed if anything fails
fn write_replacing(dir: &Path, prefix: &str, path: &Path, bytes: &[u8]) -> Result<()> {
    let mut tmp = tempfile::Builder::new()
        .prefix(prefix)
        .suffix(TEMP_SUFFIX)
        .tempfile_in(dir)
        .map_err(|e| map_io_error(dir, e))?;
    tmp.as_file_mut()
        .write_all(bytes)
        .and_then(|()| tmp.as_file().sync_all())
        .map_err(|e| map_io_error(path, e))?;
    tmp.persist(path).map_err(|e| map_io_error(path, e.error))?;
    Ok(())
}

#[async_trait]
impl QueueStore for JsonFileQueueStore {
    async fn save(&self, identity: &QueueIdentity, snapshot: &QueueSnapshot) -> Result<()> {
        self.ensure_dir().await?;

        let path = self.path_for(identity);
        let bytes = serde_json::to_vec_pretty(snapshot)?;
        let written = bytes.len();

        let dir = self.data_dir.clone();
        let prefix = format!(".{}.", identity.file_stem());
        let target = path.clone();
        tokio::task::spawn_blocking(move || write_replacing(&dir, &prefix, &target, &bytes))
            .await
            .map_err(|e| AppError::Internal(format!("queue write task failed: {e}")))??;

        debug!(path = %path.display(), bytes = written, "Queue file written");
        Ok(())
    }

    async fn load(&self, identity: &QueueIdentity) -> Result<Option<QueueSnapshot>> {
        let path = self.path_for(identity);
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(map_io_error(&path, e)),
        };

        let snapshot = serde_json::from_slice(&bytes).map_err(|e| {
            AppError::Persistence(format!("{}: invalid queue document: {}", path.display(), e))
        })?;
        Ok(Some(snapshot))
    }

    async fn list(&self) -> Result<Vec<StoreEntry>> {
        let mut dir = match fs::read_dir(&self.data_dir).await {
            Ok(dir) => dir,
            // nothing saved yet
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(map_io_error(&self.data_dir, e)),
        };

        let mut entries = Vec::new();
        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|e| map_io_error(&self.data_dir, e))?
        {
            let path = entry.path();
            if !entry.file_type().await.map(|t| t.is_file()).unwrap_or(false) {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.ends_with(TEMP_SUFFIX) {
                debug!(file = %name, "Skipping temp file");
                continue;
            }

            let identity = match path.extension().and_then(|ext| ext.to_str()) {
                Some(EXTENSION) => path
                    .file_stem()
                    .and_then(|stem| stem.to_str())
                    .and_then(|stem| QueueIdentity::parse_file_stem(stem).ok()),
                _ => None,
            };
            if identity.is_none() {
                warn!(file = %name, "File in queue directory does not name a queue");
            }

            entries.push(StoreEntry { name, identity });
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}
