//! JSONL-backed OperationLogRepository implementation.
//!
//! One append-only file per actor under a base directory:
//!
//! ```text
//! base_dir/
//! ├── 5398770941.jsonl
//! └── 111222333.jsonl
//! ```
//!
//! Each record is one serialized JSON line; the single line write is the
//! store's atomic unit, so appends for unrelated actors never corrupt
//! each other. Unreadable lines (partial writes, hand edits) are skipped
//! with a warning instead of poisoning the whole log.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracs_core::error::{Result, TracsError};
use tracs_core::oplog::{OperationLogRepository, OperationRecord};

pub struct JsonlOperationLogRepository {
    base_dir: PathBuf,
}

impl JsonlOperationLogRepository {
    /// Creates a repository rooted at `base_dir`, creating the directory
    /// if needed.
    pub async fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir)
            .await
            .map_err(|e| TracsError::storage(format!("create {}: {}", base_dir.display(), e)))?;
        Ok(Self { base_dir })
    }

    fn actor_file(&self, actor_id: i64) -> PathBuf {
        self.base_dir.join(format!("{actor_id}.jsonl"))
    }
}

#[async_trait]
impl OperationLogRepository for JsonlOperationLogRepository {
    async fn append(&self, record: &OperationRecord) -> Result<()> {
        let path = self.actor_file(record.actor_id);
        let mut line = serde_json::to_string(record)
            .map_err(|e| TracsError::storage(format!("encode record: {}", e)))?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| TracsError::storage(format!("open {}: {}", path.display(), e)))?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| TracsError::storage(format!("append {}: {}", path.display(), e)))?;
        file.flush()
            .await
            .map_err(|e| TracsError::storage(format!("flush {}: {}", path.display(), e)))?;

        Ok(())
    }

    async fn recent(&self, actor_id: i64, limit: usize) -> Result<Vec<OperationRecord>> {
        let path = self.actor_file(actor_id);

        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(TracsError::storage(format!(
                    "read {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        let mut records = Vec::new();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<OperationRecord>(line) {
                Ok(record) => records.push(record),
                Err(e) => {
                    tracing::warn!(
                        "Skipping unreadable log line in {}: {}",
                        path.display(),
                        e
                    );
                }
            }
        }

        let skip = records.len().saturating_sub(limit);
        Ok(records.into_iter().skip(skip).collect())
    }
}
