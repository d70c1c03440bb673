//! In-memory OperationLogRepository implementation.
//!
//! Backs tests and ephemeral runs where nothing should touch the disk.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use tracs_core::error::Result;
use tracs_core::oplog::{OperationLogRepository, OperationRecord};

#[derive(Default)]
pub struct MemoryOperationLogRepository {
    records: Mutex<HashMap<i64, Vec<OperationRecord>>>,
}

impl MemoryOperationLogRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OperationLogRepository for MemoryOperationLogRepository {
    async fn append(&self, record: &OperationRecord) -> Result<()> {
        self.records
            .lock()
            .expect("oplog mutex poisoned")
            .entry(record.actor_id)
            .or_default()
            .push(record.clone());
        Ok(())
    }

    async fn recent(&self, actor_id: i64, limit: usize) -> Result<Vec<OperationRecord>> {
        let records = self.records.lock().expect("oplog mutex poisoned");
        let actor_records = records.get(&actor_id).map(Vec::as_slice).unwrap_or(&[]);
        let skip = actor_records.len().saturating_sub(limit);
        Ok(actor_records[skip..].to_vec())
    }
}
