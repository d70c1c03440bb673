//! Operation log repository trait.
//!
//! Defines the interface for operation record persistence.

use super::model::OperationRecord;
use crate::error::Result;
use async_trait::async_trait;

/// An abstract backend for the per-actor operation log.
///
/// Implementations must treat one `append` as their atomic unit: concurrent
/// appends from unrelated actors may interleave in time but must never
/// corrupt each other's records. No deduplication is ever performed; two
/// identical appends produce two records.
#[async_trait]
pub trait OperationLogRepository: Send + Sync {
    /// Appends one record to the actor's log.
    ///
    /// # Errors
    ///
    /// Returns [`TracsError::Storage`](crate::TracsError::Storage) when the
    /// backend cannot be reached. Callers treat this as best-effort: the
    /// failure must never abort the workflow action that triggered it.
    async fn append(&self, record: &OperationRecord) -> Result<()>;

    /// Returns up to the `limit` most recent records for the actor,
    /// ordered oldest first.
    async fn recent(&self, actor_id: i64, limit: usize) -> Result<Vec<OperationRecord>>;
}
