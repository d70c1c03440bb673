//! The operation log store.
//!
//! Wraps a persistence backend with the read semantics the dashboard
//! needs: a bounded most-recent window, per-kind counts computed before
//! filtering, newest-first ordering, and clamped pagination.

use super::model::{OperationKind, OperationRecord};
use super::repository::OperationLogRepository;
use crate::error::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::sync::Arc;

/// How many most-recent records a query reads and aggregates over.
pub const RECENT_WINDOW: usize = 500;

/// Page size used when a query does not specify one.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Parameters of a log query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogQuery {
    /// Restrict items to one kind (inline variants fold into their base).
    pub kind: Option<OperationKind>,
    /// 1-based page number; clamped to the valid range, never an error.
    pub page: usize,
    pub page_size: usize,
}

impl Default for LogQuery {
    fn default() -> Self {
        Self {
            kind: None,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl LogQuery {
    /// A query for one page of one kind.
    pub fn for_kind(kind: OperationKind, page: usize) -> Self {
        Self {
            kind: Some(kind),
            page,
            ..Self::default()
        }
    }
}

/// Per-kind counts over the unfiltered query window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LogStats {
    pub player: usize,
    pub check: usize,
    pub activate: usize,
    pub total: usize,
}

impl LogStats {
    fn tally(records: &[OperationRecord]) -> Self {
        let mut stats = Self::default();
        for record in records {
            match record.kind.base() {
                OperationKind::Player => stats.player += 1,
                OperationKind::Check => stats.check += 1,
                OperationKind::Activate => stats.activate += 1,
                // base() never returns an inline variant
                _ => {}
            }
            stats.total += 1;
        }
        stats
    }
}

/// One page of query results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogPage {
    /// Records of the requested page, newest first.
    pub items: Vec<OperationRecord>,
    /// The page actually returned after clamping.
    pub page: usize,
    /// At least 1, even for an empty log.
    pub total_pages: usize,
    /// Counts over the unfiltered window, independent of the kind filter.
    pub stats: LogStats,
}

/// The operation log store.
///
/// Appends assign a creation timestamp when the caller left it unset;
/// everything else about a record is stored verbatim and never touched
/// again.
#[derive(Clone)]
pub struct OperationLog {
    repository: Arc<dyn OperationLogRepository>,
}

impl OperationLog {
    pub fn new(repository: Arc<dyn OperationLogRepository>) -> Self {
        Self { repository }
    }

    /// Appends one record, stamping `at_ms` with the current time if the
    /// caller did not supply one.
    ///
    /// # Errors
    ///
    /// Propagates the backend's `Storage` error; callers log and continue.
    pub async fn append(&self, mut record: OperationRecord) -> Result<()> {
        if record.at_ms.is_none() {
            record.at_ms = Some(Utc::now().timestamp_millis());
        }
        self.repository.append(&record).await
    }

    /// Returns one page of the actor's records.
    ///
    /// Reads the most-recent [`RECENT_WINDOW`] records, computes `stats`
    /// over that window *before* filtering, then applies the kind filter,
    /// orders newest first, and paginates. An out-of-range page returns
    /// the nearest valid page.
    pub async fn query(&self, actor_id: i64, query: LogQuery) -> Result<LogPage> {
        let mut window = self.repository.recent(actor_id, RECENT_WINDOW).await?;

        let stats = LogStats::tally(&window);

        // Newest first. The backend returns records in append order, but a
        // caller-supplied timestamp may be older than its neighbors.
        window.sort_by_key(|record| Reverse(record.at_ms.unwrap_or(0)));

        let filtered: Vec<OperationRecord> = match query.kind {
            Some(kind) => window
                .into_iter()
                .filter(|record| record.kind.base() == kind.base())
                .collect(),
            None => window,
        };

        let page_size = query.page_size.max(1);
        let total_pages = filtered.len().div_ceil(page_size).max(1);
        let page = query.page.clamp(1, total_pages);

        let items = filtered
            .into_iter()
            .skip((page - 1) * page_size)
            .take(page_size)
            .collect();

        Ok(LogPage {
            items,
            page,
            total_pages,
            stats,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oplog::model::OperationOutcome;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Append-order in-memory backend for store tests.
    #[derive(Default)]
    struct VecRepository {
        records: Mutex<Vec<OperationRecord>>,
    }

    #[async_trait]
    impl OperationLogRepository for VecRepository {
        async fn append(&self, record: &OperationRecord) -> Result<()> {
            self.records.lock().unwrap().push(record.clone());
            Ok(())
        }

        async fn recent(&self, actor_id: i64, limit: usize) -> Result<Vec<OperationRecord>> {
            let records = self.records.lock().unwrap();
            let matching: Vec<OperationRecord> = records
                .iter()
                .filter(|r| r.actor_id == actor_id)
                .cloned()
                .collect();
            let skip = matching.len().saturating_sub(limit);
            Ok(matching.into_iter().skip(skip).collect())
        }
    }

    fn store() -> (OperationLog, Arc<VecRepository>) {
        let repository = Arc::new(VecRepository::default());
        (OperationLog::new(repository.clone()), repository)
    }

    fn record_at(actor_id: i64, kind: OperationKind, at_ms: i64) -> OperationRecord {
        let mut record = OperationRecord::new(actor_id, kind, OperationOutcome::Success);
        record.at_ms = Some(at_ms);
        record
    }

    #[tokio::test]
    async fn test_append_assigns_timestamp_when_unset() {
        let (log, repository) = store();

        log.append(OperationRecord::new(
            1,
            OperationKind::Player,
            OperationOutcome::Success,
        ))
        .await
        .unwrap();

        let records = repository.records.lock().unwrap();
        assert!(records[0].at_ms.is_some());
    }

    #[tokio::test]
    async fn test_append_keeps_supplied_timestamp() {
        let (log, repository) = store();

        log.append(record_at(1, OperationKind::Check, 42)).await.unwrap();

        let records = repository.records.lock().unwrap();
        assert_eq!(records[0].at_ms, Some(42));
    }

    #[tokio::test]
    async fn test_query_pages_newest_first() {
        let (log, _) = store();
        for i in 0..25 {
            log.append(record_at(1, OperationKind::Player, 1_000 + i))
                .await
                .unwrap();
        }

        let page = log
            .query(
                1,
                LogQuery {
                    page: 2,
                    ..LogQuery::default()
                },
            )
            .await
            .unwrap();

        // Page 2 of 25 newest-first records holds items 11..=20:
        // timestamps 1014 down to 1005.
        assert_eq!(page.page, 2);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.items.len(), 10);
        assert_eq!(page.items[0].at_ms, Some(1_014));
        assert_eq!(page.items[9].at_ms, Some(1_005));
    }

    #[tokio::test]
    async fn test_query_clamps_out_of_range_page() {
        let (log, _) = store();
        for i in 0..15 {
            log.append(record_at(1, OperationKind::Check, i)).await.unwrap();
        }

        let page = log
            .query(
                1,
                LogQuery {
                    page: 99,
                    ..LogQuery::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(page.page, 2);
        assert_eq!(page.items.len(), 5);

        let page = log
            .query(
                1,
                LogQuery {
                    page: 0,
                    ..LogQuery::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(page.page, 1);
    }

    #[tokio::test]
    async fn test_query_on_empty_log() {
        let (log, _) = store();

        let page = log.query(1, LogQuery::default()).await.unwrap();

        assert!(page.items.is_empty());
        assert_eq!(page.page, 1);
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.stats, LogStats::default());
    }

    #[tokio::test]
    async fn test_stats_ignore_kind_filter() {
        let (log, _) = store();
        for i in 0..4 {
            log.append(record_at(1, OperationKind::Player, i)).await.unwrap();
        }
        for i in 4..7 {
            log.append(record_at(1, OperationKind::Check, i)).await.unwrap();
        }
        log.append(record_at(1, OperationKind::Activate, 7)).await.unwrap();
        // Inline records fold into their base kind.
        log.append(record_at(1, OperationKind::PlayerInline, 8))
            .await
            .unwrap();

        let unfiltered = log.query(1, LogQuery::default()).await.unwrap();
        let filtered = log
            .query(1, LogQuery::for_kind(OperationKind::Activate, 1))
            .await
            .unwrap();

        assert_eq!(unfiltered.stats, filtered.stats);
        assert_eq!(filtered.stats.player, 5);
        assert_eq!(filtered.stats.check, 3);
        assert_eq!(filtered.stats.activate, 1);
        assert_eq!(filtered.stats.total, 9);
        assert_eq!(filtered.items.len(), 1);
    }

    #[tokio::test]
    async fn test_kind_filter_folds_inline_records() {
        let (log, _) = store();
        log.append(record_at(1, OperationKind::Player, 1)).await.unwrap();
        log.append(record_at(1, OperationKind::PlayerInline, 2))
            .await
            .unwrap();

        let page = log
            .query(1, LogQuery::for_kind(OperationKind::Player, 1))
            .await
            .unwrap();

        assert_eq!(page.items.len(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_appends_are_not_merged() {
        let (log, _) = store();
        let record = record_at(1, OperationKind::Activate, 5);

        log.append(record.clone()).await.unwrap();
        log.append(record).await.unwrap();

        let page = log.query(1, LogQuery::default()).await.unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0], page.items[1]);
    }

    #[tokio::test]
    async fn test_query_separates_actors() {
        let (log, _) = store();
        log.append(record_at(1, OperationKind::Player, 1)).await.unwrap();
        log.append(record_at(2, OperationKind::Player, 2)).await.unwrap();

        let page = log.query(1, LogQuery::default()).await.unwrap();

        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].actor_id, 1);
    }
}
