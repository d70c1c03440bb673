//! Operation log domain module.
//!
//! - `model`: record, kind, and outcome types
//! - `repository`: the persistence backend trait
//! - `store`: the query/aggregation layer over a backend

mod model;
mod repository;
mod store;

pub use model::{OperationKind, OperationOutcome, OperationRecord};
pub use repository::OperationLogRepository;
pub use store::{
    DEFAULT_PAGE_SIZE, LogPage, LogQuery, LogStats, OperationLog, RECENT_WINDOW,
};
