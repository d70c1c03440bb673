//! Application layer of TRACS.
//!
//! Composes the domain traits into the interactive workflow:
//!
//! - `WorkflowEngine` — the per-conversation state machine
//! - `SessionRegistry` — in-memory session storage, owned by the engine
//! - `LogDashboard` — summary and detail views over the operation log
//! - `messages` — every user-facing text and keyboard

pub mod messages;

mod dashboard;
mod engine;
mod session_registry;

pub use dashboard::{DetailView, LogDashboard};
pub use engine::WorkflowEngine;
pub use session_registry::SessionRegistry;
