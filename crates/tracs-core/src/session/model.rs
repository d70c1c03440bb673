//! Session domain model.
//!
//! A session is the per-conversation mutable state the workflow engine
//! reads and rewrites on every update. It lives only as long as the
//! process and the conversation; nothing here is persisted.

use super::flow_mode::FlowMode;
use serde::{Deserialize, Serialize};

/// Scratch data carried between the two steps of the activation flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingActivation {
    /// The player id the trader entered (kept as the digits they typed).
    pub player_id: String,
    /// Display name resolved by the best-effort lookup, if it succeeded.
    pub player_name: Option<String>,
}

/// Per-conversation workflow state.
///
/// Created lazily on first access to a conversation id and reset to
/// `Idle` after every terminal workflow action and on explicit restart.
/// Owned and mutated exclusively by the workflow engine; the session
/// registry only stores it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Session {
    /// Current flow state.
    pub mode: FlowMode,
    /// Activation scratch; only meaningful in `AwaitActivateCode`.
    pub pending: Option<PendingActivation>,
}

impl Session {
    /// Returns a fresh idle session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enters a flow state, clearing any stale scratch data.
    pub fn enter(&mut self, mode: FlowMode) {
        self.mode = mode;
        self.pending = None;
    }

    /// Resets the session to idle.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
