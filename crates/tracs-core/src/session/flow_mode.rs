//! Flow mode types for session state management.

use serde::{Deserialize, Serialize};

/// The state a conversation's workflow is currently in.
///
/// Every state other than `Idle` is entered from `Idle` via an explicit
/// menu action, consumes exactly one (valid) user input, and returns to
/// `Idle` after one terminal outcome. The only two-step flow is code
/// activation, which moves from `AwaitActivatePlayerId` to
/// `AwaitActivateCode` before terminating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FlowMode {
    /// No flow in progress; input is interpreted as a menu action.
    #[default]
    Idle,
    /// Waiting for a numeric player id to look up.
    AwaitPlayerLookupId,
    /// Waiting for a redemption code to check.
    AwaitCheckCode,
    /// Waiting for the numeric player id an activation targets.
    AwaitActivatePlayerId,
    /// Waiting for the code to redeem against the pending player.
    AwaitActivateCode,
}
