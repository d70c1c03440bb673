//! Typed results of the three remote ledger calls.
//!
//! The external API answers with loosely shaped JSON envelopes; clients
//! normalize those into these closed variants so the workflow engine can
//! branch exhaustively instead of matching on status strings.

use serde::{Deserialize, Serialize};

/// Outcome of a player lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerLookup {
    /// The player exists.
    Found {
        player_id: String,
        player_name: String,
    },
    /// The id resolved to nothing (domain-negative, not an error).
    NotFound,
}

/// Outcome of a code status check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CodeCheck {
    /// The code has already been redeemed.
    Activated {
        code: String,
        amount: Option<String>,
        /// Player id the code was redeemed to, when the API reports it.
        activated_to: Option<String>,
        /// Redemption time in unix milliseconds, when the API reports it.
        activated_at_ms: Option<i64>,
    },
    /// The code exists and is still redeemable.
    Unactivated {
        code: String,
        amount: Option<String>,
    },
    /// Anything else: unknown, malformed, expired, revoked. The engine
    /// never activates a code in this state.
    Invalid { code: String },
}

impl CodeCheck {
    /// The code string echoed by (or sent to) the API.
    pub fn code(&self) -> &str {
        match self {
            Self::Activated { code, .. } => code,
            Self::Unactivated { code, .. } => code,
            Self::Invalid { code } => code,
        }
    }
}

/// Outcome of an activation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Activation {
    /// The ledger accepted the redemption.
    Accepted,
    /// The ledger refused it (domain-negative, not a transport error).
    Rejected,
}
