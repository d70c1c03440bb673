//! Remote ledger client trait.

use super::model::{Activation, CodeCheck, PlayerLookup};
use crate::error::Result;
use async_trait::async_trait;

/// The three operations the external redemption API offers.
///
/// Implementations perform one synchronous request/response exchange per
/// call with a fixed timeout, and normalize every transport-level failure
/// (network, timeout, non-2xx, undecodable body) into
/// [`TracsError::RemoteCall`](crate::TracsError::RemoteCall) carrying the
/// label of the call. No retries: retry policy, if any ever exists,
/// belongs to the caller.
///
/// Domain-negative answers (player not found, code invalid, activation
/// rejected) are values of the result enums, never errors.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Resolves a numeric player id to the player's identity.
    async fn lookup_player(&self, player_id: &str) -> Result<PlayerLookup>;

    /// Reports the redemption state of a code.
    async fn check_code(&self, code: &str) -> Result<CodeCheck>;

    /// Redeems a code to a player account. Irreversible on success.
    async fn activate_code(&self, player_id: &str, code: &str) -> Result<Activation>;
}
