//! Operation record domain model.
//!
//! One record is appended per completed or attempted remote action,
//! including calls that errored before producing a domain result. Records
//! are immutable once appended and ordered by their timestamp.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// What kind of remote action a record describes.
///
/// The `*Inline` variants mark actions issued from the non-conversational
/// query channel; for counting and filtering they fold into their base
/// kind.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OperationKind {
    Player,
    Check,
    Activate,
    PlayerInline,
    CheckInline,
}

impl OperationKind {
    /// The base kind, with transport-origin markers stripped.
    pub fn base(self) -> OperationKind {
        match self {
            Self::PlayerInline => Self::Player,
            Self::CheckInline => Self::Check,
            other => other,
        }
    }
}

/// How the recorded action ended.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OperationOutcome {
    /// The action did what the trader asked.
    Success,
    /// Lookup resolved to no player.
    NotFound,
    /// Check: the code is already redeemed.
    Activated,
    /// Check: the code is still redeemable.
    Unactivated,
    /// The API answered with a negative or unusable domain result.
    Failed,
    /// The remote call itself failed (timeout, network, non-2xx).
    Error,
    /// Activation aborted: the pre-activation check call failed.
    CheckError,
    /// Activation aborted: the code was already redeemed.
    AlreadyActivated,
    /// Activation aborted: the code was not in a redeemable state.
    InvalidBeforeActivate,
}

/// Immutable audit entry for one lookup/check/activate attempt.
///
/// Created exclusively by the workflow engine at the conclusion of each
/// remote call. `at_ms` is assigned at append time when the caller leaves
/// it unset. Never mutated or deleted; trimming is a backend policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationRecord {
    pub actor_id: i64,
    pub kind: OperationKind,
    pub outcome: OperationOutcome,
    /// Unix milliseconds; `None` until assigned by the store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub at_ms: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
    /// Player id a checked code was previously redeemed to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activated_to: Option<String>,
    /// Prior redemption time in unix milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activated_at_ms: Option<i64>,
}

impl OperationRecord {
    /// Creates a record with only the mandatory fields set.
    pub fn new(actor_id: i64, kind: OperationKind, outcome: OperationOutcome) -> Self {
        Self {
            actor_id,
            kind,
            outcome,
            at_ms: None,
            player_id: None,
            player_name: None,
            code: None,
            amount: None,
            activated_to: None,
            activated_at_ms: None,
        }
    }

    /// Attaches the player this action concerned.
    pub fn with_player(
        mut self,
        player_id: impl Into<String>,
        player_name: Option<String>,
    ) -> Self {
        self.player_id = Some(player_id.into());
        self.player_name = player_name;
        self
    }

    /// Attaches the code this action concerned.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Attaches the code's amount, when the API reported one.
    pub fn with_amount(mut self, amount: Option<String>) -> Self {
        self.amount = amount;
        self
    }

    /// Attaches the prior redemption target and time of a checked code.
    pub fn with_prior_activation(
        mut self,
        activated_to: Option<String>,
        activated_at_ms: Option<i64>,
    ) -> Self {
        self.activated_to = activated_to;
        self.activated_at_ms = activated_at_ms;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_base_folds_inline_variants() {
        assert_eq!(OperationKind::PlayerInline.base(), OperationKind::Player);
        assert_eq!(OperationKind::CheckInline.base(), OperationKind::Check);
        assert_eq!(OperationKind::Activate.base(), OperationKind::Activate);
    }

    #[test]
    fn test_kind_round_trips_through_strings() {
        assert_eq!(OperationKind::Activate.to_string(), "activate");
        assert_eq!(
            "player".parse::<OperationKind>().unwrap(),
            OperationKind::Player
        );
        assert!("bogus".parse::<OperationKind>().is_err());
    }

    #[test]
    fn test_record_serializes_without_unset_fields() {
        let record = OperationRecord::new(
            7,
            OperationKind::Check,
            OperationOutcome::Unactivated,
        )
        .with_code("ABC123");

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["kind"], "check");
        assert_eq!(json["outcome"], "unactivated");
        assert_eq!(json["code"], "ABC123");
        assert!(json.get("player_id").is_none());
        assert!(json.get("at_ms").is_none());
    }
}
