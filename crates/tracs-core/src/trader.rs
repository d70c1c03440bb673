//! Trader directory: the authorization seam and its registry surface.

use crate::error::Result;
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// One registered trader with a time-boxed subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraderProfile {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Actor id that registered this trader, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added_by: Option<i64>,
    /// Registration time, unix milliseconds.
    pub added_at_ms: i64,
    /// Subscription end, unix milliseconds.
    pub expires_at_ms: i64,
}

impl TraderProfile {
    /// Registers a trader now, valid for `subscription_days`.
    pub fn register(id: i64, added_by: Option<i64>, subscription_days: i64) -> Self {
        let now = Utc::now().timestamp_millis();
        Self {
            id,
            username: None,
            name: None,
            added_by,
            added_at_ms: now,
            expires_at_ms: now + subscription_days * 24 * 60 * 60 * 1000,
        }
    }

    /// Whether the subscription covers the given instant.
    pub fn is_active_at(&self, now_ms: i64) -> bool {
        now_ms <= self.expires_at_ms
    }

    /// Whether the subscription covers the current instant.
    pub fn is_active(&self) -> bool {
        self.is_active_at(Utc::now().timestamp_millis())
    }
}

/// The trader registry as the workflow engine consumes it.
///
/// Authorization is the one predicate the core workflow depends on; the
/// management operations back the owner's registry commands and the
/// trader's own account view.
#[async_trait]
pub trait TraderDirectory: Send + Sync {
    /// Whether this actor may use the workflow features right now.
    ///
    /// The configured owner is always authorized; everyone else needs an
    /// unexpired registration.
    async fn is_authorized(&self, actor_id: i64) -> bool;

    /// The actor's registration, if any.
    async fn profile(&self, actor_id: i64) -> Result<Option<TraderProfile>>;

    /// Adds or replaces a registration.
    async fn upsert(&self, profile: TraderProfile) -> Result<()>;

    /// Removes a registration. Returns whether one existed.
    async fn remove(&self, actor_id: i64) -> Result<bool>;

    /// All registrations, in no particular order.
    async fn list(&self) -> Result<Vec<TraderProfile>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_sets_expiry_from_days() {
        let profile = TraderProfile::register(9, Some(1), 30);

        let expected = profile.added_at_ms + 30 * 24 * 60 * 60 * 1000;
        assert_eq!(profile.expires_at_ms, expected);
        assert!(profile.is_active());
    }

    #[test]
    fn test_is_active_at_boundary() {
        let profile = TraderProfile {
            id: 9,
            username: None,
            name: None,
            added_by: None,
            added_at_ms: 0,
            expires_at_ms: 1_000,
        };

        assert!(profile.is_active_at(1_000));
        assert!(!profile.is_active_at(1_001));
    }
}
