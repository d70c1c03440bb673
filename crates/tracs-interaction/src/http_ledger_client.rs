//! HttpLedgerClient - REST implementation of the remote ledger.
//!
//! Talks to the external redemption API over three JSON POST endpoints
//! with a static key header. Every transport-level failure is normalized
//! into a single `RemoteCall` error carrying the label of the call; the
//! loosely shaped response envelopes are decoded into the closed result
//! variants the workflow engine branches on.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use tracs_core::error::{Result, TracsError};
use tracs_core::ledger::{Activation, CodeCheck, LedgerClient, PlayerLookup};

/// Per-request timeout. A slow ledger surfaces as a `RemoteCall` error,
/// never as a hung conversation.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Client for the external redemption API.
#[derive(Clone)]
pub struct HttpLedgerClient {
    client: Client,
    base_url: String,
    api_key: String,
}

/// Common `{success, data}` envelope of the ledger endpoints.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    success: bool,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct PlayerPayload {
    status: Option<String>,
    player_id: Option<Value>,
    player_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CodePayload {
    status: Option<String>,
    amount: Option<Value>,
    activated_to: Option<Value>,
    activated_at: Option<i64>,
    uc_code: Option<String>,
}

/// The activate endpoint reports only top-level acceptance.
#[derive(Debug, Deserialize)]
struct ActivateEnvelope {
    #[serde(default)]
    success: bool,
}

/// Renders a JSON scalar the way the API mixes them (ids and amounts
/// arrive as numbers or strings depending on the backend version).
fn scalar_to_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn map_player(envelope: Envelope<PlayerPayload>) -> PlayerLookup {
    match envelope.data {
        Some(data) if envelope.success && data.status.as_deref() == Some("success") => {
            let player_id = data.player_id.and_then(scalar_to_string);
            match (player_id, data.player_name) {
                (Some(player_id), Some(player_name)) => PlayerLookup::Found {
                    player_id,
                    player_name,
                },
                _ => PlayerLookup::NotFound,
            }
        }
        _ => PlayerLookup::NotFound,
    }
}

fn map_check(envelope: Envelope<CodePayload>, requested_code: &str) -> Result<CodeCheck> {
    let data = match envelope.data {
        Some(data) if envelope.success => data,
        // No usable payload: the call "succeeded" at the HTTP level but
        // answered nothing the workflow can branch on.
        _ => {
            return Err(TracsError::remote_call(
                "checkCode",
                "response carried no usable data",
            ));
        }
    };

    let code = data.uc_code.unwrap_or_else(|| requested_code.to_string());
    let amount = data.amount.and_then(scalar_to_string);
    let status = data.status.as_deref().map(str::to_ascii_lowercase);

    Ok(match status.as_deref() {
        Some("activated") => CodeCheck::Activated {
            code,
            amount,
            activated_to: data.activated_to.and_then(scalar_to_string),
            activated_at_ms: data.activated_at,
        },
        Some("unactivated") => CodeCheck::Unactivated { code, amount },
        _ => CodeCheck::Invalid { code },
    })
}

impl HttpLedgerClient {
    /// Creates a client for the given API base URL and key.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: Client::new(),
            base_url,
            api_key: api_key.into(),
        }
    }

    async fn post<T>(&self, endpoint: &str, call: &'static str, body: Value) -> Result<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        let url = format!("{}{}", self.base_url, endpoint);
        tracing::debug!(target: "ledger", %url, %body, "{} request", call);

        let response = self
            .client
            .post(&url)
            .header("X-Api-Key", &self.api_key)
            .header("Accept", "application/json")
            .json(&body)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| TracsError::remote_call(call, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(TracsError::remote_call(
                call,
                format!("status {}: {}", status, error_text),
            ));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| TracsError::remote_call(call, format!("undecodable body: {}", e)))
    }

    /// Player ids travel as JSON numbers on the wire.
    fn numeric_id(player_id: &str, call: &'static str) -> Result<i64> {
        player_id
            .trim()
            .parse::<i64>()
            .map_err(|_| TracsError::remote_call(call, format!("non-numeric id '{player_id}'")))
    }
}

#[async_trait]
impl LedgerClient for HttpLedgerClient {
    async fn lookup_player(&self, player_id: &str) -> Result<PlayerLookup> {
        let id = Self::numeric_id(player_id, "getPlayer")?;
        let envelope: Envelope<PlayerPayload> = self
            .post("/getPlayer", "getPlayer", json!({ "player_id": id }))
            .await?;
        Ok(map_player(envelope))
    }

    async fn check_code(&self, code: &str) -> Result<CodeCheck> {
        let envelope: Envelope<CodePayload> = self
            .post(
                "/checkCode",
                "checkCode",
                json!({ "uc_code": code, "show_time": true }),
            )
            .await?;
        map_check(envelope, code)
    }

    async fn activate_code(&self, player_id: &str, code: &str) -> Result<Activation> {
        let id = Self::numeric_id(player_id, "activate")?;
        let envelope: ActivateEnvelope = self
            .post(
                "/activate",
                "activate",
                json!({ "player_id": id, "uc_code": code }),
            )
            .await?;
        Ok(if envelope.success {
            Activation::Accepted
        } else {
            Activation::Rejected
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player_envelope(json: Value) -> Envelope<PlayerPayload> {
        serde_json::from_value(json).unwrap()
    }

    fn code_envelope(json: Value) -> Envelope<CodePayload> {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_map_player_found() {
        let envelope = player_envelope(json!({
            "success": true,
            "data": { "status": "success", "player_id": 5398770941i64, "player_name": "Alice" }
        }));

        assert_eq!(
            map_player(envelope),
            PlayerLookup::Found {
                player_id: "5398770941".to_string(),
                player_name: "Alice".to_string(),
            }
        );
    }

    #[test]
    fn test_map_player_not_found_on_failed_envelope() {
        let envelope = player_envelope(json!({ "success": false }));
        assert_eq!(map_player(envelope), PlayerLookup::NotFound);

        let envelope = player_envelope(json!({
            "success": true,
            "data": { "status": "not_found" }
        }));
        assert_eq!(map_player(envelope), PlayerLookup::NotFound);
    }

    #[test]
    fn test_map_check_activated() {
        let envelope = code_envelope(json!({
            "success": true,
            "data": {
                "status": "Activated",
                "amount": 660,
                "activated_to": 111222333,
                "activated_at": 1714000000000i64,
                "uc_code": "ABCDEF123456"
            }
        }));

        let check = map_check(envelope, "ABCDEF123456").unwrap();
        assert_eq!(
            check,
            CodeCheck::Activated {
                code: "ABCDEF123456".to_string(),
                amount: Some("660".to_string()),
                activated_to: Some("111222333".to_string()),
                activated_at_ms: Some(1714000000000),
            }
        );
    }

    #[test]
    fn test_map_check_unactivated_falls_back_to_requested_code() {
        let envelope = code_envelope(json!({
            "success": true,
            "data": { "status": "unactivated", "amount": "325" }
        }));

        let check = map_check(envelope, "XYZ987").unwrap();
        assert_eq!(
            check,
            CodeCheck::Unactivated {
                code: "XYZ987".to_string(),
                amount: Some("325".to_string()),
            }
        );
    }

    #[test]
    fn test_map_check_unknown_status_is_invalid() {
        let envelope = code_envelope(json!({
            "success": true,
            "data": { "status": "revoked", "uc_code": "DEAD00" }
        }));

        assert_eq!(
            map_check(envelope, "DEAD00").unwrap(),
            CodeCheck::Invalid {
                code: "DEAD00".to_string()
            }
        );
    }

    #[test]
    fn test_map_check_unusable_envelope_is_remote_error() {
        let envelope = code_envelope(json!({ "success": false }));

        let err = map_check(envelope, "ABC").unwrap_err();
        assert!(err.is_remote_call());
    }

    #[test]
    fn test_numeric_id_rejects_garbage() {
        assert!(HttpLedgerClient::numeric_id("12345", "getPlayer").is_ok());
        assert!(HttpLedgerClient::numeric_id("12a45", "getPlayer").is_err());
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client = HttpLedgerClient::new("https://ledger.example/api/v1/", "key");
        assert_eq!(client.base_url, "https://ledger.example/api/v1");
    }
}
