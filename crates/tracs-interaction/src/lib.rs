//! Outward-facing clients of TRACS.
//!
//! Currently a single concern: the HTTP client for the external
//! redemption ledger.

mod http_ledger_client;

pub use http_ledger_client::HttpLedgerClient;
