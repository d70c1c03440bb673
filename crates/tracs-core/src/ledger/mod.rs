//! Remote ledger domain module.
//!
//! - `model`: closed result variants for the three remote calls
//! - `client`: the `LedgerClient` trait implementations plug into

mod client;
mod model;

pub use client::LedgerClient;
pub use model::{Activation, CodeCheck, PlayerLookup};
