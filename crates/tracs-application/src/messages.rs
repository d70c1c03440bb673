//! User-facing texts and keyboards.
//!
//! Everything the trader reads lives here so the engine stays about
//! control flow. Timestamps arrive as unix values that are sometimes
//! seconds and sometimes milliseconds depending on the ledger backend
//! version; `format_unix` normalizes before rendering.

use chrono::{DateTime, Utc};
use tracs_core::trader::TraderProfile;
use tracs_core::transport::Keyboard;

pub const BTN_PLAYER_LOOKUP: &str = "🎮 Player lookup";
pub const BTN_CHECK_CODE: &str = "🧪 Check code";
pub const BTN_ACTIVATE_CODE: &str = "⚡ Activate code";
pub const BTN_MY_LOG: &str = "📒 My log";
pub const BTN_MY_ACCOUNT: &str = "👤 My account";
pub const BTN_SUBSCRIPTION: &str = "💳 Subscription";

pub const CHOOSE_ACTION: &str = "Choose an action from the menu:";

pub const PROMPT_LOOKUP_ID: &str = "Send the player ID now (digits only) to show the name.";
pub const PROMPT_CHECK_CODE: &str =
    "Send the code to check now (paste it in full, without extra spaces).";
pub const PROMPT_ACTIVATE_ID: &str =
    "Send the ID of the player you want to activate a code for (digits only).";
pub const PROMPT_ACTIVATE_CODE: &str = "Now send the code to activate for this player.";

pub const INVALID_ID: &str = "⚠️ Invalid ID.\nSend digits only, without spaces.";

pub const WORKING_LOOKUP: &str = "⏳ Looking up the player ...";
pub const WORKING_CHECK: &str = "⏳ Checking the code ...";
pub const WORKING_PRECHECK: &str = "⏳ Verifying the code state before activation ...";
pub const WORKING_ACTIVATE: &str = "⏳ Activating the code ...";

pub const PLAYER_NOT_FOUND: &str =
    "⚠️ Player not found.\nCheck the ID and try again.";
pub const LOOKUP_FAILED: &str =
    "❌ Something went wrong while looking up the player. Try again later.";
pub const CHECK_FAILED: &str =
    "❌ The code could not be checked right now. Try again later.";
pub const PRECHECK_FAILED: &str =
    "❌ The code could not be verified before activation. Try again later.";
pub const ACTIVATE_ERROR: &str =
    "❌ Something went wrong while activating the code. Try again later.";

pub const NOT_A_TRADER_FEATURE: &str =
    "⚠️ This bot is for registered traders only.\n\nYou cannot use this feature without a trader subscription.";
pub const OWNER_ONLY: &str = "❌ This command is for the bot owner only.";
pub const NO_RECORDS_YET: &str = "No operations recorded for this account yet.";
pub const LOG_SUMMARY_FAILED: &str =
    "❌ Could not fetch your log summary. Try again later.";

pub const ADD_TRADER_USAGE: &str = "⚠️ Usage: /add_trader 123456789";
pub const REMOVE_TRADER_USAGE: &str = "⚠️ Usage: /remove_trader 123456789";
pub const TRADER_NOT_REGISTERED: &str = "ℹ️ This ID is not in the trader registry.";
pub const REGISTRY_WRITE_FAILED: &str =
    "❌ Could not update the trader registry. Try again later.";
pub const REGISTRY_READ_FAILED: &str =
    "❌ Could not read the trader registry. Try again later.";

/// The persistent main menu.
pub fn main_menu() -> Keyboard {
    Keyboard::Reply {
        rows: vec![
            vec![BTN_PLAYER_LOOKUP.to_string(), BTN_CHECK_CODE.to_string()],
            vec![BTN_ACTIVATE_CODE.to_string(), BTN_MY_LOG.to_string()],
            vec![BTN_MY_ACCOUNT.to_string(), BTN_SUBSCRIPTION.to_string()],
        ],
    }
}

pub fn welcome() -> String {
    [
        "Welcome to the trader console 💳",
        "",
        "From here you can:",
        "• Look up a player's name by ID.",
        "• Check redemption codes and their state.",
        "• Activate codes on customer accounts.",
        "• Review your own operation log.",
        "",
        "Pick an action from the buttons below.",
    ]
    .join("\n")
}

pub fn subscription_text() -> String {
    [
        "💳 Trader subscription details:",
        "",
        "• 49 / month — one trader seat",
        "  Includes:",
        "  – Player lookups by ID",
        "  – Code state checks",
        "  – Code activation on customer accounts",
        "  – Your own operation log, inside the bot",
        "",
        "To subscribe or ask questions, contact the bot owner.",
    ]
    .join("\n")
}

pub fn subscription_pitch() -> String {
    format!("{NOT_A_TRADER_FEATURE}\n\n{}", subscription_text())
}

pub fn player_card(player_id: &str, player_name: &str) -> String {
    format!("👤 Player details:\n• ID: {player_id}\n• Name: {player_name}")
}

pub fn check_activated(
    code: &str,
    amount: Option<&str>,
    activated_to: Option<&str>,
    activated_at_ms: Option<i64>,
) -> String {
    format!(
        "✅ Code is activated\n• Code: {code}\n• Amount: {}\n• Activated for ID: {}\n• Activated at: {}\n• Checked at: {}",
        amount.unwrap_or("-"),
        activated_to.unwrap_or("-"),
        format_unix(activated_at_ms),
        now_string(),
    )
}

pub fn check_unactivated(code: &str, amount: Option<&str>) -> String {
    format!(
        "ℹ️ Code is not activated\n• Code: {code}\n• Amount: {}\n• Checked at: {}",
        amount.unwrap_or("-"),
        now_string(),
    )
}

pub fn check_invalid(code: &str) -> String {
    format!(
        "❌ Code state: invalid\n• Code: {code}\n• Checked at: {}",
        now_string()
    )
}

pub fn activate_already_activated(
    player_id: &str,
    player_name: &str,
    code: &str,
    activated_to: Option<&str>,
    activated_at_ms: Option<i64>,
) -> String {
    format!(
        "⚠️ Code already activated\n👤 Player details:\n• ID: {player_id}\n• Name: {player_name}\n\n• Code: {code}\n• Activated for ID: {}\n• Activated at: {}",
        activated_to.unwrap_or("-"),
        format_unix(activated_at_ms),
    )
}

pub fn activate_invalid(code: &str) -> String {
    format!("❌ This code cannot be activated\n• Code: {code}")
}

pub fn activate_success(player_id: &str, player_name: &str, code: &str) -> String {
    format!(
        "✅ Code activated successfully\n👤 Player details:\n• ID: {player_id}\n• Name: {player_name}\n\n• Code: {code}"
    )
}

pub fn activate_failed(player_id: &str, player_name: &str, code: &str) -> String {
    format!(
        "❌ Failed to activate the code\n👤 Player details:\n• ID: {player_id}\n• Name: {player_name}\n\n• Code: {code}"
    )
}

pub fn activate_player_unresolved() -> String {
    [
        "⚠️ Player not found, but you can still send the code and we will try to activate it for this ID.",
        "",
        PROMPT_ACTIVATE_CODE,
    ]
    .join("\n")
}

pub fn activate_lookup_failed() -> String {
    format!(
        "⚠️ Could not resolve the player name, but you can continue.\n{PROMPT_ACTIVATE_CODE}"
    )
}

pub fn account_info(profile: &TraderProfile) -> String {
    let now_ms = Utc::now().timestamp_millis();
    let status = if profile.is_active_at(now_ms) {
        "✅ subscribed"
    } else {
        "❌ not subscribed (expired)"
    };
    let days_left = ((profile.expires_at_ms - now_ms) / (24 * 60 * 60 * 1000)).max(0);

    let mut text = format!("👤 Trader account:\n\n• ID: {}\n", profile.id);
    if let Some(username) = &profile.username {
        text.push_str(&format!("• Username: {username}\n"));
    }
    if let Some(name) = &profile.name {
        text.push_str(&format!("• Name: {name}\n"));
    }
    text.push_str(&format!("\n• Subscription: {status}\n"));
    text.push_str(&format!("• Registered: {}\n", format_unix(Some(profile.added_at_ms))));
    text.push_str(&format!("• Expires: {}\n", format_unix(Some(profile.expires_at_ms))));
    if profile.is_active_at(now_ms) {
        text.push_str(&format!("• Days left (approx.): {days_left}\n"));
    }
    text
}

pub fn account_not_registered() -> String {
    format!(
        "You are not registered as a trader on this bot.\n\n{}",
        subscription_text()
    )
}

pub fn trader_list(profiles: &[TraderProfile]) -> String {
    if profiles.is_empty() {
        return "No traders registered yet.".to_string();
    }
    let now_ms = Utc::now().timestamp_millis();
    let mut text = format!("📋 Registered traders ({}):\n\n", profiles.len());
    for profile in profiles {
        let status = if profile.is_active_at(now_ms) {
            "✅ active"
        } else {
            "❌ expired"
        };
        text.push_str(&format!("• ID: {}", profile.id));
        if let Some(username) = &profile.username {
            text.push_str(&format!(" — {username}"));
        }
        if let Some(name) = &profile.name {
            text.push_str(&format!(" — {name}"));
        }
        text.push_str(&format!(" — {status}\n"));
    }
    text
}

pub fn trader_added(profile: &TraderProfile, subscription_days: i64) -> String {
    format!(
        "✅ Trader registered.\n• ID: {}\n• Expires in: {subscription_days} days\n",
        profile.id
    )
}

/// Current time, rendered for replies.
pub fn now_string() -> String {
    format_datetime(Utc::now())
}

/// Renders a unix timestamp that may be in seconds or milliseconds.
pub fn format_unix(value: Option<i64>) -> String {
    let Some(raw) = value else {
        return "-".to_string();
    };
    // Anything below 1e12 cannot be a millisecond timestamp of this era.
    let ms = if raw.abs() < 1_000_000_000_000 {
        raw * 1000
    } else {
        raw
    };
    match DateTime::<Utc>::from_timestamp_millis(ms) {
        Some(dt) => format_datetime(dt),
        None => "-".to_string(),
    }
}

fn format_datetime(dt: DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}
