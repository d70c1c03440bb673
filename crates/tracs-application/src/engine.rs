//! The workflow engine.
//!
//! Receives raw text input tagged with a conversation and actor id,
//! consults the conversation's session, decides the next state or
//! terminal action, calls the remote ledger, records the outcome in the
//! operation log, and emits replies through the chat transport.
//!
//! Per invocation: at most one reply beyond the interim "working" notice
//! per remote call, at most one log append per terminal outcome, and
//! zero to two remote calls. Input validation failures prompt a retry
//! and leave the session untouched; every other outcome returns the
//! conversation to idle.

use crate::dashboard::LogDashboard;
use crate::messages as msg;
use crate::session_registry::SessionRegistry;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use tracs_core::error::Result;
use tracs_core::ledger::{Activation, CodeCheck, LedgerClient, PlayerLookup};
use tracs_core::oplog::{OperationKind, OperationLog, OperationOutcome, OperationRecord};
use tracs_core::session::{FlowMode, PendingActivation};
use tracs_core::trader::{TraderDirectory, TraderProfile};
use tracs_core::transport::{ChatTransport, InlineResult};

static DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]+$").unwrap());
/// Inline queries of this shape are treated as candidate codes.
static CODE_SHAPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9]{8,}$").unwrap());

fn is_digits(text: &str) -> bool {
    DIGITS.is_match(text)
}

pub struct WorkflowEngine {
    transport: Arc<dyn ChatTransport>,
    ledger: Arc<dyn LedgerClient>,
    oplog: OperationLog,
    traders: Arc<dyn TraderDirectory>,
    sessions: SessionRegistry,
    dashboard: LogDashboard,
    owner_id: Option<i64>,
    subscription_days: i64,
}

impl WorkflowEngine {
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        ledger: Arc<dyn LedgerClient>,
        oplog: OperationLog,
        traders: Arc<dyn TraderDirectory>,
        owner_id: Option<i64>,
        subscription_days: i64,
    ) -> Self {
        Self {
            transport,
            ledger,
            oplog: oplog.clone(),
            traders,
            sessions: SessionRegistry::new(),
            dashboard: LogDashboard::new(oplog),
            owner_id,
            subscription_days,
        }
    }

    /// Handles one text update from a conversation.
    pub async fn handle_text(&self, chat_id: i64, actor_id: i64, text: &str) -> Result<()> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(());
        }

        if let Some(command) = text.strip_prefix('/')
            && self.handle_command(chat_id, actor_id, command).await?
        {
            return Ok(());
        }

        // Available to everyone, registered or not.
        match text {
            msg::BTN_SUBSCRIPTION => {
                return self
                    .transport
                    .send_text(chat_id, &msg::subscription_text())
                    .await;
            }
            msg::BTN_MY_ACCOUNT => return self.send_account_info(chat_id, actor_id).await,
            _ => {}
        }

        if !self.traders.is_authorized(actor_id).await {
            return self
                .transport
                .send_text(chat_id, &msg::subscription_pitch())
                .await;
        }

        // Menu actions take precedence over whatever flow was in
        // progress; picking a button mid-flow starts over.
        match text {
            msg::BTN_PLAYER_LOOKUP => {
                self.enter_mode(chat_id, FlowMode::AwaitPlayerLookupId).await;
                return self.transport.send_text(chat_id, msg::PROMPT_LOOKUP_ID).await;
            }
            msg::BTN_CHECK_CODE => {
                self.enter_mode(chat_id, FlowMode::AwaitCheckCode).await;
                return self.transport.send_text(chat_id, msg::PROMPT_CHECK_CODE).await;
            }
            msg::BTN_ACTIVATE_CODE => {
                self.enter_mode(chat_id, FlowMode::AwaitActivatePlayerId).await;
                return self
                    .transport
                    .send_text(chat_id, msg::PROMPT_ACTIVATE_ID)
                    .await;
            }
            msg::BTN_MY_LOG => return self.send_log_summary(chat_id, actor_id).await,
            _ => {}
        }

        let session = self.sessions.snapshot(chat_id).await;
        match session.mode {
            FlowMode::AwaitPlayerLookupId => {
                self.run_player_lookup(chat_id, actor_id, text).await
            }
            FlowMode::AwaitCheckCode => self.run_code_check(chat_id, actor_id, text).await,
            FlowMode::AwaitActivatePlayerId => self.begin_activation(chat_id, text).await,
            FlowMode::AwaitActivateCode => match session.pending {
                Some(pending) => {
                    self.finish_activation(chat_id, actor_id, text, pending).await
                }
                // Guard violated (scratch lost); fall back to the menu.
                None => {
                    self.sessions.reset(chat_id).await;
                    self.send_main_menu(chat_id).await
                }
            },
            FlowMode::Idle => self.send_main_menu(chat_id).await,
        }
    }

    /// Handles a structured action (an inline keyboard press).
    pub async fn handle_action(
        &self,
        chat_id: i64,
        actor_id: i64,
        message_id: i64,
        action: &str,
    ) -> Result<()> {
        if !self.traders.is_authorized(actor_id).await {
            tracing::debug!("Ignoring action from unauthorized actor {}", actor_id);
            return Ok(());
        }

        let Some(rest) = action.strip_prefix("logs:") else {
            tracing::debug!("Unknown action '{}'", action);
            return Ok(());
        };
        let (kind_text, page_text) = rest.split_once(':').unwrap_or((rest, "1"));
        let Ok(kind) = kind_text.parse::<OperationKind>() else {
            tracing::debug!("Unknown log kind in action '{}'", action);
            return Ok(());
        };
        let page = page_text.parse::<usize>().unwrap_or(1);

        match self.dashboard.detail(actor_id, kind, page).await {
            Ok(view) => {
                self.transport
                    .edit_message(chat_id, message_id, &view.text, view.keyboard)
                    .await
            }
            Err(e) => {
                tracing::warn!("Log detail view failed: {}", e);
                Ok(())
            }
        }
    }

    /// Handles a non-conversational query, bypassing the session machine.
    ///
    /// All-digit queries are player lookups; queries shaped like a code
    /// are code checks. Remote failures yield an empty result list and
    /// are never surfaced to the actor.
    pub async fn handle_inline_query(&self, actor_id: i64, query: &str) -> Vec<InlineResult> {
        if !self.traders.is_authorized(actor_id).await {
            return Vec::new();
        }
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }

        if is_digits(query) {
            return self.inline_player_lookup(actor_id, query).await;
        }
        if CODE_SHAPE.is_match(query) {
            return self.inline_code_check(actor_id, query).await;
        }
        Vec::new()
    }

    // ----- commands -----

    /// Returns whether the command was recognized and handled.
    async fn handle_command(&self, chat_id: i64, actor_id: i64, command: &str) -> Result<bool> {
        let mut parts = command.split_whitespace();
        let name = parts.next().unwrap_or("");
        let arg = parts.next();

        match name {
            "start" => {
                self.sessions.reset(chat_id).await;
                let text = if self.traders.is_authorized(actor_id).await {
                    msg::welcome()
                } else {
                    msg::subscription_pitch()
                };
                self.transport
                    .send_with_keyboard(chat_id, &text, msg::main_menu())
                    .await?;
            }
            "mylog" => {
                if self.traders.is_authorized(actor_id).await {
                    self.send_log_summary(chat_id, actor_id).await?;
                } else {
                    self.transport
                        .send_text(chat_id, &msg::subscription_pitch())
                        .await?;
                }
            }
            "account" => self.send_account_info(chat_id, actor_id).await?,
            "subscribe" => {
                self.transport
                    .send_text(chat_id, &msg::subscription_text())
                    .await?;
            }
            "add_trader" => self.cmd_add_trader(chat_id, actor_id, arg).await?,
            "remove_trader" => self.cmd_remove_trader(chat_id, actor_id, arg).await?,
            "traders" => self.cmd_list_traders(chat_id, actor_id).await?,
            _ => return Ok(false),
        }
        Ok(true)
    }

    async fn cmd_add_trader(
        &self,
        chat_id: i64,
        actor_id: i64,
        arg: Option<&str>,
    ) -> Result<()> {
        if self.owner_id != Some(actor_id) {
            return self.transport.send_text(chat_id, msg::OWNER_ONLY).await;
        }
        let Some(id) = arg.filter(|a| is_digits(a)).and_then(|a| a.parse::<i64>().ok())
        else {
            return self.transport.send_text(chat_id, msg::ADD_TRADER_USAGE).await;
        };

        let profile = TraderProfile::register(id, Some(actor_id), self.subscription_days);
        match self.traders.upsert(profile.clone()).await {
            Ok(()) => {
                self.transport
                    .send_text(chat_id, &msg::trader_added(&profile, self.subscription_days))
                    .await
            }
            Err(e) => {
                tracing::warn!("Trader registry update failed: {}", e);
                self.transport
                    .send_text(chat_id, msg::REGISTRY_WRITE_FAILED)
                    .await
            }
        }
    }

    async fn cmd_remove_trader(
        &self,
        chat_id: i64,
        actor_id: i64,
        arg: Option<&str>,
    ) -> Result<()> {
        if self.owner_id != Some(actor_id) {
            return self.transport.send_text(chat_id, msg::OWNER_ONLY).await;
        }
        let Some(id) = arg.filter(|a| is_digits(a)).and_then(|a| a.parse::<i64>().ok())
        else {
            return self
                .transport
                .send_text(chat_id, msg::REMOVE_TRADER_USAGE)
                .await;
        };

        match self.traders.remove(id).await {
            Ok(true) => {
                self.transport
                    .send_text(chat_id, &format!("✅ Trader removed.\n• ID: {id}"))
                    .await
            }
            Ok(false) => {
                self.transport
                    .send_text(chat_id, msg::TRADER_NOT_REGISTERED)
                    .await
            }
            Err(e) => {
                tracing::warn!("Trader registry update failed: {}", e);
                self.transport
                    .send_text(chat_id, msg::REGISTRY_WRITE_FAILED)
                    .await
            }
        }
    }

    async fn cmd_list_traders(&self, chat_id: i64, actor_id: i64) -> Result<()> {
        if self.owner_id != Some(actor_id) {
            return self.transport.send_text(chat_id, msg::OWNER_ONLY).await;
        }
        match self.traders.list().await {
            Ok(profiles) => {
                self.transport
                    .send_text(chat_id, &msg::trader_list(&profiles))
                    .await
            }
            Err(e) => {
                tracing::warn!("Trader registry read failed: {}", e);
                self.transport
                    .send_text(chat_id, msg::REGISTRY_READ_FAILED)
                    .await
            }
        }
    }

    // ----- flows -----

    async fn run_player_lookup(&self, chat_id: i64, actor_id: i64, text: &str) -> Result<()> {
        if !is_digits(text) {
            // Validation failure: retry prompt, state unchanged, no call.
            return self.transport.send_text(chat_id, msg::INVALID_ID).await;
        }

        self.sessions.reset(chat_id).await;
        self.transport.send_text(chat_id, msg::WORKING_LOOKUP).await?;

        match self.ledger.lookup_player(text).await {
            Ok(PlayerLookup::Found {
                player_id,
                player_name,
            }) => {
                self.transport
                    .send_text(chat_id, &msg::player_card(&player_id, &player_name))
                    .await?;
                self.record_operation(
                    OperationRecord::new(
                        actor_id,
                        OperationKind::Player,
                        OperationOutcome::Success,
                    )
                    .with_player(player_id, Some(player_name)),
                )
                .await;
            }
            Ok(PlayerLookup::NotFound) => {
                self.transport.send_text(chat_id, msg::PLAYER_NOT_FOUND).await?;
                self.record_operation(
                    OperationRecord::new(
                        actor_id,
                        OperationKind::Player,
                        OperationOutcome::NotFound,
                    )
                    .with_player(text, None),
                )
                .await;
            }
            Err(e) => {
                tracing::warn!("Player lookup failed: {}", e);
                self.transport.send_text(chat_id, msg::LOOKUP_FAILED).await?;
                self.record_operation(
                    OperationRecord::new(
                        actor_id,
                        OperationKind::Player,
                        OperationOutcome::Error,
                    )
                    .with_player(text, None),
                )
                .await;
            }
        }

        self.send_main_menu(chat_id).await
    }

    async fn run_code_check(&self, chat_id: i64, actor_id: i64, code: &str) -> Result<()> {
        self.sessions.reset(chat_id).await;
        self.transport.send_text(chat_id, msg::WORKING_CHECK).await?;

        match self.ledger.check_code(code).await {
            Ok(CodeCheck::Activated {
                code,
                amount,
                activated_to,
                activated_at_ms,
            }) => {
                self.transport
                    .send_text(
                        chat_id,
                        &msg::check_activated(
                            &code,
                            amount.as_deref(),
                            activated_to.as_deref(),
                            activated_at_ms,
                        ),
                    )
                    .await?;
                self.record_operation(
                    OperationRecord::new(
                        actor_id,
                        OperationKind::Check,
                        OperationOutcome::Activated,
                    )
                    .with_code(code)
                    .with_amount(amount)
                    .with_prior_activation(activated_to, activated_at_ms),
                )
                .await;
            }
            Ok(CodeCheck::Unactivated { code, amount }) => {
                self.transport
                    .send_text(chat_id, &msg::check_unactivated(&code, amount.as_deref()))
                    .await?;
                self.record_operation(
                    OperationRecord::new(
                        actor_id,
                        OperationKind::Check,
                        OperationOutcome::Unactivated,
                    )
                    .with_code(code)
                    .with_amount(amount),
                )
                .await;
            }
            Ok(CodeCheck::Invalid { code }) => {
                self.transport
                    .send_text(chat_id, &msg::check_invalid(&code))
                    .await?;
                self.record_operation(
                    OperationRecord::new(
                        actor_id,
                        OperationKind::Check,
                        OperationOutcome::Failed,
                    )
                    .with_code(code),
                )
                .await;
            }
            Err(e) => {
                tracing::warn!("Code check failed: {}", e);
                self.transport.send_text(chat_id, msg::CHECK_FAILED).await?;
                self.record_operation(
                    OperationRecord::new(
                        actor_id,
                        OperationKind::Check,
                        OperationOutcome::Error,
                    )
                    .with_code(code),
                )
                .await;
            }
        }

        self.send_main_menu(chat_id).await
    }

    /// First step of the activation flow: capture the player id and
    /// resolve a display name best-effort. A failed lookup is not fatal;
    /// the flow proceeds with an unknown name. Nothing is logged until
    /// the flow terminates.
    async fn begin_activation(&self, chat_id: i64, text: &str) -> Result<()> {
        if !is_digits(text) {
            return self.transport.send_text(chat_id, msg::INVALID_ID).await;
        }

        let mut session = self.sessions.snapshot(chat_id).await;
        session.mode = FlowMode::AwaitActivateCode;
        session.pending = Some(PendingActivation {
            player_id: text.to_string(),
            player_name: None,
        });
        self.sessions.store(chat_id, session).await;

        self.transport.send_text(chat_id, msg::WORKING_LOOKUP).await?;

        match self.ledger.lookup_player(text).await {
            Ok(PlayerLookup::Found {
                player_id,
                player_name,
            }) => {
                let mut session = self.sessions.snapshot(chat_id).await;
                if let Some(pending) = session.pending.as_mut() {
                    pending.player_name = Some(player_name.clone());
                }
                self.sessions.store(chat_id, session).await;

                let reply = format!(
                    "{}\n\n{}",
                    msg::player_card(&player_id, &player_name),
                    msg::PROMPT_ACTIVATE_CODE
                );
                self.transport.send_text(chat_id, &reply).await?;
            }
            Ok(PlayerLookup::NotFound) => {
                self.transport
                    .send_text(chat_id, &msg::activate_player_unresolved())
                    .await?;
            }
            Err(e) => {
                tracing::warn!("Name resolution before activation failed: {}", e);
                self.transport
                    .send_text(chat_id, &msg::activate_lookup_failed())
                    .await?;
            }
        }
        Ok(())
    }

    /// Second step of the activation flow: check-before-activate.
    ///
    /// The ordering is load-bearing. The ledger offers no atomic
    /// redeem-if-unactivated call, so checking first is the closest
    /// client-side approximation to exactly-once redemption; the window
    /// between the check and the activation below remains, and another
    /// party may redeem the code inside it.
    async fn finish_activation(
        &self,
        chat_id: i64,
        actor_id: i64,
        code: &str,
        pending: PendingActivation,
    ) -> Result<()> {
        self.sessions.reset(chat_id).await;

        let player_id = pending.player_id;
        let display_name = pending.player_name.clone().unwrap_or_else(|| "-".to_string());

        self.transport.send_text(chat_id, msg::WORKING_PRECHECK).await?;

        let check = match self.ledger.check_code(code).await {
            Ok(check) => check,
            Err(e) => {
                tracing::warn!("Pre-activation check failed: {}", e);
                self.transport.send_text(chat_id, msg::PRECHECK_FAILED).await?;
                self.record_operation(
                    OperationRecord::new(
                        actor_id,
                        OperationKind::Activate,
                        OperationOutcome::CheckError,
                    )
                    .with_player(player_id.as_str(), pending.player_name)
                    .with_code(code),
                )
                .await;
                return self.send_main_menu(chat_id).await;
            }
        };

        match check {
            CodeCheck::Activated {
                code: code_value,
                amount,
                activated_to,
                activated_at_ms,
            } => {
                // Already consumed; never attempt activation on an
                // already-activated code.
                self.transport
                    .send_text(
                        chat_id,
                        &msg::activate_already_activated(
                            &player_id,
                            &display_name,
                            &code_value,
                            activated_to.as_deref(),
                            activated_at_ms,
                        ),
                    )
                    .await?;
                self.record_operation(
                    OperationRecord::new(
                        actor_id,
                        OperationKind::Activate,
                        OperationOutcome::AlreadyActivated,
                    )
                    .with_player(player_id.as_str(), pending.player_name)
                    .with_code(code_value)
                    .with_amount(amount)
                    .with_prior_activation(activated_to, activated_at_ms),
                )
                .await;
            }
            CodeCheck::Invalid { code: code_value } => {
                self.transport
                    .send_text(chat_id, &msg::activate_invalid(&code_value))
                    .await?;
                self.record_operation(
                    OperationRecord::new(
                        actor_id,
                        OperationKind::Activate,
                        OperationOutcome::InvalidBeforeActivate,
                    )
                    .with_player(player_id.as_str(), pending.player_name)
                    .with_code(code_value),
                )
                .await;
            }
            CodeCheck::Unactivated { .. } => {
                self.transport.send_text(chat_id, msg::WORKING_ACTIVATE).await?;

                match self.ledger.activate_code(&player_id, code).await {
                    Ok(Activation::Accepted) => {
                        self.transport
                            .send_text(
                                chat_id,
                                &msg::activate_success(&player_id, &display_name, code),
                            )
                            .await?;
                        self.record_operation(
                            OperationRecord::new(
                                actor_id,
                                OperationKind::Activate,
                                OperationOutcome::Success,
                            )
                            .with_player(player_id.as_str(), pending.player_name)
                            .with_code(code),
                        )
                        .await;
                    }
                    Ok(Activation::Rejected) => {
                        self.transport
                            .send_text(
                                chat_id,
                                &msg::activate_failed(&player_id, &display_name, code),
                            )
                            .await?;
                        self.record_operation(
                            OperationRecord::new(
                                actor_id,
                                OperationKind::Activate,
                                OperationOutcome::Failed,
                            )
                            .with_player(player_id.as_str(), pending.player_name)
                            .with_code(code),
                        )
                        .await;
                    }
                    Err(e) => {
                        tracing::warn!("Activation call failed: {}", e);
                        self.transport.send_text(chat_id, msg::ACTIVATE_ERROR).await?;
                        self.record_operation(
                            OperationRecord::new(
                                actor_id,
                                OperationKind::Activate,
                                OperationOutcome::Error,
                            )
                            .with_player(player_id.as_str(), pending.player_name)
                            .with_code(code),
                        )
                        .await;
                    }
                }
            }
        }

        self.send_main_menu(chat_id).await
    }

    // ----- inline query handlers -----

    async fn inline_player_lookup(&self, actor_id: i64, query: &str) -> Vec<InlineResult> {
        match self.ledger.lookup_player(query).await {
            Ok(PlayerLookup::Found {
                player_id,
                player_name,
            }) => {
                self.record_operation(
                    OperationRecord::new(
                        actor_id,
                        OperationKind::PlayerInline,
                        OperationOutcome::Success,
                    )
                    .with_player(player_id.as_str(), Some(player_name.clone())),
                )
                .await;
                vec![InlineResult {
                    id: format!("player-{player_id}"),
                    title: format!("👤 {player_name}"),
                    description: format!("ID: {player_id}"),
                    text: msg::player_card(&player_id, &player_name),
                }]
            }
            Ok(PlayerLookup::NotFound) => Vec::new(),
            Err(e) => {
                tracing::warn!("Inline player lookup failed: {}", e);
                Vec::new()
            }
        }
    }

    async fn inline_code_check(&self, actor_id: i64, query: &str) -> Vec<InlineResult> {
        let check = match self.ledger.check_code(query).await {
            Ok(check) => check,
            Err(e) => {
                tracing::warn!("Inline code check failed: {}", e);
                return Vec::new();
            }
        };

        let (icon, status_text, outcome) = match &check {
            CodeCheck::Activated { .. } => {
                ("✅", "Code is activated", OperationOutcome::Activated)
            }
            CodeCheck::Unactivated { .. } => {
                ("ℹ️", "Code is not activated", OperationOutcome::Unactivated)
            }
            CodeCheck::Invalid { .. } => ("❌", "Code is invalid", OperationOutcome::Failed),
        };
        let code = check.code().to_string();
        let amount = match &check {
            CodeCheck::Activated { amount, .. } | CodeCheck::Unactivated { amount, .. } => {
                amount.clone()
            }
            CodeCheck::Invalid { .. } => None,
        };

        self.record_operation(
            OperationRecord::new(actor_id, OperationKind::CheckInline, outcome)
                .with_code(code.as_str())
                .with_amount(amount.clone()),
        )
        .await;

        let amount_text = amount.as_deref().unwrap_or("-");
        vec![InlineResult {
            id: format!("code-{code}"),
            title: format!("{icon} {status_text}"),
            description: format!("Code: {code} — Amount: {amount_text}"),
            text: format!("{icon} {status_text}\n• Code: {code}\n• Amount: {amount_text}"),
        }]
    }

    // ----- shared helpers -----

    async fn enter_mode(&self, chat_id: i64, mode: FlowMode) {
        let mut session = self.sessions.snapshot(chat_id).await;
        session.enter(mode);
        self.sessions.store(chat_id, session).await;
    }

    async fn send_main_menu(&self, chat_id: i64) -> Result<()> {
        self.transport
            .send_with_keyboard(chat_id, msg::CHOOSE_ACTION, msg::main_menu())
            .await
    }

    async fn send_log_summary(&self, chat_id: i64, actor_id: i64) -> Result<()> {
        match self.dashboard.summary(actor_id).await {
            Ok(Some((text, keyboard))) => {
                self.transport
                    .send_with_keyboard(chat_id, &text, keyboard)
                    .await
            }
            Ok(None) => self.transport.send_text(chat_id, msg::NO_RECORDS_YET).await,
            Err(e) => {
                tracing::warn!("Log summary failed: {}", e);
                self.transport
                    .send_text(chat_id, msg::LOG_SUMMARY_FAILED)
                    .await
            }
        }
    }

    async fn send_account_info(&self, chat_id: i64, actor_id: i64) -> Result<()> {
        match self.traders.profile(actor_id).await {
            Ok(Some(profile)) => {
                self.transport
                    .send_text(chat_id, &msg::account_info(&profile))
                    .await
            }
            Ok(None) => {
                self.transport
                    .send_text(chat_id, &msg::account_not_registered())
                    .await
            }
            Err(e) => {
                tracing::warn!("Trader registry read failed: {}", e);
                self.transport
                    .send_text(chat_id, msg::REGISTRY_READ_FAILED)
                    .await
            }
        }
    }

    /// Appends an operation record best-effort: a storage failure is
    /// logged and swallowed, never surfaced to the actor.
    async fn record_operation(&self, record: OperationRecord) {
        if let Err(e) = self.oplog.append(record).await {
            tracing::warn!("Operation log append failed: {}", e);
        }
    }
}

#[cfg(test)]
#[path = "engine_test.rs"]
mod tests;
