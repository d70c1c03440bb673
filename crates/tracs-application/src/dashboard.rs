//! Log dashboard: read-only views over the operation log.
//!
//! Builds the summary the trader sees first and the paginated per-kind
//! detail pages behind its buttons. Pure composition over the store; the
//! engine decides where the rendered text goes.

use crate::messages::format_unix;
use tracs_core::error::Result;
use tracs_core::oplog::{LogQuery, OperationKind, OperationLog, OperationRecord};
use tracs_core::transport::{InlineButton, Keyboard};

pub struct LogDashboard {
    oplog: OperationLog,
}

/// A rendered detail page.
pub struct DetailView {
    pub text: String,
    /// Prev/next navigation; `None` when there is only one page.
    pub keyboard: Option<Keyboard>,
}

fn kind_title(kind: OperationKind) -> &'static str {
    match kind.base() {
        OperationKind::Activate => "🔌 Activation log",
        OperationKind::Check => "🧪 Code check log",
        _ => "🎮 Player lookup log",
    }
}

fn action(kind: OperationKind, page: usize) -> String {
    format!("logs:{}:{}", kind.base(), page)
}

fn render_record(kind: OperationKind, record: &OperationRecord) -> String {
    let when = format_unix(record.at_ms);
    let outcome = record.outcome.to_string();
    match kind.base() {
        OperationKind::Activate => format!(
            "• Code: {}\n  Player: {} ({})\n  Outcome: {}\n  At: {}\n\n",
            record.code.as_deref().unwrap_or("-"),
            record.player_name.as_deref().unwrap_or("-"),
            record.player_id.as_deref().unwrap_or("-"),
            outcome,
            when,
        ),
        OperationKind::Check => format!(
            "• Code: {}\n  Outcome: {}\n  At: {}\n\n",
            record.code.as_deref().unwrap_or("-"),
            outcome,
            when,
        ),
        _ => format!(
            "• Player: {} ({})\n  Outcome: {}\n  At: {}\n\n",
            record.player_name.as_deref().unwrap_or("-"),
            record.player_id.as_deref().unwrap_or("-"),
            outcome,
            when,
        ),
    }
}

impl LogDashboard {
    pub fn new(oplog: OperationLog) -> Self {
        Self { oplog }
    }

    /// The per-kind counts summary, with buttons into the detail views.
    ///
    /// Returns `None` when the actor has no records at all.
    pub async fn summary(&self, actor_id: i64) -> Result<Option<(String, Keyboard)>> {
        let page = self.oplog.query(actor_id, LogQuery::default()).await?;
        if page.stats.total == 0 {
            return Ok(None);
        }

        let text = format!(
            "📒 Your log summary:\n\n• Activations: {}\n• Code checks: {}\n• Player lookups: {}\n• Total recorded: {}\n\nPick what to inspect:",
            page.stats.activate, page.stats.check, page.stats.player, page.stats.total,
        );
        let keyboard = Keyboard::Inline {
            rows: vec![
                vec![InlineButton::new(
                    "🔌 Browse activations",
                    action(OperationKind::Activate, 1),
                )],
                vec![InlineButton::new(
                    "🧪 Browse code checks",
                    action(OperationKind::Check, 1),
                )],
                vec![InlineButton::new(
                    "🎮 Browse player lookups",
                    action(OperationKind::Player, 1),
                )],
            ],
        };
        Ok(Some((text, keyboard)))
    }

    /// One page of one kind, newest first, with navigation affordances
    /// only where they lead somewhere.
    pub async fn detail(
        &self,
        actor_id: i64,
        kind: OperationKind,
        page: usize,
    ) -> Result<DetailView> {
        let result = self
            .oplog
            .query(actor_id, LogQuery::for_kind(kind, page))
            .await?;

        if result.items.is_empty() {
            return Ok(DetailView {
                text: format!("{}\n\nNo records of this kind yet.", kind_title(kind)),
                keyboard: None,
            });
        }

        let mut text = format!(
            "{} (page {}/{}):\n\n",
            kind_title(kind),
            result.page,
            result.total_pages
        );
        for record in &result.items {
            text.push_str(&render_record(kind, record));
        }

        let mut buttons = Vec::new();
        if result.page > 1 {
            buttons.push(InlineButton::new("⬅️ Previous", action(kind, result.page - 1)));
        }
        if result.page < result.total_pages {
            buttons.push(InlineButton::new("➡️ Next", action(kind, result.page + 1)));
        }
        let keyboard = if buttons.is_empty() {
            None
        } else {
            Some(Keyboard::Inline {
                rows: vec![buttons],
            })
        };

        Ok(DetailView { text, keyboard })
    }
}
