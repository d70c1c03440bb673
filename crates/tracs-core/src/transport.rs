//! The outbound chat transport seam.
//!
//! The workflow engine only ever asks the transport to deliver text and
//! keyboards to a conversation; everything about message delivery, inline
//! query protocol, and keyboard rendering stays behind this trait.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One button of an inline keyboard; `action` comes back to the engine
/// through `handle_action` when pressed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineButton {
    pub label: String,
    pub action: String,
}

impl InlineButton {
    pub fn new(label: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            action: action.into(),
        }
    }
}

/// A keyboard attached to an outbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Keyboard {
    /// Persistent reply keyboard; pressing a button sends its label back
    /// as ordinary text input.
    Reply { rows: Vec<Vec<String>> },
    /// Inline keyboard; pressing a button sends its action id back as a
    /// structured action.
    Inline { rows: Vec<Vec<InlineButton>> },
}

/// One answer card for a non-conversational (inline) query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineResult {
    pub id: String,
    pub title: String,
    pub description: String,
    /// Message text sent when the actor picks this card.
    pub text: String,
}

/// Outbound message delivery.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Sends plain text to a conversation.
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<()>;

    /// Sends text with an attached keyboard.
    async fn send_with_keyboard(&self, chat_id: i64, text: &str, keyboard: Keyboard)
    -> Result<()>;

    /// Rewrites a previously sent message in place.
    async fn edit_message(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<()>;
}
