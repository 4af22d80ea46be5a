//! Per-message decision whether the relay should engage at all.

use std::sync::Arc;

use crate::engagement::{spontaneous_draw, EngagementRoll};
use crate::RelayError;

pub const USER_SENDER_TYPE: &str = "user";

#[derive(Debug, Clone, PartialEq, Eq)]
/// Inbound chat message, reduced to what the relay needs.
pub struct ChatMessage {
    /// Conversation context, e.g. the chat group id.
    pub context_id: String,
    pub sender_type: String,
    pub text: String,
}

impl ChatMessage {
    pub fn new(
        context_id: impl Into<String>,
        sender_type: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            context_id: context_id.into(),
            sender_type: sender_type.into(),
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngagementReason {
    TriggerPhrase,
    Spontaneous,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntentDecision {
    Respond {
        text: String,
        reason: EngagementReason,
    },
    /// Not addressed to the bot; `text` is the cleaned message for ambient recording.
    Ignore { text: String },
}

impl IntentDecision {
    pub fn effective_text(&self) -> &str {
        match self {
            Self::Respond { text, .. } | Self::Ignore { text } => text.as_str(),
        }
    }

    pub fn should_respond(&self) -> bool {
        matches!(self, Self::Respond { .. })
    }
}

pub struct IntentFilter {
    trigger_phrase: String,
    trigger_phrase_lower: String,
    spontaneous_range: u32,
    roll: Arc<dyn EngagementRoll>,
}

impl IntentFilter {
    pub fn new(
        trigger_phrase: impl Into<String>,
        spontaneous_range: u32,
        roll: Arc<dyn EngagementRoll>,
    ) -> Self {
        let trigger_phrase = trigger_phrase.into();
        let trigger_phrase_lower = trigger_phrase.to_lowercase();
        Self {
            trigger_phrase,
            trigger_phrase_lower,
            spontaneous_range,
            roll,
        }
    }

    /// Rejects non-user senders, then decides between responding and ignoring.
    pub fn should_respond(&self, message: &ChatMessage) -> Result<IntentDecision, RelayError> {
        if message.sender_type != USER_SENDER_TYPE {
            return Err(RelayError::Validation(format!(
                "message is not from a user (sender_type '{}')",
                message.sender_type
            )));
        }

        let text = self.effective_text(&message.text);
        let triggered = message
            .text
            .to_lowercase()
            .contains(self.trigger_phrase_lower.as_str());
        let reason = if triggered {
            Some(EngagementReason::TriggerPhrase)
        } else if spontaneous_draw(self.roll.as_ref(), self.spontaneous_range) {
            Some(EngagementReason::Spontaneous)
        } else {
            None
        };

        Ok(match reason {
            Some(reason) if !text.is_empty() => IntentDecision::Respond { text, reason },
            _ => IntentDecision::Ignore { text },
        })
    }

    /// Strips a case-sensitive leading wake word and one following comma, then trims.
    ///
    /// A message that is nothing but the wake word falls back to its trimmed original
    /// text so the platform never receives an empty message.
    pub fn effective_text(&self, raw: &str) -> String {
        let stripped = raw.strip_prefix(self.trigger_phrase.as_str()).unwrap_or(raw);
        let stripped = stripped.strip_prefix(',').unwrap_or(stripped).trim();
        if stripped.is_empty() {
            return raw.trim().to_string();
        }
        stripped.to_string()
    }
}
