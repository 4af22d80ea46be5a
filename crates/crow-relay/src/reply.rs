//! Locating the assistant's answer in a completed thread and normalizing its text.

use crow_assistants::{AssistantsClient, MessageListQuery, MessageRole, ThreadMessage};

use crate::{RelayError, ResponseFormatIssue};

#[derive(Debug, Clone, PartialEq, Eq)]
/// Sanitized reply produced by a completed run.
pub struct AssistantReply {
    pub thread_id: String,
    pub message_id: String,
    pub text: String,
}

/// Collapses a reply onto a single whitespace-normalized line.
pub fn sanitize_reply(raw: &str) -> String {
    let cleaned = raw.trim().replace("\n\n", "\n").replace('\n', " ");
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Guard on the shape of the page before the role scan runs.
pub fn validate_listing(messages: &[ThreadMessage]) -> Result<(), ResponseFormatIssue> {
    let first = messages.first().ok_or(ResponseFormatIssue::EmptyListing)?;
    if first.content.is_empty() {
        return Err(ResponseFormatIssue::MissingContent);
    }
    match first.leading_text() {
        Some(text) if !text.is_empty() => Ok(()),
        _ => Err(ResponseFormatIssue::EmptyText),
    }
}

/// Most recent assistant-authored message; ties keep listing order.
pub fn select_assistant_message(
    messages: &[ThreadMessage],
) -> Result<&ThreadMessage, ResponseFormatIssue> {
    validate_listing(messages)?;
    messages
        .iter()
        .filter(|message| message.role == MessageRole::Assistant)
        .fold(None, |best: Option<&ThreadMessage>, candidate| match best {
            Some(current) if current.created_at >= candidate.created_at => Some(current),
            _ => Some(candidate),
        })
        .ok_or(ResponseFormatIssue::NoAssistantMessage)
}

/// Lists the messages that follow `before_message_id` and returns the sanitized reply.
pub async fn extract_reply(
    client: &dyn AssistantsClient,
    thread_id: &str,
    before_message_id: &str,
    limit: u32,
) -> Result<AssistantReply, RelayError> {
    let page = client
        .list_messages(
            thread_id,
            &MessageListQuery::before(before_message_id).with_limit(limit),
        )
        .await
        .map_err(RelayError::platform("list_messages"))?;

    let message = select_assistant_message(&page.data)?;
    let raw = message
        .first_text()
        .ok_or_else(|| ResponseFormatIssue::AssistantWithoutText {
            message_id: message.id.clone(),
        })?;
    let text = sanitize_reply(raw);
    if text.is_empty() {
        return Err(ResponseFormatIssue::AssistantWithoutText {
            message_id: message.id.clone(),
        }
        .into());
    }

    Ok(AssistantReply {
        thread_id: thread_id.to_string(),
        message_id: message.id.clone(),
        text,
    })
}
