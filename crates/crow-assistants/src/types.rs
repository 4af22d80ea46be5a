use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
/// Author of a thread message.
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
/// Text payload of a `text` content block.
pub struct MessageText {
    pub value: String,
    #[serde(default)]
    pub annotations: Vec<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
/// Content block attached to a thread message.
pub enum MessageContent {
    Text {
        text: MessageText,
    },
    /// Image files, image URLs, refusals and other blocks the relay never reads.
    #[serde(other)]
    Other,
}

impl MessageContent {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text {
            text: MessageText {
                value: value.into(),
                annotations: Vec::new(),
            },
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text.value.as_str()),
            Self::Other => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
/// Entry of a remote conversation thread.
pub struct ThreadMessage {
    pub id: String,
    #[serde(default)]
    pub thread_id: String,
    pub role: MessageRole,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    #[serde(default)]
    pub content: Vec<MessageContent>,
}

impl ThreadMessage {
    /// Text of the first content block, when that block is a text block.
    pub fn leading_text(&self) -> Option<&str> {
        self.content.first().and_then(MessageContent::as_text)
    }

    /// First text block anywhere in the message.
    pub fn first_text(&self) -> Option<&str> {
        self.content.iter().find_map(MessageContent::as_text)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
/// Remote conversation thread handle as issued by the platform.
pub struct AssistantThread {
    pub id: String,
    #[serde(default)]
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
/// Lifecycle state reported for a run.
pub enum RunStatus {
    Queued,
    InProgress,
    Completed,
    Failed,
    Cancelled,
    RequiresAction,
    Unknown(String),
}

impl RunStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Queued => "queued",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
            Self::RequiresAction => "requires_action",
            Self::Unknown(raw) => raw.as_str(),
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Queued | Self::InProgress)
    }
}

impl From<String> for RunStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "queued" => Self::Queued,
            "in_progress" => Self::InProgress,
            "completed" => Self::Completed,
            "failed" => Self::Failed,
            "cancelled" => Self::Cancelled,
            "requires_action" => Self::RequiresAction,
            _ => Self::Unknown(raw),
        }
    }
}

impl From<RunStatus> for String {
    fn from(status: RunStatus) -> Self {
        status.as_str().to_string()
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
/// Failure detail reported by the platform for failed runs.
pub struct RunLastError {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
/// Processing request against a thread.
pub struct Run {
    pub id: String,
    pub thread_id: String,
    #[serde(default)]
    pub assistant_id: String,
    pub status: RunStatus,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<RunLastError>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
/// One page of a cursor-paginated message listing.
pub struct MessagePage {
    #[serde(default)]
    pub data: Vec<ThreadMessage>,
    #[serde(default)]
    pub first_id: Option<String>,
    #[serde(default)]
    pub last_id: Option<String>,
    #[serde(default)]
    pub has_more: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Cursor parameters for listing thread messages.
pub struct MessageListQuery {
    pub before: Option<String>,
    pub limit: Option<u32>,
    pub newest_first: bool,
}

impl Default for MessageListQuery {
    fn default() -> Self {
        Self {
            before: None,
            limit: None,
            newest_first: true,
        }
    }
}

impl MessageListQuery {
    pub fn before(message_id: impl Into<String>) -> Self {
        Self {
            before: Some(message_id.into()),
            ..Self::default()
        }
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub(crate) fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![(
            "order",
            if self.newest_first { "desc" } else { "asc" }.to_string(),
        )];
        if let Some(before) = self.before.as_deref() {
            pairs.push(("before", before.to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.clamp(1, 100).to_string()));
        }
        pairs
    }
}

#[derive(Debug, Error)]
/// Failures surfaced by the assistant platform client.
pub enum AssistantApiError {
    #[error("missing API key")]
    MissingApiKey,
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("assistant platform returned non-success status {status}: {body}")]
    HttpStatus { status: u16, body: String },
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

#[async_trait]
/// Operations the relay consumes from the hosted assistant platform.
pub trait AssistantsClient: Send + Sync {
    async fn create_thread(&self) -> Result<AssistantThread, AssistantApiError>;

    async fn create_message(
        &self,
        thread_id: &str,
        text: &str,
    ) -> Result<ThreadMessage, AssistantApiError>;

    async fn create_run(&self, thread_id: &str, assistant_id: &str)
        -> Result<Run, AssistantApiError>;

    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<Run, AssistantApiError>;

    async fn list_messages(
        &self,
        thread_id: &str,
        query: &MessageListQuery,
    ) -> Result<MessagePage, AssistantApiError>;
}
