use crow_assistants::AssistantApiError;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Terminal run states that never produce a reply.
pub enum RunTerminalKind {
    Failed,
    Cancelled,
    RequiresAction,
}

impl RunTerminalKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
            Self::RequiresAction => "requires_action",
        }
    }
}

impl std::fmt::Display for RunTerminalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// Reasons a completed run's message listing could not yield a reply.
pub enum ResponseFormatIssue {
    #[error("message listing was empty")]
    EmptyListing,
    #[error("first listed message has no content blocks")]
    MissingContent,
    #[error("first listed message has empty text")]
    EmptyText,
    #[error("no assistant message found")]
    NoAssistantMessage,
    #[error("assistant message {message_id} has no text content")]
    AssistantWithoutText { message_id: String },
}

#[derive(Debug, Error)]
/// Error taxonomy for the response-retrieval core.
pub enum RelayError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("message rejected: {0}")]
    Validation(String),
    #[error("assistant platform {operation} failed: {source}")]
    Platform {
        operation: &'static str,
        #[source]
        source: AssistantApiError,
    },
    #[error("run {run_id} did not complete within {timeout_ms}ms")]
    Timeout { run_id: String, timeout_ms: u64 },
    #[error("run {run_id} ended as {kind}: {detail}")]
    RunTerminal {
        run_id: String,
        kind: RunTerminalKind,
        detail: String,
    },
    #[error("run {run_id} reported unexpected status '{status}'")]
    UnexpectedStatus { run_id: String, status: String },
    #[error("invalid assistant response: {0}")]
    ResponseFormat(#[from] ResponseFormatIssue),
}

impl RelayError {
    pub(crate) fn platform(operation: &'static str) -> impl FnOnce(AssistantApiError) -> Self {
        move |source| Self::Platform { operation, source }
    }

    /// Stable machine-readable code for transports and logs.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration_error",
            Self::Validation(_) => "validation_error",
            Self::Platform { .. } => "assistant_platform_error",
            Self::Timeout { .. } => "response_timeout",
            Self::RunTerminal { .. } => "run_terminal",
            Self::UnexpectedStatus { .. } => "unexpected_run_status",
            Self::ResponseFormat(_) => "response_format",
        }
    }

    /// Timeouts mean "try again later"; everything else is final for this request.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
