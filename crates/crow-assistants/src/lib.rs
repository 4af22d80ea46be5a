//! Client surface for the hosted assistant platform used by the crowfather relay.
//!
//! The platform models a conversation as a remote thread of messages. A run
//! asks a configured assistant persona to process the thread and eventually
//! appends assistant messages to it. This crate only consumes that model; the
//! orchestration lives in `crow-relay`.
mod openai;
mod request_id;
mod types;

pub use openai::{OpenAiAssistantsClient, OpenAiAssistantsConfig, DEFAULT_OPENAI_API_BASE};
pub use request_id::new_request_id;
pub use types::{
    AssistantApiError, AssistantThread, AssistantsClient, MessageContent, MessageListQuery,
    MessagePage, MessageRole, MessageText, Run, RunLastError, RunStatus, ThreadMessage,
};
