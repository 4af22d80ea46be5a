//! Response-retrieval core of the crowfather relay.
//!
//! Resolves a conversation context to an assistant thread, submits the user's
//! text, starts a run, polls it to completion under a deadline and returns the
//! sanitized reply. The message-intent filter decides whether a chat message
//! reaches that pipeline at all.

mod config;
mod engagement;
mod error;
mod intent;
mod relay;
mod reply;
mod run_poller;
#[cfg(test)]
mod test_support;
mod thread_registry;
mod thread_store;

pub use config::{
    RelayConfig, DEFAULT_MESSAGE_LIST_LIMIT, DEFAULT_POLL_INTERVAL, DEFAULT_RESPONSE_TIMEOUT,
    DEFAULT_SPONTANEOUS_RANGE, DEFAULT_TRIGGER_PHRASE,
};
pub use engagement::{spontaneous_draw, EngagementRoll, SeededRoll, ThreadRngRoll};
pub use error::{RelayError, ResponseFormatIssue, RunTerminalKind};
pub use intent::{ChatMessage, EngagementReason, IntentDecision, IntentFilter, USER_SENDER_TYPE};
pub use relay::{AssistantRelay, ChatOutcome, MELTDOWN_CONTEXT_ID, TEST_CONTEXT_ID};
pub use reply::{
    extract_reply, sanitize_reply, select_assistant_message, validate_listing, AssistantReply,
};
pub use run_poller::RunPoller;
pub use thread_registry::ThreadRegistry;
pub use thread_store::{
    InMemoryThreadStore, MessageRecord, SqliteThreadStore, ThreadStore, ThreadStoreError,
    ThreadStoreResult, DEFAULT_TRANSCRIPT_CAPACITY,
};
