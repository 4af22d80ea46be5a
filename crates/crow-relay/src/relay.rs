//! Composition of the registry, submission, run, polling and extraction steps.

use std::sync::Arc;

use crow_assistants::{AssistantsClient, MessageRole, Run, ThreadMessage};

use crate::config::RelayConfig;
use crate::engagement::EngagementRoll;
use crate::intent::{ChatMessage, IntentDecision, IntentFilter};
use crate::reply::AssistantReply;
use crate::run_poller::RunPoller;
use crate::thread_registry::ThreadRegistry;
use crate::thread_store::{MessageRecord, ThreadStore};
use crate::RelayError;

/// Context used for ad-hoc queries from the test endpoint.
pub const TEST_CONTEXT_ID: &str = "temp";
/// Context used by the meltdown persona.
pub const MELTDOWN_CONTEXT_ID: &str = "meltdown";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatOutcome {
    /// The intent filter dropped the message; nothing was sent anywhere.
    Ignored,
    /// Appended to the thread as ambient context without starting a run.
    Recorded { thread_id: String },
    Replied(AssistantReply),
}

impl ChatOutcome {
    pub fn reply_text(&self) -> Option<&str> {
        match self {
            Self::Replied(reply) => Some(reply.text.as_str()),
            Self::Ignored | Self::Recorded { .. } => None,
        }
    }
}

/// Client-side orchestration of the assistant response-retrieval protocol.
pub struct AssistantRelay {
    client: Arc<dyn AssistantsClient>,
    store: Arc<dyn ThreadStore>,
    registry: ThreadRegistry,
    poller: RunPoller,
    intent: IntentFilter,
    config: RelayConfig,
}

impl AssistantRelay {
    pub fn new(
        client: Arc<dyn AssistantsClient>,
        store: Arc<dyn ThreadStore>,
        roll: Arc<dyn EngagementRoll>,
        config: RelayConfig,
    ) -> Result<Self, RelayError> {
        config.validate()?;
        let registry = ThreadRegistry::new(client.clone(), store.clone());
        let poller = RunPoller::new(
            client.clone(),
            config.response_timeout,
            config.poll_interval,
            config.message_list_limit,
        );
        let intent = IntentFilter::new(
            config.trigger_phrase.clone(),
            config.spontaneous_range,
            roll,
        );
        Ok(Self {
            client,
            store,
            registry,
            poller,
            intent,
            config,
        })
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    #[cfg(test)]
    pub(crate) fn registry(&self) -> &ThreadRegistry {
        &self.registry
    }

    pub async fn get_or_create_thread(&self, context_id: &str) -> Result<String, RelayError> {
        self.registry.get_or_create_thread(context_id).await
    }

    /// Appends a user message to `thread_id`; platform failures are not retried.
    pub async fn create_message(
        &self,
        thread_id: &str,
        text: &str,
    ) -> Result<ThreadMessage, RelayError> {
        if text.trim().is_empty() {
            return Err(RelayError::Validation(
                "message text cannot be empty".to_string(),
            ));
        }
        let message = self
            .client
            .create_message(thread_id, text)
            .await
            .map_err(RelayError::platform("create_message"))?;
        tracing::debug!(thread_id, message_id = %message.id, "submitted user message");
        self.record(thread_id, MessageRole::User, &message.id, text)
            .await;
        Ok(message)
    }

    pub async fn create_run(&self, thread_id: &str, assistant_id: &str) -> Result<Run, RelayError> {
        if assistant_id.trim().is_empty() {
            return Err(RelayError::Validation(
                "assistant id cannot be empty".to_string(),
            ));
        }
        let run = self
            .client
            .create_run(thread_id, assistant_id)
            .await
            .map_err(RelayError::platform("create_run"))?;
        tracing::debug!(
            thread_id,
            assistant_id,
            run_id = %run.id,
            status = %run.status,
            "created run"
        );
        Ok(run)
    }

    /// Polls `run` under the configured timeout and returns the sanitized reply.
    pub async fn await_completion(
        &self,
        run: &Run,
        last_message_id: &str,
    ) -> Result<AssistantReply, RelayError> {
        let reply = self.poller.await_completion(run, last_message_id).await?;
        self.record(
            &reply.thread_id,
            MessageRole::Assistant,
            &reply.message_id,
            &reply.text,
        )
        .await;
        Ok(reply)
    }

    pub fn should_respond(&self, message: &ChatMessage) -> Result<IntentDecision, RelayError> {
        self.intent.should_respond(message)
    }

    /// Thread → message → run → reply for one piece of text.
    pub async fn ask(
        &self,
        context_id: &str,
        text: &str,
        assistant_id: &str,
    ) -> Result<AssistantReply, RelayError> {
        let thread_id = self.get_or_create_thread(context_id).await?;
        let message = self.create_message(&thread_id, text).await?;
        let run = self.create_run(&thread_id, assistant_id).await?;
        self.await_completion(&run, &message.id).await
    }

    /// Chat webhook pipeline: intent filtering first, then the full round trip.
    pub async fn handle_chat_message(
        &self,
        message: &ChatMessage,
        assistant_id: &str,
    ) -> Result<ChatOutcome, RelayError> {
        match self.should_respond(message)? {
            IntentDecision::Respond { text, reason } => {
                tracing::info!(
                    context_id = %message.context_id,
                    reason = ?reason,
                    "engaging with chat message"
                );
                let reply = self.ask(&message.context_id, &text, assistant_id).await?;
                Ok(ChatOutcome::Replied(reply))
            }
            IntentDecision::Ignore { text } if self.config.ambient_context && !text.is_empty() => {
                let thread_id = self.get_or_create_thread(&message.context_id).await?;
                self.create_message(&thread_id, &text).await?;
                Ok(ChatOutcome::Recorded { thread_id })
            }
            IntentDecision::Ignore { .. } => {
                tracing::debug!(context_id = %message.context_id, "ignoring chat message");
                Ok(ChatOutcome::Ignored)
            }
        }
    }

    /// Runs the core without intent filtering, e.g. for the test and meltdown endpoints.
    pub async fn handle_direct_query(
        &self,
        context_id: &str,
        text: &str,
        assistant_id: &str,
    ) -> Result<AssistantReply, RelayError> {
        self.ask(context_id, text.trim(), assistant_id).await
    }

    async fn record(&self, thread_id: &str, role: MessageRole, message_id: &str, content: &str) {
        let record = MessageRecord {
            thread_id: thread_id.to_string(),
            role,
            message_id: message_id.to_string(),
            content: content.to_string(),
        };
        if let Err(error) = self.store.record_message(&record).await {
            tracing::warn!(
                thread_id,
                message_id,
                role = role.as_str(),
                error = %error,
                "failed to record transcript message"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use crow_assistants::{MessageRole, RunStatus};

    use super::{AssistantRelay, ChatOutcome, TEST_CONTEXT_ID};
    use crate::config::RelayConfig;
    use crate::engagement::{SeededRoll, ThreadRngRoll};
    use crate::intent::ChatMessage;
    use crate::test_support::{assistant_message, ScriptedAssistantsClient};
    use crate::thread_store::InMemoryThreadStore;
    use crate::RelayError;

    fn test_config() -> RelayConfig {
        RelayConfig {
            response_timeout: Duration::from_secs(2),
            poll_interval: Duration::from_millis(10),
            spontaneous_range: 0,
            ..RelayConfig::default()
        }
    }

    fn relay_with(
        client: Arc<ScriptedAssistantsClient>,
        store: Arc<InMemoryThreadStore>,
        config: RelayConfig,
    ) -> AssistantRelay {
        AssistantRelay::new(client, store, Arc::new(ThreadRngRoll), config).expect("relay")
    }

    #[tokio::test]
    async fn trigger_message_round_trips_to_sanitized_reply() {
        let client = Arc::new(ScriptedAssistantsClient::default());
        client.script_statuses(&[RunStatus::Queued, RunStatus::InProgress, RunStatus::Completed]);
        client.set_listing(vec![assistant_message("msg_reply", 10, "It's 3 PM.\n\n")]);
        let store = Arc::new(InMemoryThreadStore::new());
        let relay = relay_with(client.clone(), store.clone(), test_config());

        let outcome = relay
            .handle_chat_message(
                &ChatMessage::new("group-42", "user", "hey crowfather, what time is it?"),
                "asst_chat",
            )
            .await
            .expect("outcome");

        assert_eq!(outcome.reply_text(), Some("It's 3 PM."));
        assert_eq!(client.threads_created(), 1);
        assert_eq!(
            client.created_messages(),
            vec![("thread_1".to_string(), "what time is it?".to_string())]
        );
        assert_eq!(
            client.created_runs(),
            vec![("thread_1".to_string(), "asst_chat".to_string())]
        );
        assert_eq!(client.list_cursors(), vec!["msg_user_1".to_string()]);
        assert_eq!(relay.registry().cached("group-42").as_deref(), Some("thread_1"));

        let transcript = store.messages();
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[0].role, MessageRole::User);
        assert_eq!(transcript[0].content, "what time is it?");
        assert_eq!(transcript[1].role, MessageRole::Assistant);
        assert_eq!(transcript[1].content, "It's 3 PM.");
    }

    #[tokio::test]
    async fn non_triggering_message_makes_no_remote_calls() {
        let client = Arc::new(ScriptedAssistantsClient::default());
        let relay = relay_with(
            client.clone(),
            Arc::new(InMemoryThreadStore::new()),
            test_config(),
        );

        let outcome = relay
            .handle_chat_message(&ChatMessage::new("group-42", "user", "lunch?"), "asst_chat")
            .await
            .expect("outcome");

        assert_eq!(outcome, ChatOutcome::Ignored);
        assert_eq!(client.threads_created(), 0);
        assert!(client.created_messages().is_empty());
    }

    #[tokio::test]
    async fn bot_sender_is_rejected_before_any_remote_call() {
        let client = Arc::new(ScriptedAssistantsClient::default());
        let relay = relay_with(
            client.clone(),
            Arc::new(InMemoryThreadStore::new()),
            test_config(),
        );

        let error = relay
            .handle_chat_message(
                &ChatMessage::new("group-42", "bot", "hey crowfather, loop"),
                "asst_chat",
            )
            .await
            .expect_err("bot sender");

        assert!(matches!(error, RelayError::Validation(_)));
        assert_eq!(client.threads_created(), 0);
    }

    #[tokio::test]
    async fn ambient_context_appends_without_starting_a_run() {
        let client = Arc::new(ScriptedAssistantsClient::default());
        let config = RelayConfig {
            ambient_context: true,
            ..test_config()
        };
        let relay = relay_with(client.clone(), Arc::new(InMemoryThreadStore::new()), config);

        let outcome = relay
            .handle_chat_message(
                &ChatMessage::new("group-42", "user", "  pizza tonight  "),
                "asst_chat",
            )
            .await
            .expect("outcome");

        assert_eq!(
            outcome,
            ChatOutcome::Recorded {
                thread_id: "thread_1".to_string()
            }
        );
        assert_eq!(
            client.created_messages(),
            vec![("thread_1".to_string(), "pizza tonight".to_string())]
        );
        assert!(client.created_runs().is_empty());
    }

    #[tokio::test]
    async fn direct_query_reuses_fixed_context_thread() {
        let client = Arc::new(ScriptedAssistantsClient::default());
        client.script_statuses(&[RunStatus::Completed]);
        client.set_listing(vec![assistant_message("msg_reply", 10, "pong")]);
        let relay = relay_with(
            client.clone(),
            Arc::new(InMemoryThreadStore::new()),
            test_config(),
        );

        for _ in 0..2 {
            let reply = relay
                .handle_direct_query(TEST_CONTEXT_ID, " ping ", "asst_test")
                .await
                .expect("reply");
            assert_eq!(reply.text, "pong");
        }

        assert_eq!(client.threads_created(), 1);
        assert_eq!(
            client.created_runs(),
            vec![
                ("thread_1".to_string(), "asst_test".to_string()),
                ("thread_1".to_string(), "asst_test".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn blank_text_and_blank_assistant_are_validation_errors() {
        let client = Arc::new(ScriptedAssistantsClient::default());
        let relay = relay_with(
            client.clone(),
            Arc::new(InMemoryThreadStore::new()),
            test_config(),
        );

        let error = relay
            .create_message("thread_1", "   ")
            .await
            .expect_err("blank text");
        assert!(matches!(error, RelayError::Validation(_)));

        let error = relay
            .create_run("thread_1", "")
            .await
            .expect_err("blank assistant");
        assert!(matches!(error, RelayError::Validation(_)));
        assert!(client.created_messages().is_empty());
        assert!(client.created_runs().is_empty());
    }

    #[tokio::test]
    async fn failed_run_is_not_recorded_as_reply() {
        let client = Arc::new(ScriptedAssistantsClient::default());
        client.script_statuses(&[RunStatus::Failed]);
        let store = Arc::new(InMemoryThreadStore::new());
        let relay = relay_with(client, store.clone(), test_config());

        let error = relay
            .handle_direct_query("group-42", "hello", "asst_chat")
            .await
            .expect_err("failed run");
        assert_eq!(error.code(), "run_terminal");
        assert_eq!(store.messages().len(), 1);
    }

    #[tokio::test]
    async fn repeated_queries_keep_in_memory_transcript_bounded() {
        let client = Arc::new(ScriptedAssistantsClient::default());
        client.set_listing(vec![assistant_message("msg_reply", 10, "pong")]);
        let store = Arc::new(InMemoryThreadStore::with_transcript_capacity(8));
        let relay = relay_with(client.clone(), store.clone(), test_config());

        for _ in 0..50 {
            relay
                .handle_direct_query(TEST_CONTEXT_ID, "ping", "asst_test")
                .await
                .expect("reply");
            assert!(store.messages().len() <= 8);
        }

        assert_eq!(client.created_runs().len(), 50);
        assert_eq!(store.messages().len(), 8);
    }

    #[test]
    fn invalid_config_is_rejected_at_construction() {
        let config = RelayConfig {
            poll_interval: Duration::ZERO,
            ..RelayConfig::default()
        };
        let result = AssistantRelay::new(
            Arc::new(ScriptedAssistantsClient::default()),
            Arc::new(InMemoryThreadStore::new()),
            Arc::new(SeededRoll::new(1)),
            config,
        );
        assert!(matches!(result, Err(RelayError::Configuration(_))));
    }
}
