//! Scripted in-process assistant platform shared by the crate's unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use crow_assistants::{
    AssistantApiError, AssistantThread, AssistantsClient, MessageContent, MessageListQuery,
    MessagePage, MessageRole, Run, RunLastError, RunStatus, ThreadMessage,
};

#[derive(Default)]
pub(crate) struct ScriptedAssistantsClient {
    thread_counter: AtomicUsize,
    message_counter: AtomicUsize,
    run_counter: AtomicUsize,
    retrieve_calls: AtomicUsize,
    fail_create_thread: AtomicBool,
    create_thread_delay: Mutex<Duration>,
    retrieve_delay: Mutex<Duration>,
    retrieve_failure: Mutex<Option<u16>>,
    statuses: Mutex<VecDeque<RunStatus>>,
    last_error: Mutex<Option<RunLastError>>,
    listing: Mutex<Vec<ThreadMessage>>,
    list_cursors: Mutex<Vec<String>>,
    created_messages: Mutex<Vec<(String, String)>>,
    created_runs: Mutex<Vec<(String, String)>>,
}

impl ScriptedAssistantsClient {
    /// Statuses returned by successive fetches; the last one repeats forever.
    pub(crate) fn script_statuses(&self, statuses: &[RunStatus]) {
        *self.statuses.lock().expect("statuses") = statuses.iter().cloned().collect();
    }

    pub(crate) fn set_listing(&self, messages: Vec<ThreadMessage>) {
        *self.listing.lock().expect("listing") = messages;
    }

    pub(crate) fn set_last_error(&self, error: RunLastError) {
        *self.last_error.lock().expect("last error") = Some(error);
    }

    pub(crate) fn set_retrieve_delay(&self, delay: Duration) {
        *self.retrieve_delay.lock().expect("retrieve delay") = delay;
    }

    pub(crate) fn set_create_thread_delay(&self, delay: Duration) {
        *self.create_thread_delay.lock().expect("create delay") = delay;
    }

    pub(crate) fn fail_retrieve_with_status(&self, status: u16) {
        *self.retrieve_failure.lock().expect("retrieve failure") = Some(status);
    }

    pub(crate) fn fail_create_thread(&self, fail: bool) {
        self.fail_create_thread.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn sample_run(&self, thread_id: &str, status: RunStatus) -> Run {
        Run {
            id: "run_1".to_string(),
            thread_id: thread_id.to_string(),
            assistant_id: "asst_chat".to_string(),
            status,
            created_at: 1,
            last_error: None,
        }
    }

    pub(crate) fn threads_created(&self) -> usize {
        self.thread_counter.load(Ordering::SeqCst)
    }

    pub(crate) fn retrieve_calls(&self) -> usize {
        self.retrieve_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn list_cursors(&self) -> Vec<String> {
        self.list_cursors.lock().expect("cursors").clone()
    }

    pub(crate) fn created_messages(&self) -> Vec<(String, String)> {
        self.created_messages.lock().expect("messages").clone()
    }

    pub(crate) fn created_runs(&self) -> Vec<(String, String)> {
        self.created_runs.lock().expect("runs").clone()
    }

    fn next_status(&self) -> RunStatus {
        let mut statuses = self.statuses.lock().expect("statuses");
        if statuses.len() > 1 {
            statuses.pop_front().unwrap_or(RunStatus::Completed)
        } else {
            statuses.front().cloned().unwrap_or(RunStatus::Completed)
        }
    }
}

#[async_trait]
impl AssistantsClient for ScriptedAssistantsClient {
    async fn create_thread(&self) -> Result<AssistantThread, AssistantApiError> {
        let delay = *self.create_thread_delay.lock().expect("create delay");
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.fail_create_thread.load(Ordering::SeqCst) {
            return Err(AssistantApiError::HttpStatus {
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        let index = self.thread_counter.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(AssistantThread {
            id: format!("thread_{index}"),
            created_at: index as i64,
        })
    }

    async fn create_message(
        &self,
        thread_id: &str,
        text: &str,
    ) -> Result<ThreadMessage, AssistantApiError> {
        let index = self.message_counter.fetch_add(1, Ordering::SeqCst) + 1;
        self.created_messages
            .lock()
            .expect("messages")
            .push((thread_id.to_string(), text.to_string()));
        Ok(ThreadMessage {
            id: format!("msg_user_{index}"),
            thread_id: thread_id.to_string(),
            role: MessageRole::User,
            created_at: index as i64,
            run_id: None,
            content: vec![MessageContent::text(text)],
        })
    }

    async fn create_run(
        &self,
        thread_id: &str,
        assistant_id: &str,
    ) -> Result<Run, AssistantApiError> {
        let index = self.run_counter.fetch_add(1, Ordering::SeqCst) + 1;
        self.created_runs
            .lock()
            .expect("runs")
            .push((thread_id.to_string(), assistant_id.to_string()));
        Ok(Run {
            id: format!("run_{index}"),
            thread_id: thread_id.to_string(),
            assistant_id: assistant_id.to_string(),
            status: RunStatus::Queued,
            created_at: index as i64,
            last_error: None,
        })
    }

    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<Run, AssistantApiError> {
        self.retrieve_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.retrieve_delay.lock().expect("retrieve delay");
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if let Some(status) = *self.retrieve_failure.lock().expect("retrieve failure") {
            return Err(AssistantApiError::HttpStatus {
                status,
                body: "retrieve failed".to_string(),
            });
        }
        Ok(Run {
            id: run_id.to_string(),
            thread_id: thread_id.to_string(),
            assistant_id: "asst_chat".to_string(),
            status: self.next_status(),
            created_at: 1,
            last_error: self.last_error.lock().expect("last error").clone(),
        })
    }

    async fn list_messages(
        &self,
        _thread_id: &str,
        query: &MessageListQuery,
    ) -> Result<MessagePage, AssistantApiError> {
        self.list_cursors
            .lock()
            .expect("cursors")
            .push(query.before.clone().unwrap_or_default());
        let data = self.listing.lock().expect("listing").clone();
        Ok(MessagePage {
            first_id: data.first().map(|message| message.id.clone()),
            last_id: data.last().map(|message| message.id.clone()),
            has_more: false,
            data,
        })
    }
}

pub(crate) fn assistant_message(id: &str, created_at: i64, text: &str) -> ThreadMessage {
    ThreadMessage {
        id: id.to_string(),
        thread_id: "thread_1".to_string(),
        role: MessageRole::Assistant,
        created_at,
        run_id: Some("run_1".to_string()),
        content: vec![MessageContent::text(text)],
    }
}
