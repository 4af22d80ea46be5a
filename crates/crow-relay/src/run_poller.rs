//! Fixed-interval polling of a run until it completes, fails, or the deadline passes.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crow_assistants::{AssistantsClient, Run, RunStatus};
use tokio::time::{sleep_until, timeout_at, Instant};

use crate::reply::{extract_reply, AssistantReply};
use crate::{RelayError, RunTerminalKind};

/// Observes run status on the platform; never drives transitions itself.
pub struct RunPoller {
    client: Arc<dyn AssistantsClient>,
    timeout: Duration,
    interval: Duration,
    message_list_limit: u32,
}

impl RunPoller {
    pub fn new(
        client: Arc<dyn AssistantsClient>,
        timeout: Duration,
        interval: Duration,
        message_list_limit: u32,
    ) -> Self {
        Self {
            client,
            timeout,
            interval,
            message_list_limit,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Waits for `run` to complete and returns the reply posted after `last_message_id`.
    pub async fn await_completion(
        &self,
        run: &Run,
        last_message_id: &str,
    ) -> Result<AssistantReply, RelayError> {
        let started = Instant::now();
        let deadline = started + self.timeout;
        let mut polls = 0_u32;

        loop {
            if Instant::now() >= deadline {
                return Err(self.timeout_error(run, polls));
            }

            let current = self
                .bounded(run, deadline, polls, async {
                    self.client
                        .retrieve_run(&run.thread_id, &run.id)
                        .await
                        .map_err(RelayError::platform("retrieve_run"))
                })
                .await?;
            polls = polls.saturating_add(1);
            tracing::debug!(
                run_id = %run.id,
                thread_id = %run.thread_id,
                status = %current.status,
                polls,
                "polled run status"
            );

            match current.status {
                RunStatus::Queued | RunStatus::InProgress => {
                    let wake_at = (Instant::now() + self.interval).min(deadline);
                    sleep_until(wake_at).await;
                }
                RunStatus::Completed => {
                    tracing::info!(
                        run_id = %run.id,
                        thread_id = %run.thread_id,
                        polls,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "run completed"
                    );
                    return self
                        .bounded(
                            run,
                            deadline,
                            polls,
                            extract_reply(
                                self.client.as_ref(),
                                &run.thread_id,
                                last_message_id,
                                self.message_list_limit,
                            ),
                        )
                        .await;
                }
                RunStatus::Failed => {
                    return Err(terminal(&current, RunTerminalKind::Failed));
                }
                RunStatus::Cancelled => {
                    return Err(terminal(&current, RunTerminalKind::Cancelled));
                }
                RunStatus::RequiresAction => {
                    return Err(terminal(&current, RunTerminalKind::RequiresAction));
                }
                RunStatus::Unknown(status) => {
                    return Err(RelayError::UnexpectedStatus {
                        run_id: run.id.clone(),
                        status,
                    });
                }
            }
        }
    }

    /// Runs a platform call that must not outlive the poll deadline.
    async fn bounded<T>(
        &self,
        run: &Run,
        deadline: Instant,
        polls: u32,
        call: impl Future<Output = Result<T, RelayError>>,
    ) -> Result<T, RelayError> {
        match timeout_at(deadline, call).await {
            Ok(result) => result,
            Err(_) => Err(self.timeout_error(run, polls)),
        }
    }

    fn timeout_error(&self, run: &Run, polls: u32) -> RelayError {
        tracing::warn!(
            run_id = %run.id,
            thread_id = %run.thread_id,
            polls,
            timeout_ms = self.timeout.as_millis() as u64,
            "run did not complete before deadline"
        );
        RelayError::Timeout {
            run_id: run.id.clone(),
            timeout_ms: self.timeout.as_millis() as u64,
        }
    }
}

fn terminal(run: &Run, kind: RunTerminalKind) -> RelayError {
    let detail = run
        .last_error
        .as_ref()
        .map(|error| match (error.code.is_empty(), error.message.is_empty()) {
            (false, false) => format!("{}: {}", error.code, error.message),
            (false, true) => error.code.clone(),
            _ => error.message.clone(),
        })
        .filter(|detail| !detail.is_empty())
        .unwrap_or_else(|| "no detail reported".to_string());
    tracing::warn!(
        run_id = %run.id,
        thread_id = %run.thread_id,
        status = %kind,
        detail = %detail,
        "run reached terminal status without a reply"
    );
    RelayError::RunTerminal {
        run_id: run.id.clone(),
        kind,
        detail,
    }
}
