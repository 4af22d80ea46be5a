use std::time::Duration;

use crate::RelayError;

pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_MESSAGE_LIST_LIMIT: u32 = 20;
pub const DEFAULT_TRIGGER_PHRASE: &str = "hey crowfather";
pub const DEFAULT_SPONTANEOUS_RANGE: u32 = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Tuning for the response-retrieval protocol and the intent filter.
pub struct RelayConfig {
    /// Upper bound on how long a run may stay pending before the poll loop gives up.
    pub response_timeout: Duration,
    /// Fixed sleep between run status fetches.
    pub poll_interval: Duration,
    /// Page size used when listing messages produced by a completed run.
    pub message_list_limit: u32,
    /// Wake word that marks a chat message as addressed to the bot.
    pub trigger_phrase: String,
    /// Two uniform draws in `[0, range)` must match for an unprompted reply; 0 disables it.
    pub spontaneous_range: u32,
    /// Append non-triggering user messages to the thread without starting a run.
    pub ambient_context: bool,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            response_timeout: DEFAULT_RESPONSE_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            message_list_limit: DEFAULT_MESSAGE_LIST_LIMIT,
            trigger_phrase: DEFAULT_TRIGGER_PHRASE.to_string(),
            spontaneous_range: DEFAULT_SPONTANEOUS_RANGE,
            ambient_context: false,
        }
    }
}

impl RelayConfig {
    pub fn validate(&self) -> Result<(), RelayError> {
        if self.response_timeout.is_zero() {
            return Err(RelayError::Configuration(
                "response timeout must be greater than zero".to_string(),
            ));
        }
        if self.poll_interval.is_zero() {
            return Err(RelayError::Configuration(
                "poll interval must be greater than zero".to_string(),
            ));
        }
        if self.message_list_limit == 0 {
            return Err(RelayError::Configuration(
                "message list limit must be greater than zero".to_string(),
            ));
        }
        if self.trigger_phrase.trim().is_empty() {
            return Err(RelayError::Configuration(
                "trigger phrase cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}
