//! Validated runtime configuration built from the parsed command line.

use std::path::PathBuf;
use std::time::Duration;

use crow_assistants::OpenAiAssistantsConfig;
use crow_gateway::{AssistantIds, GatewayServerConfig};
use crow_groupme::GroupMeConfig;
use crow_relay::RelayConfig;
use thiserror::Error;

use crate::cli_args::Cli;

#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum ConfigError {
    #[error("missing required configuration: {0}")]
    Missing(&'static str),
    #[error("invalid configuration {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub(crate) struct AppConfig {
    pub(crate) assistants: OpenAiAssistantsConfig,
    pub(crate) groupme: GroupMeConfig,
    pub(crate) relay: RelayConfig,
    pub(crate) gateway: GatewayServerConfig,
    pub(crate) thread_store: Option<PathBuf>,
    pub(crate) transcript_capacity: usize,
}

impl AppConfig {
    pub(crate) fn from_cli(cli: Cli) -> Result<Self, ConfigError> {
        let openai_api_key = required("OPENAI_API_KEY", cli.openai_api_key)?;
        let groupme_bot_id = required("GROUPME_BOT_ID", cli.groupme_bot_id)?;
        let groupme_bot_token = required("GROUPME_BOT_TOKEN", cli.groupme_bot_token)?;
        let api_key = required("API_KEY", cli.api_key)?;
        let chat = required("GROUPME_ASSISTANT_ID", cli.groupme_assistant_id)?;
        let meltdown = required("MELTDOWN_ASSISTANT_ID", cli.meltdown_assistant_id)?;
        let test = required("TEST_ASSISTANT_ID", cli.test_assistant_id)?;

        let response_timeout = positive_millis("CROW_RESPONSE_TIMEOUT_MS", cli.response_timeout_ms)?;
        let poll_interval = positive_millis("CROW_POLL_INTERVAL_MS", cli.poll_interval_ms)?;
        if cli.trigger_phrase.trim().is_empty() {
            return Err(ConfigError::Invalid {
                name: "CROW_TRIGGER_PHRASE",
                reason: "trigger phrase cannot be empty".to_string(),
            });
        }

        Ok(Self {
            assistants: OpenAiAssistantsConfig {
                api_base: cli.openai_base_url,
                api_key: openai_api_key,
                organization: cli
                    .openai_organization
                    .map(|value| value.trim().to_string())
                    .filter(|value| !value.is_empty()),
                request_timeout_ms: cli.openai_request_timeout_ms,
            },
            groupme: GroupMeConfig {
                api_base: cli.groupme_api_base,
                bot_id: groupme_bot_id,
                bot_token: groupme_bot_token,
                timeout_ms: cli.groupme_timeout_ms,
            },
            relay: RelayConfig {
                response_timeout,
                poll_interval,
                trigger_phrase: cli.trigger_phrase,
                spontaneous_range: cli.spontaneous_range,
                ambient_context: cli.ambient_context,
                ..RelayConfig::default()
            },
            gateway: GatewayServerConfig {
                bind: cli.bind,
                api_key,
                assistants: AssistantIds {
                    chat,
                    test,
                    meltdown,
                },
            },
            thread_store: cli.thread_store,
            transcript_capacity: cli.transcript_capacity,
        })
    }
}

fn required(name: &'static str, value: Option<String>) -> Result<String, ConfigError> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or(ConfigError::Missing(name))
}

fn positive_millis(name: &'static str, value: u64) -> Result<Duration, ConfigError> {
    if value == 0 {
        return Err(ConfigError::Invalid {
            name,
            reason: "must be greater than 0".to_string(),
        });
    }
    Ok(Duration::from_millis(value))
}
