use std::path::PathBuf;

use clap::{ArgAction, Parser};
use crow_assistants::DEFAULT_OPENAI_API_BASE;
use crow_groupme::{DEFAULT_GROUPME_API_BASE, DEFAULT_GROUPME_TIMEOUT_MS};
use crow_relay::{
    DEFAULT_SPONTANEOUS_RANGE, DEFAULT_TRANSCRIPT_CAPACITY, DEFAULT_TRIGGER_PHRASE,
};

#[derive(Debug, Parser)]
#[command(
    name = "crowfather",
    about = "GroupMe bot that relays group chat to an OpenAI assistant",
    version
)]
pub(crate) struct Cli {
    #[arg(
        long = "openai-api-key",
        env = "OPENAI_API_KEY",
        hide_env_values = true,
        help = "API key for the OpenAI Assistants API"
    )]
    pub(crate) openai_api_key: Option<String>,

    #[arg(
        long = "openai-base-url",
        env = "OPENAI_BASE_URL",
        default_value = DEFAULT_OPENAI_API_BASE,
        help = "Base URL of the Assistants API"
    )]
    pub(crate) openai_base_url: String,

    #[arg(
        long = "openai-organization",
        env = "OPENAI_ORGANIZATION",
        help = "Optional OpenAI organization header value"
    )]
    pub(crate) openai_organization: Option<String>,

    #[arg(
        long = "openai-request-timeout-ms",
        env = "CROW_OPENAI_REQUEST_TIMEOUT_MS",
        default_value_t = 30_000,
        help = "Per-request HTTP timeout for Assistants API calls"
    )]
    pub(crate) openai_request_timeout_ms: u64,

    #[arg(
        long = "groupme-bot-id",
        env = "GROUPME_BOT_ID",
        help = "GroupMe bot id used when posting replies"
    )]
    pub(crate) groupme_bot_id: Option<String>,

    #[arg(
        long = "groupme-bot-token",
        env = "GROUPME_BOT_TOKEN",
        hide_env_values = true,
        help = "GroupMe access token sent in the Authorization header"
    )]
    pub(crate) groupme_bot_token: Option<String>,

    #[arg(
        long = "groupme-api-base",
        env = "GROUPME_API_BASE",
        default_value = DEFAULT_GROUPME_API_BASE,
        help = "Base URL of the GroupMe API"
    )]
    pub(crate) groupme_api_base: String,

    #[arg(
        long = "groupme-timeout-ms",
        env = "GROUPME_TIMEOUT_MS",
        default_value_t = DEFAULT_GROUPME_TIMEOUT_MS,
        help = "HTTP timeout for posting replies to GroupMe"
    )]
    pub(crate) groupme_timeout_ms: u64,

    #[arg(
        long = "api-key",
        env = "API_KEY",
        hide_env_values = true,
        help = "Key required by the /test and /meltdown endpoints"
    )]
    pub(crate) api_key: Option<String>,

    #[arg(
        long = "groupme-assistant-id",
        env = "GROUPME_ASSISTANT_ID",
        help = "Assistant persona that answers group chat"
    )]
    pub(crate) groupme_assistant_id: Option<String>,

    #[arg(
        long = "meltdown-assistant-id",
        env = "MELTDOWN_ASSISTANT_ID",
        help = "Assistant persona behind /meltdown"
    )]
    pub(crate) meltdown_assistant_id: Option<String>,

    #[arg(
        long = "test-assistant-id",
        env = "TEST_ASSISTANT_ID",
        help = "Assistant persona behind /test"
    )]
    pub(crate) test_assistant_id: Option<String>,

    #[arg(
        long,
        env = "CROW_BIND",
        default_value = "0.0.0.0:8080",
        help = "Socket address the HTTP gateway binds"
    )]
    pub(crate) bind: String,

    #[arg(
        long = "response-timeout-ms",
        env = "CROW_RESPONSE_TIMEOUT_MS",
        default_value_t = 60_000,
        help = "How long a run may stay pending before the request times out"
    )]
    pub(crate) response_timeout_ms: u64,

    #[arg(
        long = "poll-interval-ms",
        env = "CROW_POLL_INTERVAL_MS",
        default_value_t = 5_000,
        help = "Fixed interval between run status fetches"
    )]
    pub(crate) poll_interval_ms: u64,

    #[arg(
        long = "thread-store",
        env = "CROW_THREAD_STORE",
        help = "SQLite file for context/thread mappings; in-memory when unset"
    )]
    pub(crate) thread_store: Option<PathBuf>,

    #[arg(
        long = "transcript-capacity",
        env = "CROW_TRANSCRIPT_CAPACITY",
        default_value_t = DEFAULT_TRANSCRIPT_CAPACITY,
        help = "Recent messages kept by the in-memory store; 0 disables its transcript"
    )]
    pub(crate) transcript_capacity: usize,

    #[arg(
        long = "trigger-phrase",
        env = "CROW_TRIGGER_PHRASE",
        default_value = DEFAULT_TRIGGER_PHRASE,
        help = "Wake phrase that addresses the bot"
    )]
    pub(crate) trigger_phrase: String,

    #[arg(
        long = "spontaneous-range",
        env = "CROW_SPONTANEOUS_RANGE",
        default_value_t = DEFAULT_SPONTANEOUS_RANGE,
        help = "Unprompted replies fire with odds 1/N; 0 disables them"
    )]
    pub(crate) spontaneous_range: u32,

    #[arg(
        long = "ambient-context",
        env = "CROW_AMBIENT_CONTEXT",
        default_value_t = false,
        action = ArgAction::Set,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        help = "Append non-triggering messages to the group thread without replying"
    )]
    pub(crate) ambient_context: bool,
}
