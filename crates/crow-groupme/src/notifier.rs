//! Outbound reply delivery through the GroupMe bots API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use thiserror::Error;

use crate::{GroupMeMessage, GroupMeSendRequest};

pub const DEFAULT_GROUPME_API_BASE: &str = "https://api.groupme.com";
pub const DEFAULT_GROUPME_TIMEOUT_MS: u64 = 20_000;
const BOT_POST_PATH: &str = "/v3/bots/post";
const ERROR_BODY_LIMIT: usize = 512;

#[derive(Debug, Error)]
pub enum GroupMeError {
    #[error("groupme bot id is empty")]
    MissingBotId,
    #[error("groupme bot token is invalid: {0}")]
    InvalidToken(String),
    #[error("groupme request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("groupme rejected bot post with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

#[async_trait]
/// Delivery seam for replies; success means the platform accepted the post.
pub trait ReplyNotifier: Send + Sync {
    async fn send_reply(&self, message: &GroupMeMessage, reply: &str) -> Result<(), GroupMeError>;
}

#[derive(Debug, Clone)]
pub struct GroupMeConfig {
    pub api_base: String,
    pub bot_id: String,
    pub bot_token: String,
    pub timeout_ms: u64,
}

impl GroupMeConfig {
    pub fn new(bot_id: impl Into<String>, bot_token: impl Into<String>) -> Self {
        Self {
            api_base: DEFAULT_GROUPME_API_BASE.to_string(),
            bot_id: bot_id.into(),
            bot_token: bot_token.into(),
            timeout_ms: DEFAULT_GROUPME_TIMEOUT_MS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GroupMeNotifier {
    http: reqwest::Client,
    endpoint: String,
    bot_id: String,
}

impl GroupMeNotifier {
    pub fn new(config: GroupMeConfig) -> Result<Self, GroupMeError> {
        let bot_id = config.bot_id.trim().to_string();
        if bot_id.is_empty() {
            return Err(GroupMeError::MissingBotId);
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        // GroupMe expects the raw token, not a bearer credential.
        let mut token = HeaderValue::from_str(config.bot_token.trim())
            .map_err(|error| GroupMeError::InvalidToken(error.to_string()))?;
        token.set_sensitive(true);
        headers.insert(AUTHORIZATION, token);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(config.timeout_ms.max(1)))
            .build()?;

        Ok(Self {
            http,
            endpoint: format!(
                "{}{}",
                config.api_base.trim_end_matches('/'),
                BOT_POST_PATH
            ),
            bot_id,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn payload(&self, message: &GroupMeMessage, reply: &str) -> GroupMeSendRequest {
        GroupMeSendRequest {
            bot_id: self.bot_id.clone(),
            text: message.mention(reply),
        }
    }
}

#[async_trait]
impl ReplyNotifier for GroupMeNotifier {
    async fn send_reply(&self, message: &GroupMeMessage, reply: &str) -> Result<(), GroupMeError> {
        let payload = self.payload(message, reply);
        let response = self.http.post(&self.endpoint).json(&payload).send().await?;
        let status = response.status();
        if status != StatusCode::ACCEPTED {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(
                status = status.as_u16(),
                group_id = %message.group_id,
                "groupme rejected bot post"
            );
            return Err(GroupMeError::Rejected {
                status: status.as_u16(),
                body: truncate_for_error(&body, ERROR_BODY_LIMIT),
            });
        }
        tracing::info!(group_id = %message.group_id, "posted reply to groupme");
        Ok(())
    }
}

fn truncate_for_error(body: &str, limit: usize) -> String {
    if body.chars().count() <= limit {
        return body.to_string();
    }
    let mut truncated = body.chars().take(limit).collect::<String>();
    truncated.push_str("...");
    truncated
}
