use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::{
    new_request_id, AssistantApiError, AssistantThread, AssistantsClient, MessageListQuery,
    MessagePage, Run, ThreadMessage,
};

pub const DEFAULT_OPENAI_API_BASE: &str = "https://api.openai.com/v1";
const ASSISTANTS_BETA_HEADER: &str = "assistants=v2";

#[derive(Debug, Clone)]
/// Connection settings for the OpenAI Assistants API.
pub struct OpenAiAssistantsConfig {
    pub api_base: String,
    pub api_key: String,
    pub organization: Option<String>,
    pub request_timeout_ms: u64,
}

impl OpenAiAssistantsConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_base: DEFAULT_OPENAI_API_BASE.to_string(),
            api_key: api_key.into(),
            organization: None,
            request_timeout_ms: 30_000,
        }
    }
}

#[derive(Debug, Clone)]
/// HTTP implementation of [`AssistantsClient`] against the OpenAI Assistants API.
pub struct OpenAiAssistantsClient {
    client: reqwest::Client,
    config: OpenAiAssistantsConfig,
}

impl OpenAiAssistantsClient {
    pub fn new(config: OpenAiAssistantsConfig) -> Result<Self, AssistantApiError> {
        if config.api_key.trim().is_empty() {
            return Err(AssistantApiError::MissingApiKey);
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "OpenAI-Beta",
            HeaderValue::from_static(ASSISTANTS_BETA_HEADER),
        );

        let bearer = format!("Bearer {}", config.api_key.trim());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&bearer).map_err(|e| {
                AssistantApiError::InvalidResponse(format!("invalid API key header: {e}"))
            })?,
        );

        if let Some(org) = config
            .organization
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
        {
            headers.insert(
                "OpenAI-Organization",
                HeaderValue::from_str(org).map_err(|e| {
                    AssistantApiError::InvalidResponse(format!("invalid organization header: {e}"))
                })?,
            );
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_millis(
                config.request_timeout_ms.max(1),
            ))
            .build()?;

        Ok(Self { client, config })
    }

    fn endpoint(&self, path: &str) -> String {
        let base = self.config.api_base.trim_end_matches('/');
        format!("{base}/{}", path.trim_start_matches('/'))
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &Value,
    ) -> Result<T, AssistantApiError> {
        let url = self.endpoint(path);
        let request = self
            .client
            .post(&url)
            .header("x-crow-request-id", new_request_id())
            .json(body);
        self.send(request, &url).await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&'static str, String)],
    ) -> Result<T, AssistantApiError> {
        let url = self.endpoint(path);
        let request = self
            .client
            .get(&url)
            .header("x-crow-request-id", new_request_id())
            .query(query);
        self.send(request, &url).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        url: &str,
    ) -> Result<T, AssistantApiError> {
        let response = request.send().await?;
        let status = response.status();
        let raw = response.text().await?;
        if !status.is_success() {
            tracing::debug!(
                url,
                status = status.as_u16(),
                "assistant platform request rejected"
            );
            return Err(AssistantApiError::HttpStatus {
                status: status.as_u16(),
                body: raw,
            });
        }
        Ok(serde_json::from_str::<T>(&raw)?)
    }
}

#[async_trait]
impl AssistantsClient for OpenAiAssistantsClient {
    async fn create_thread(&self) -> Result<AssistantThread, AssistantApiError> {
        let thread: AssistantThread = self.post_json("threads", &json!({})).await?;
        if thread.id.trim().is_empty() {
            return Err(AssistantApiError::InvalidResponse(
                "thread create response did not include an id".to_string(),
            ));
        }
        Ok(thread)
    }

    async fn create_message(
        &self,
        thread_id: &str,
        text: &str,
    ) -> Result<ThreadMessage, AssistantApiError> {
        self.post_json(
            &format!("threads/{thread_id}/messages"),
            &json!({
                "role": "user",
                "content": text,
            }),
        )
        .await
    }

    async fn create_run(
        &self,
        thread_id: &str,
        assistant_id: &str,
    ) -> Result<Run, AssistantApiError> {
        self.post_json(
            &format!("threads/{thread_id}/runs"),
            &json!({ "assistant_id": assistant_id }),
        )
        .await
    }

    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<Run, AssistantApiError> {
        self.get_json(&format!("threads/{thread_id}/runs/{run_id}"), &[])
            .await
    }

    async fn list_messages(
        &self,
        thread_id: &str,
        query: &MessageListQuery,
    ) -> Result<MessagePage, AssistantApiError> {
        self.get_json(
            &format!("threads/{thread_id}/messages"),
            &query.to_query_pairs(),
        )
        .await
    }
}
