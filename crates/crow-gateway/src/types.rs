//! Request/response bodies and the JSON error envelope.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use crow_relay::RelayError;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Error payload rendered as `{"error":{"type","code","message"}}`.
#[derive(Debug)]
pub(crate) struct GatewayApiError {
    pub(crate) status: StatusCode,
    pub(crate) code: &'static str,
    pub(crate) message: String,
}

impl GatewayApiError {
    pub(crate) fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub(crate) fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "invalid_request", message)
    }

    pub(crate) fn unauthorized() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            "unauthorized",
            "missing or invalid api key",
        )
    }

    pub(crate) fn notification_failed(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, "notification_failed", message)
    }
}

impl From<RelayError> for GatewayApiError {
    fn from(error: RelayError) -> Self {
        let status = match &error {
            RelayError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            RelayError::Validation(_) => StatusCode::BAD_REQUEST,
            RelayError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            RelayError::Platform { .. }
            | RelayError::RunTerminal { .. }
            | RelayError::UnexpectedStatus { .. }
            | RelayError::ResponseFormat(_) => StatusCode::BAD_GATEWAY,
        };
        Self::new(status, error.code(), error.to_string())
    }
}

impl IntoResponse for GatewayApiError {
    fn into_response(self) -> Response {
        let error_type = if self.status.is_client_error() {
            "invalid_request_error"
        } else {
            "server_error"
        };
        (
            self.status,
            Json(json!({
                "error": {
                    "type": error_type,
                    "code": self.code,
                    "message": self.message,
                }
            })),
        )
            .into_response()
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct DirectQueryRequest {
    pub(crate) text: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ApiKeyQuery {
    #[serde(default)]
    pub(crate) api_key: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct RelayResponse {
    pub(crate) response: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) ignored: Option<String>,
}

impl RelayResponse {
    pub(crate) fn reply(text: impl Into<String>) -> Self {
        Self {
            response: text.into(),
            ignored: None,
        }
    }

    pub(crate) fn empty() -> Self {
        Self::reply(String::new())
    }

    pub(crate) fn ignored(reason: impl Into<String>) -> Self {
        Self {
            response: String::new(),
            ignored: Some(reason.into()),
        }
    }
}
