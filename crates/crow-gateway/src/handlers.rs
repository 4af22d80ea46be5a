use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use crow_groupme::GroupMeMessage;
use crow_relay::{ChatMessage, ChatOutcome, RelayError, MELTDOWN_CONTEXT_ID, TEST_CONTEXT_ID};
use serde_json::json;

use crate::auth::authorize_api_key;
use crate::server::GatewayState;
use crate::types::{ApiKeyQuery, DirectQueryRequest, GatewayApiError, RelayResponse};

pub(crate) async fn handle_ping() -> Json<serde_json::Value> {
    Json(json!({"message": "pong"}))
}

pub(crate) async fn handle_message(
    State(state): State<Arc<GatewayState>>,
    body: Bytes,
) -> Response {
    let message = match serde_json::from_slice::<GroupMeMessage>(&body) {
        Ok(message) => message,
        Err(error) => {
            return GatewayApiError::bad_request(format!("failed to parse request body: {error}"))
                .into_response();
        }
    };
    let chat = ChatMessage::new(
        message.group_id.clone(),
        message.sender_type.clone(),
        message.text.clone(),
    );

    let outcome = state
        .relay
        .handle_chat_message(&chat, &state.assistants.chat)
        .await;
    let reply = match outcome {
        Ok(ChatOutcome::Replied(reply)) => reply,
        Ok(ChatOutcome::Ignored | ChatOutcome::Recorded { .. }) => {
            return Json(RelayResponse::empty()).into_response();
        }
        Err(RelayError::Validation(reason)) => {
            tracing::debug!(group_id = %message.group_id, reason = %reason, "ignored callback");
            return Json(RelayResponse::ignored(reason)).into_response();
        }
        Err(error) => {
            tracing::warn!(
                group_id = %message.group_id,
                code = error.code(),
                error = %error,
                "chat relay failed"
            );
            return GatewayApiError::from(error).into_response();
        }
    };

    if message.has_user() {
        if let Err(error) = state.notifier.send_reply(&message, &reply.text).await {
            tracing::warn!(group_id = %message.group_id, error = %error, "reply delivery failed");
            return GatewayApiError::notification_failed(error.to_string()).into_response();
        }
    }
    tracing::info!(
        group_id = %message.group_id,
        thread_id = %reply.thread_id,
        "relayed chat reply"
    );
    Json(RelayResponse::reply(reply.text)).into_response()
}

pub(crate) async fn handle_test(
    State(state): State<Arc<GatewayState>>,
    Query(query): Query<ApiKeyQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let assistant_id = state.assistants.test.clone();
    direct_query(&state, &query, &headers, &body, TEST_CONTEXT_ID, &assistant_id).await
}

pub(crate) async fn handle_meltdown(
    State(state): State<Arc<GatewayState>>,
    Query(query): Query<ApiKeyQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let assistant_id = state.assistants.meltdown.clone();
    direct_query(
        &state,
        &query,
        &headers,
        &body,
        MELTDOWN_CONTEXT_ID,
        &assistant_id,
    )
    .await
}

async fn direct_query(
    state: &GatewayState,
    query: &ApiKeyQuery,
    headers: &HeaderMap,
    body: &[u8],
    context_id: &str,
    assistant_id: &str,
) -> Response {
    if let Err(error) = authorize_api_key(&state.api_key, headers, query) {
        return error.into_response();
    }
    let request = match serde_json::from_slice::<DirectQueryRequest>(body) {
        Ok(request) => request,
        Err(error) => {
            return GatewayApiError::bad_request(format!("failed to parse request body: {error}"))
                .into_response();
        }
    };
    if request.text.trim().is_empty() {
        return GatewayApiError::bad_request("text cannot be empty").into_response();
    }

    match state
        .relay
        .handle_direct_query(context_id, &request.text, assistant_id)
        .await
    {
        Ok(reply) => {
            tracing::info!(context_id, thread_id = %reply.thread_id, "answered direct query");
            Json(RelayResponse::reply(reply.text)).into_response()
        }
        Err(error) => {
            tracing::warn!(context_id, code = error.code(), error = %error, "direct query failed");
            GatewayApiError::from(error).into_response()
        }
    }
}
