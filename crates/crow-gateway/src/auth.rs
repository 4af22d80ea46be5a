use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;

use crate::types::{ApiKeyQuery, GatewayApiError};

/// Accepts the key as a raw or `Bearer` Authorization value, or as `?api_key=`.
pub(crate) fn authorize_api_key(
    expected: &str,
    headers: &HeaderMap,
    query: &ApiKeyQuery,
) -> Result<(), GatewayApiError> {
    let expected = expected.trim();
    if expected.is_empty() {
        return Err(GatewayApiError::unauthorized());
    }
    let observed = header_api_key(headers).or_else(|| {
        query
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    });
    match observed {
        Some(observed) if observed == expected => Ok(()),
        _ => {
            tracing::warn!("rejected request with missing or invalid api key");
            Err(GatewayApiError::unauthorized())
        }
    }
}

fn header_api_key(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
    let token = raw.strip_prefix("Bearer ").unwrap_or(raw).trim();
    if token.is_empty() {
        return None;
    }
    Some(token.to_string())
}
