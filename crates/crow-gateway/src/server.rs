//! Server bootstrap and router wiring.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::routing::{get, post};
use axum::Router;
use crow_groupme::ReplyNotifier;
use crow_relay::AssistantRelay;
use tokio::net::TcpListener;

use crate::handlers::{handle_meltdown, handle_message, handle_ping, handle_test};
use crate::{MELTDOWN_ENDPOINT, MESSAGE_ENDPOINT, PING_ENDPOINT, TEST_ENDPOINT};

#[derive(Debug, Clone, PartialEq, Eq)]
/// Assistant persona per route.
pub struct AssistantIds {
    pub chat: String,
    pub test: String,
    pub meltdown: String,
}

#[derive(Debug, Clone)]
pub struct GatewayServerConfig {
    pub bind: String,
    pub api_key: String,
    pub assistants: AssistantIds,
}

pub struct GatewayState {
    pub(crate) relay: Arc<AssistantRelay>,
    pub(crate) notifier: Arc<dyn ReplyNotifier>,
    pub(crate) assistants: AssistantIds,
    pub(crate) api_key: String,
}

impl GatewayState {
    pub fn new(
        relay: Arc<AssistantRelay>,
        notifier: Arc<dyn ReplyNotifier>,
        api_key: impl Into<String>,
        assistants: AssistantIds,
    ) -> Self {
        Self {
            relay,
            notifier,
            assistants,
            api_key: api_key.into(),
        }
    }
}

pub fn build_gateway_router(state: Arc<GatewayState>) -> Router {
    Router::new()
        .route(PING_ENDPOINT, get(handle_ping))
        .route(MESSAGE_ENDPOINT, post(handle_message))
        .route(TEST_ENDPOINT, post(handle_test))
        .route(MELTDOWN_ENDPOINT, post(handle_meltdown))
        .with_state(state)
}

/// Binds `config.bind` and serves until Ctrl-C.
pub async fn run_gateway_server(
    config: GatewayServerConfig,
    relay: Arc<AssistantRelay>,
    notifier: Arc<dyn ReplyNotifier>,
) -> Result<()> {
    let bind_addr = config
        .bind
        .parse::<SocketAddr>()
        .with_context(|| format!("invalid bind address '{}'", config.bind))?;
    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind crowfather gateway on {bind_addr}"))?;
    let local_addr = listener
        .local_addr()
        .context("failed to resolve bound gateway address")?;
    tracing::info!(addr = %local_addr, "crowfather gateway listening");

    let state = Arc::new(GatewayState::new(
        relay,
        notifier,
        config.api_key,
        config.assistants,
    ));
    axum::serve(listener, build_gateway_router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown signal received");
        })
        .await
        .context("crowfather gateway exited unexpectedly")?;
    Ok(())
}
