//! HTTP surface for the crowfather relay.
//!
//! `/message` receives GroupMe bot callbacks and posts replies back to the
//! group; `/test` and `/meltdown` answer direct queries behind the API key.

mod auth;
mod handlers;
mod server;
mod types;

pub use server::{
    build_gateway_router, run_gateway_server, AssistantIds, GatewayServerConfig, GatewayState,
};

pub const PING_ENDPOINT: &str = "/ping";
pub const MESSAGE_ENDPOINT: &str = "/message";
pub const TEST_ENDPOINT: &str = "/test";
pub const MELTDOWN_ENDPOINT: &str = "/meltdown";
