mod app_config;
mod bootstrap_helpers;
mod cli_args;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use crow_assistants::OpenAiAssistantsClient;
use crow_gateway::run_gateway_server;
use crow_groupme::GroupMeNotifier;
use crow_relay::{AssistantRelay, InMemoryThreadStore, SqliteThreadStore, ThreadRngRoll, ThreadStore};

use crate::app_config::AppConfig;
use crate::bootstrap_helpers::init_tracing;
use crate::cli_args::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = AppConfig::from_cli(cli).context("invalid crowfather configuration")?;
    run(config).await
}

async fn run(config: AppConfig) -> Result<()> {
    let client = OpenAiAssistantsClient::new(config.assistants)
        .context("failed to create assistants client")?;

    let store: Arc<dyn ThreadStore> = match &config.thread_store {
        Some(path) => {
            let store = SqliteThreadStore::new(path)
                .with_context(|| format!("failed to open thread store {}", path.display()))?;
            tracing::info!(path = %path.display(), "using sqlite thread store");
            Arc::new(store)
        }
        None => {
            tracing::info!(
                transcript_capacity = config.transcript_capacity,
                "using in-memory thread store"
            );
            Arc::new(InMemoryThreadStore::with_transcript_capacity(
                config.transcript_capacity,
            ))
        }
    };

    let relay = AssistantRelay::new(
        Arc::new(client),
        store,
        Arc::new(ThreadRngRoll),
        config.relay,
    )
    .context("failed to create assistant relay")?;
    let notifier =
        GroupMeNotifier::new(config.groupme).context("failed to create groupme notifier")?;

    run_gateway_server(config.gateway, Arc::new(relay), Arc::new(notifier)).await
}
