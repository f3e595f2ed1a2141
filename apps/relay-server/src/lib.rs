//! HTTP front end for the WhatsApp ⇄ Slack relay.
pub mod config;
pub mod http;
pub mod security;

use std::sync::Arc;

use anyhow::Result;
use relay_core::{GraphApiSender, MessageRelay, SlackWebClient, StaticDirectory};

use crate::config::RelayConfig;
use crate::http::AppState;

/// Loads the linked accounts and wires the platform clients into the shared state.
pub fn build_state(config: &RelayConfig) -> Result<AppState> {
    let directory = StaticDirectory::from_json_file(&config.linked_accounts_path)?;
    if directory.is_empty() {
        tracing::warn!("no linked accounts configured; every message will fail to relay");
    }

    let http = reqwest::Client::new();
    let whatsapp = GraphApiSender::new(
        http.clone(),
        config.graph_api_token.clone(),
        config.wa_api_base.clone(),
    );
    let slack = SlackWebClient::new(
        http,
        config.slack_bot_token.clone(),
        config.slack_api_base.clone(),
    );
    let relay = MessageRelay::new(Arc::new(directory), Arc::new(whatsapp), Arc::new(slack));

    Ok(AppState::new(Arc::new(relay), config.verify_token.clone())
        .with_whatsapp_app_secret(config.whatsapp_app_secret.clone())
        .with_slack_signing_secret(config.slack_signing_secret.clone()))
}
