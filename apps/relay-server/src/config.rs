use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use relay_core::LINKED_ACCOUNTS_FILE_ENV;

const DEFAULT_BIND: &str = "0.0.0.0:8080";

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub addr: SocketAddr,
    pub linked_accounts_path: PathBuf,
    pub graph_api_token: String,
    /// Overrides the Graph API base URL, mostly for tests and staging.
    pub wa_api_base: Option<String>,
    pub slack_bot_token: String,
    pub slack_api_base: Option<String>,
    pub verify_token: String,
    /// Enables `X-Hub-Signature-256` checks on WhatsApp webhooks when set.
    pub whatsapp_app_secret: Option<String>,
    /// Enables `X-Slack-Signature` checks on Slack webhooks when set.
    pub slack_signing_secret: Option<String>,
}

impl RelayConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let require = |key: &str| get(key).with_context(|| format!("{key} must be set"));

        let bind = get("BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let addr: SocketAddr = bind
            .parse()
            .with_context(|| format!("invalid BIND address {bind}"))?;

        Ok(Self {
            addr,
            linked_accounts_path: PathBuf::from(require(LINKED_ACCOUNTS_FILE_ENV)?),
            graph_api_token: require("GRAPH_API_TOKEN")?,
            wa_api_base: get("WA_API_BASE"),
            slack_bot_token: require("SLACK_BOT_TOKEN")?,
            slack_api_base: get("SLACK_API_BASE"),
            verify_token: require("WUP_WEBHOOK_VERIFY_TOKEN")?,
            whatsapp_app_secret: get("WHATSAPP_APP_SECRET"),
            slack_signing_secret: get("SLACK_SIGNING_SECRET"),
        })
    }
}
