//! Read-only lookup of linked accounts.
//!
//! The directory is loaded once at startup and shared by handle; it is never
//! mutated while requests are being served.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::error::{RelayError, RelayResult};
use crate::types::LinkedAccount;

/// Environment variable naming the linked-account JSON file.
pub const LINKED_ACCOUNTS_FILE_ENV: &str = "LINKED_ACCOUNTS_FILE_STORE";

pub trait LinkedAccountDirectory: Send + Sync {
    /// Finds the account whose business phone number id or Slack user id equals `id`.
    ///
    /// Returns a [`crate::ErrorKind::NotFound`] error when nothing matches.
    fn lookup(&self, id: &str) -> RelayResult<LinkedAccount>;
}

/// Directory backed by an ordered, in-memory list of accounts.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    accounts: Vec<LinkedAccount>,
}

impl StaticDirectory {
    pub fn new(accounts: Vec<LinkedAccount>) -> Self {
        Self { accounts }
    }

    /// Reads a JSON array of `{whatsapp_business_phone_number_id, slack_user_id}` records.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read linked accounts from {}", path.display()))?;
        let accounts: Vec<LinkedAccount> = serde_json::from_str(&raw)
            .with_context(|| format!("invalid linked accounts json in {}", path.display()))?;
        tracing::info!(
            path = %path.display(),
            accounts = accounts.len(),
            "loaded linked accounts"
        );
        Ok(Self { accounts })
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

impl LinkedAccountDirectory for StaticDirectory {
    fn lookup(&self, id: &str) -> RelayResult<LinkedAccount> {
        self.accounts
            .iter()
            .find(|account| account.matches(id))
            .cloned()
            .ok_or_else(|| RelayError::not_found(format!("linked account not found: {id}")))
    }
}
