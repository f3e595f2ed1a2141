//! Finds or lazily creates the Slack channel standing in for a WhatsApp
//! conversation.
//!
//! The contact's identity lives in the channel purpose, so the mapping needs no
//! storage of its own. Resolutions for the same contact and Slack user are
//! serialized in-process; separate replicas can still race and create twin
//! channels.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::error::{RelayError, RelayResult};
use crate::platforms::slack::SlackApi;
use crate::types::{ConversationChannel, LinkedAccount, WhatsappInitiatorDetails};

type ContactKey = (String, String);
type LockTable = DashMap<ContactKey, Arc<Mutex<()>>>;

pub struct ConversationChannelResolver {
    slack: Arc<dyn SlackApi>,
    locks: LockTable,
}

/// Exclusive hold on one contact's resolution. Dropping it releases the lock
/// and evicts the table entry once nobody else is waiting on it.
struct ContactLease<'a> {
    locks: &'a LockTable,
    key: ContactKey,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for ContactLease<'_> {
    fn drop(&mut self) {
        self.guard.take();
        self.locks
            .remove_if(&self.key, |_, lock| Arc::strong_count(lock) == 1);
    }
}

impl ConversationChannelResolver {
    pub fn new(slack: Arc<dyn SlackApi>) -> Self {
        Self {
            slack,
            locks: DashMap::new(),
        }
    }

    /// Returns the channel for `initiator`, creating and tagging one if the
    /// linked Slack user has none yet.
    pub async fn resolve(
        &self,
        account: &LinkedAccount,
        initiator: &WhatsappInitiatorDetails,
    ) -> RelayResult<ConversationChannel> {
        let _lease = self
            .acquire(&account.slack_user_id, &initiator.whatsapp_phone_number)
            .await;

        let existing = self
            .find_existing(&account.slack_user_id, &initiator.whatsapp_phone_number)
            .await
            .map_err(|err| err.into_internal("error getting existing channel"))?;
        if let Some(channel) = existing {
            tracing::debug!(channel_id = %channel.id, "reusing conversation channel");
            return Ok(channel);
        }

        self.create_channel(account, initiator).await
    }

    /// Walks every page of the user's non-archived channels and returns the
    /// first whose purpose mentions `whatsapp_phone_number`.
    ///
    /// This is a substring match: a number that is a suffix or prefix of
    /// another contact's number can hit the wrong channel.
    pub async fn find_existing(
        &self,
        slack_user_id: &str,
        whatsapp_phone_number: &str,
    ) -> RelayResult<Option<ConversationChannel>> {
        let mut cursor: Option<String> = None;
        loop {
            let page = self
                .slack
                .conversations_for_user(slack_user_id, cursor.as_deref())
                .await
                .map_err(|err| RelayError::internal("error listing conversations").with_source(err))?;

            if let Some(found) = page
                .channels
                .into_iter()
                .find(|channel| channel.metadata.contains(whatsapp_phone_number))
            {
                return Ok(Some(found));
            }

            match page.next_cursor {
                Some(next) if cursor.as_deref() != Some(next.as_str()) => cursor = Some(next),
                _ => return Ok(None),
            }
        }
    }

    async fn create_channel(
        &self,
        account: &LinkedAccount,
        initiator: &WhatsappInitiatorDetails,
    ) -> RelayResult<ConversationChannel> {
        let created = self
            .slack
            .create_conversation(&initiator.default_channel_name())
            .await
            .map_err(|err| RelayError::internal("error creating channel").with_source(err))?;

        self.slack
            .invite_user(&created.id, &account.slack_user_id)
            .await
            .map_err(|err| RelayError::internal("error inviting user to channel").with_source(err))?;

        let metadata = initiator.to_metadata().map_err(|err| {
            RelayError::internal("error marshalling initiator details").with_source(err)
        })?;

        let channel = self
            .slack
            .set_purpose(&created.id, &metadata)
            .await
            .map_err(|err| RelayError::internal("error setting channel purpose").with_source(err))?;

        tracing::info!(
            channel_id = %channel.id,
            channel_name = %created.name,
            slack_user_id = %account.slack_user_id,
            "created conversation channel"
        );
        Ok(channel)
    }

    async fn acquire(
        &self,
        slack_user_id: &str,
        whatsapp_phone_number: &str,
    ) -> ContactLease<'_> {
        let key = (slack_user_id.to_string(), whatsapp_phone_number.to_string());
        let lock = self.locks.entry(key.clone()).or_default().clone();
        let guard = lock.lock_owned().await;
        ContactLease {
            locks: &self.locks,
            key,
            guard: Some(guard),
        }
    }
}
