//! End-to-end handling of one inbound webhook in either direction.

use std::sync::Arc;

use relay_telemetry::{
    Direction, RelayLabels, record_failed, record_forwarded, record_ignored, start_relay_span,
    with_common_fields,
};
use serde_json::Value;
use tracing::{Instrument, Span};

use crate::challenge::{ChallengeResponse, slack_url_verification};
use crate::directory::LinkedAccountDirectory;
use crate::error::{RelayError, RelayResult};
use crate::events::{InboundEvent, classify_slack, classify_whatsapp, extract_initiator};
use crate::platforms::slack::SlackApi;
use crate::platforms::whatsapp::WhatsappApi;
use crate::resolver::ConversationChannelResolver;

/// What the relay did with an inbound payload. Every variant answers 200.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    Forwarded,
    Ignored { reason: String },
    Challenge(ChallengeResponse),
}

impl RelayOutcome {
    fn ignored(event: InboundEvent) -> Self {
        let reason = match event {
            InboundEvent::Ignored { reason } => reason,
            other => format!("event not handled here: {other:?}"),
        };
        tracing::debug!(%reason, "ignoring inbound event");
        RelayOutcome::Ignored { reason }
    }
}

pub struct MessageRelay {
    directory: Arc<dyn LinkedAccountDirectory>,
    whatsapp: Arc<dyn WhatsappApi>,
    slack: Arc<dyn SlackApi>,
    resolver: ConversationChannelResolver,
}

impl MessageRelay {
    pub fn new(
        directory: Arc<dyn LinkedAccountDirectory>,
        whatsapp: Arc<dyn WhatsappApi>,
        slack: Arc<dyn SlackApi>,
    ) -> Self {
        let resolver = ConversationChannelResolver::new(slack.clone());
        Self {
            directory,
            whatsapp,
            slack,
            resolver,
        }
    }

    /// Handles a raw WhatsApp webhook body. A body that is not JSON is rejected
    /// as a bad request.
    pub async fn handle_whatsapp_body(&self, body: &[u8]) -> RelayResult<RelayOutcome> {
        let payload: Value = serde_json::from_slice(body).map_err(|err| {
            RelayError::bad_request("error reading body for whatsapp initiated message")
                .with_source(err)
        })?;
        self.relay_whatsapp(&payload).await
    }

    /// Handles a raw Slack Events API body. A body that is not JSON is ignored.
    pub async fn handle_slack_body(&self, body: &[u8]) -> RelayResult<RelayOutcome> {
        match serde_json::from_slice::<Value>(body) {
            Ok(payload) => self.relay_slack(&payload).await,
            Err(err) => {
                tracing::warn!(error = %err, "slack payload is not json");
                Ok(RelayOutcome::Ignored {
                    reason: "payload is not json".into(),
                })
            }
        }
    }

    pub async fn relay_whatsapp(&self, payload: &Value) -> RelayResult<RelayOutcome> {
        let labels = RelayLabels::new(Direction::WhatsappToSlack);
        let span = start_relay_span(&labels);
        let result = self.whatsapp_to_slack(payload).instrument(span).await;
        record_outcome(&labels, &result);
        result
    }

    pub async fn relay_slack(&self, payload: &Value) -> RelayResult<RelayOutcome> {
        let labels = RelayLabels::new(Direction::SlackToWhatsapp);
        let span = start_relay_span(&labels);
        let result = self.slack_to_whatsapp(payload).instrument(span).await;
        record_outcome(&labels, &result);
        result
    }

    async fn whatsapp_to_slack(&self, payload: &Value) -> RelayResult<RelayOutcome> {
        let (business_phone_number_id, message_id, from_wa_id, body_text, contacts) =
            match classify_whatsapp(payload) {
                InboundEvent::WhatsappTextMessage {
                    business_phone_number_id,
                    message_id,
                    from_wa_id,
                    body_text,
                    contacts,
                } => (business_phone_number_id, message_id, from_wa_id, body_text, contacts),
                event => return Ok(RelayOutcome::ignored(event)),
            };
        with_common_fields(
            &Span::current(),
            Some(from_wa_id.as_str()),
            Some(message_id.as_str()),
        );

        let account = self
            .directory
            .lookup(&business_phone_number_id)
            .map_err(|err| {
                err.context("error looking up linked account for whatsapp initiated message")
            })?;

        let initiator = extract_initiator(&from_wa_id, &contacts)
            .map_err(|err| err.context("error getting whatsapp initiator details"))?;

        let channel = self
            .resolver
            .resolve(&account, &initiator)
            .await
            .map_err(|err| err.context("error getting slack channel"))?;

        self.slack
            .post_message_as(&channel.id, &body_text, &initiator.name)
            .await
            .map_err(|err| {
                RelayError::internal("error forwarding whatsapp message to slack").with_source(err)
            })?;

        self.whatsapp
            .mark_as_read(&business_phone_number_id, &message_id)
            .await
            .map_err(|err| {
                RelayError::internal("error marking message as read in whatsapp").with_source(err)
            })?;

        tracing::info!(channel_id = %channel.id, "forwarded whatsapp message to slack");
        Ok(RelayOutcome::Forwarded)
    }

    async fn slack_to_whatsapp(&self, payload: &Value) -> RelayResult<RelayOutcome> {
        let (channel_id, slack_user_id, body_text) = match classify_slack(payload) {
            InboundEvent::SlackUrlVerification { challenge } => {
                tracing::info!("answering slack url verification");
                return Ok(RelayOutcome::Challenge(slack_url_verification(&challenge)));
            }
            InboundEvent::SlackMessageEvent {
                channel_id,
                slack_user_id,
                body_text,
            } => (channel_id, slack_user_id, body_text),
            event => return Ok(RelayOutcome::ignored(event)),
        };
        with_common_fields(&Span::current(), Some(channel_id.as_str()), None);

        let channel = self
            .slack
            .conversation_info(&channel_id)
            .await
            .map_err(|err| RelayError::internal("error getting slack channel").with_source(err))?;

        let initiator = channel.initiator().map_err(|err| {
            RelayError::internal("error getting whatsapp details from channel purpose")
                .with_source(err)
        })?;

        let account = self.directory.lookup(&slack_user_id).map_err(|err| {
            err.context("error looking up linked account for slack initiated message")
        })?;

        self.whatsapp
            .send_text(
                &account.whatsapp_business_phone_number_id,
                &initiator.whatsapp_phone_number,
                &body_text,
                None,
            )
            .await
            .map_err(|err| {
                RelayError::internal("error forwarding slack message to whatsapp").with_source(err)
            })?;

        tracing::info!(channel_id = %channel.id, "forwarded slack message to whatsapp");
        Ok(RelayOutcome::Forwarded)
    }
}

fn record_outcome(labels: &RelayLabels, result: &RelayResult<RelayOutcome>) {
    match result {
        Ok(RelayOutcome::Forwarded) => record_forwarded(labels),
        Ok(_) => record_ignored(labels),
        Err(_) => record_failed(labels),
    }
}
