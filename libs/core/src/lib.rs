//! Conversation resolution and message relay between WhatsApp Business and Slack.
//!
//! Inbound webhook payloads are classified into [`InboundEvent`]s, matched to a
//! [`LinkedAccount`] and forwarded to the counterpart conversation. Each
//! WhatsApp contact gets a Slack channel whose purpose carries the contact's
//! identity, so replies from Slack can be routed back without extra storage.
pub mod challenge;
pub mod directory;
pub mod error;
pub mod events;
pub mod platforms;
pub mod relay;
pub mod resolver;
#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
pub mod types;

pub use challenge::{
    ChallengeResponse, answer_challenge, slack_url_verification, verify_whatsapp_subscription,
};
pub use directory::{LINKED_ACCOUNTS_FILE_ENV, LinkedAccountDirectory, StaticDirectory};
pub use error::{ErrorKind, RelayError, RelayResult};
pub use events::{
    InboundEvent, WhatsappContact, classify_slack, classify_whatsapp, extract_initiator,
    whatsapp_verification,
};
pub use platforms::slack::{SlackApi, SlackApiError, SlackWebClient};
pub use platforms::whatsapp::{GraphApiError, GraphApiSender, WhatsappApi};
pub use relay::{MessageRelay, RelayOutcome};
pub use resolver::ConversationChannelResolver;
pub use types::{ConversationChannel, LinkedAccount, WhatsappInitiatorDetails};
