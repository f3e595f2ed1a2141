//! Subscription-verification handshakes for both platforms.

use http::StatusCode;

use crate::events::InboundEvent;

/// Status plus raw text body returned to the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeResponse {
    pub status: StatusCode,
    pub body: String,
}

impl ChallengeResponse {
    fn ok(body: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK,
            body: body.into(),
        }
    }

    pub fn forbidden() -> Self {
        Self {
            status: StatusCode::FORBIDDEN,
            body: String::new(),
        }
    }
}

/// Answers Meta's `hub.*` verification request.
pub fn verify_whatsapp_subscription(
    mode: &str,
    token: &str,
    challenge: &str,
    expected_token: &str,
) -> ChallengeResponse {
    if mode == "subscribe" && token == expected_token {
        tracing::info!("whatsapp webhook subscription verified");
        ChallengeResponse::ok(challenge)
    } else {
        tracing::warn!(mode, "whatsapp webhook verification rejected");
        ChallengeResponse::forbidden()
    }
}

pub fn slack_url_verification(challenge: &str) -> ChallengeResponse {
    ChallengeResponse::ok(challenge)
}

/// Answers either verification event; `None` for any other event.
pub fn answer_challenge(
    event: &InboundEvent,
    expected_whatsapp_token: &str,
) -> Option<ChallengeResponse> {
    match event {
        InboundEvent::WhatsappVerificationChallenge {
            mode,
            token,
            challenge,
        } => Some(verify_whatsapp_subscription(
            mode,
            token,
            challenge,
            expected_whatsapp_token,
        )),
        InboundEvent::SlackUrlVerification { challenge } => Some(slack_url_verification(challenge)),
        _ => None,
    }
}
