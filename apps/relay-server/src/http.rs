use std::sync::Arc;

use axum::{
    Router,
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use relay_core::{
    ChallengeResponse, ErrorKind, MessageRelay, RelayError, RelayOutcome, answer_challenge,
    whatsapp_verification,
};
use serde::Deserialize;

use crate::security::{verify_fb_sig, verify_slack_sig};

#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<MessageRelay>,
    pub verify_token: String,
    pub whatsapp_app_secret: Option<String>,
    pub slack_signing_secret: Option<String>,
}

impl AppState {
    pub fn new(relay: Arc<MessageRelay>, verify_token: impl Into<String>) -> Self {
        Self {
            relay,
            verify_token: verify_token.into(),
            whatsapp_app_secret: None,
            slack_signing_secret: None,
        }
    }

    pub fn with_whatsapp_app_secret(mut self, secret: Option<String>) -> Self {
        self.whatsapp_app_secret = secret;
        self
    }

    pub fn with_slack_signing_secret(mut self, secret: Option<String>) -> Self {
        self.slack_signing_secret = secret;
        self
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/healthz", get(healthz))
        .route(
            "/whatsapp/webhook",
            get(verify_whatsapp).post(receive_whatsapp),
        )
        .route("/slack/webhook", post(receive_slack))
        .with_state(state)
}

async fn root() -> &'static str {
    "Nothing to see here."
}

async fn healthz() -> impl IntoResponse {
    StatusCode::NO_CONTENT
}

#[derive(Debug, Deserialize)]
struct VerifyQs {
    #[serde(rename = "hub.mode")]
    mode: Option<String>,
    #[serde(rename = "hub.challenge")]
    challenge: Option<String>,
    #[serde(rename = "hub.verify_token")]
    token: Option<String>,
}

async fn verify_whatsapp(State(state): State<AppState>, Query(q): Query<VerifyQs>) -> Response {
    let event = whatsapp_verification(q.mode, q.token, q.challenge);
    let response =
        answer_challenge(&event, &state.verify_token).unwrap_or_else(ChallengeResponse::forbidden);
    challenge_response(response)
}

async fn receive_whatsapp(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if let Some(secret) = state.whatsapp_app_secret.as_deref()
        && !verify_fb_sig(secret, &headers, &body)
    {
        tracing::warn!("invalid whatsapp signature");
        return StatusCode::UNAUTHORIZED.into_response();
    }
    match state.relay.handle_whatsapp_body(&body).await {
        Ok(outcome) => outcome_response(outcome),
        Err(err) => error_response(err),
    }
}

async fn receive_slack(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if let Some(secret) = state.slack_signing_secret.as_deref()
        && !verify_slack_sig(secret, &headers, &body)
    {
        tracing::warn!("invalid slack signature");
        return StatusCode::UNAUTHORIZED.into_response();
    }
    match state.relay.handle_slack_body(&body).await {
        Ok(outcome) => outcome_response(outcome),
        Err(err) => error_response(err),
    }
}

fn challenge_response(response: ChallengeResponse) -> Response {
    (response.status, response.body).into_response()
}

fn outcome_response(outcome: RelayOutcome) -> Response {
    match outcome {
        RelayOutcome::Forwarded | RelayOutcome::Ignored { .. } => StatusCode::OK.into_response(),
        RelayOutcome::Challenge(response) => challenge_response(response),
    }
}

fn error_response(err: RelayError) -> Response {
    let status = err.status();
    match err.kind() {
        ErrorKind::BadRequest => {
            tracing::warn!(error = %err, status = status.as_u16(), "rejected webhook payload")
        }
        ErrorKind::NotFound | ErrorKind::Internal => {
            tracing::error!(error = %err, status = status.as_u16(), "relay failed")
        }
    }
    status.into_response()
}
