use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use hmac::{Hmac, Mac};
use http_body_util::BodyExt;
use relay_core::testkit::{InMemorySlack, RecordingWhatsapp};
use relay_core::{
    ConversationChannel, LinkedAccount, MessageRelay, StaticDirectory, WhatsappInitiatorDetails,
};
use relay_server::http::{AppState, build_router};
use serde_json::{Value, json};
use sha2::Sha256;
use tower::ServiceExt;

const VERIFY_TOKEN: &str = "verify-me";

struct TestApp {
    router: Router,
    slack: InMemorySlack,
    whatsapp: RecordingWhatsapp,
}

fn test_app_with(configure: impl FnOnce(AppState) -> AppState) -> TestApp {
    let slack = InMemorySlack::new();
    let whatsapp = RecordingWhatsapp::new();
    let directory = StaticDirectory::new(vec![LinkedAccount::new("36825", "U123")]);
    let relay = MessageRelay::new(
        Arc::new(directory),
        Arc::new(whatsapp.clone()),
        Arc::new(slack.clone()),
    );
    let state = configure(AppState::new(Arc::new(relay), VERIFY_TOKEN));
    TestApp {
        router: build_router(state),
        slack,
        whatsapp,
    }
}

fn test_app() -> TestApp {
    test_app_with(|state| state)
}

fn whatsapp_payload(kind: &str) -> Value {
    json!({
        "object": "whatsapp_business_account",
        "entry": [{
            "id": "WHATSAPP_BUSINESS_ACCOUNT_ID",
            "changes": [{
                "field": "messages",
                "value": {
                    "messaging_product": "whatsapp",
                    "metadata": {"display_phone_number": "15550783881", "phone_number_id": "36825"},
                    "contacts": [{"profile": {"name": "Bob"}, "wa_id": "40742123123"}],
                    "messages": [{
                        "from": "40742123123",
                        "id": "message_id_123",
                        "timestamp": "1603059201",
                        "type": kind,
                        "text": {"body": "message from whatsapp"}
                    }]
                }
            }]
        }]
    })
}

fn post(uri: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: &TestApp, req: Request<Body>) -> (StatusCode, String) {
    let resp = app.router.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

#[tokio::test]
async fn root_and_healthz() {
    let app = test_app();
    assert_eq!(
        send(&app, get("/")).await,
        (StatusCode::OK, "Nothing to see here.".to_string())
    );
    let (status, _) = send(&app, get("/healthz")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn whatsapp_subscription_verification() {
    let app = test_app();
    let (status, body) = send(
        &app,
        get("/whatsapp/webhook?hub.mode=subscribe&hub.verify_token=verify-me&hub.challenge=xyz"),
    )
    .await;
    assert_eq!((status, body.as_str()), (StatusCode::OK, "xyz"));

    let (status, body) = send(
        &app,
        get("/whatsapp/webhook?hub.mode=subscribe&hub.verify_token=wrong&hub.challenge=xyz"),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body.is_empty());

    let (status, _) = send(&app, get("/whatsapp/webhook")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn whatsapp_text_is_relayed_to_slack() {
    let app = test_app();
    let (status, _) = send(
        &app,
        post("/whatsapp/webhook", whatsapp_payload("text").to_string()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let posted = app.slack.take_posted().await;
    assert_eq!(posted.len(), 1);
    assert_eq!(posted[0].text, "message from whatsapp");
    assert_eq!(posted[0].username, "Bob");
    let read = app.whatsapp.take_read().await;
    assert_eq!(read[0].message_id, "message_id_123");
}

#[tokio::test]
async fn whatsapp_image_is_acknowledged_without_relay() {
    let app = test_app();
    let (status, _) = send(
        &app,
        post("/whatsapp/webhook", whatsapp_payload("image").to_string()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(app.slack.take_posted().await.is_empty());
    assert!(app.whatsapp.take_read().await.is_empty());
}

#[tokio::test]
async fn whatsapp_garbage_body_is_bad_request() {
    let app = test_app();
    let (status, _) = send(&app, post("/whatsapp/webhook", "{not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn whatsapp_slack_failure_is_internal_error() {
    let app = test_app();
    app.slack.fail_method("conversations.create").await;
    let (status, _) = send(
        &app,
        post("/whatsapp/webhook", whatsapp_payload("text").to_string()),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn slack_url_verification_echoes_challenge() {
    let app = test_app();
    let payload = json!({"token": "t", "type": "url_verification", "challenge": "abc123"});
    let (status, body) = send(&app, post("/slack/webhook", payload.to_string())).await;
    assert_eq!((status, body.as_str()), (StatusCode::OK, "abc123"));
}

#[tokio::test]
async fn slack_message_is_relayed_to_whatsapp() {
    let app = test_app();
    let bob = WhatsappInitiatorDetails::new("Bob", "40742123123");
    app.slack
        .add_channel(
            ConversationChannel::new("C-bob", "bob-40742123123", bob.to_metadata().unwrap()),
            &["U123"],
        )
        .await;
    let payload = json!({
        "type": "event_callback",
        "event": {"type": "message", "channel": "C-bob", "user": "U123", "text": "hello Bob"}
    });
    let (status, _) = send(&app, post("/slack/webhook", payload.to_string())).await;
    assert_eq!(status, StatusCode::OK);

    let sent = app.whatsapp.take_sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].business_phone_number_id, "36825");
    assert_eq!(sent[0].to, "40742123123");
    assert_eq!(sent[0].body, "hello Bob");
}

#[tokio::test]
async fn slack_message_in_foreign_channel_is_internal_error() {
    let app = test_app();
    app.slack
        .add_channel(
            ConversationChannel::new("C-general", "general", "Company-wide announcements"),
            &["U123"],
        )
        .await;
    let payload = json!({
        "type": "event_callback",
        "event": {"type": "message", "channel": "C-general", "user": "U123", "text": "hi"}
    });
    let (status, _) = send(&app, post("/slack/webhook", payload.to_string())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(app.whatsapp.take_sent().await.is_empty());
}

#[tokio::test]
async fn slack_noise_is_acknowledged() {
    let app = test_app();
    for body in [
        json!({"type": "event_callback", "event": {"type": "message", "subtype": "channel_join"}})
            .to_string(),
        "plain text".to_string(),
    ] {
        let (status, _) = send(&app, post("/slack/webhook", body)).await;
        assert_eq!(status, StatusCode::OK);
    }
    assert!(app.slack.calls().await.is_empty());
}

#[tokio::test]
async fn signed_whatsapp_webhook_requires_valid_signature() {
    let app = test_app_with(|state| state.with_whatsapp_app_secret(Some("app-secret".into())));
    let body = whatsapp_payload("image").to_string();

    let (status, _) = send(&app, post("/whatsapp/webhook", body.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let mut mac = Hmac::<Sha256>::new_from_slice(b"app-secret").unwrap();
    mac.update(body.as_bytes());
    let signature = format!("sha256={}", hex::encode(mac.finalize().into_bytes()));
    let mut req = post("/whatsapp/webhook", body);
    req.headers_mut()
        .insert("X-Hub-Signature-256", signature.parse().unwrap());
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn signed_slack_webhook_rejects_unsigned_challenge() {
    let app = test_app_with(|state| state.with_slack_signing_secret(Some("signing".into())));
    let payload = json!({"type": "url_verification", "challenge": "abc123"});
    let (status, body) = send(&app, post("/slack/webhook", payload.to_string())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.is_empty());
}
