//! Webhook signature checks for both platforms.

use axum::http::HeaderMap;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

fn header<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
}

fn hmac_hex(secret: &str, parts: &[&[u8]]) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    for part in parts {
        mac.update(part);
    }
    Some(hex::encode(mac.finalize().into_bytes()))
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Checks Meta's `X-Hub-Signature-256: sha256=<hex>` header.
pub fn verify_fb_sig(app_secret: &str, headers: &HeaderMap, body: &[u8]) -> bool {
    let Some(provided) = header(headers, "X-Hub-Signature-256").strip_prefix("sha256=") else {
        return false;
    };
    match hmac_hex(app_secret, &[body]) {
        Some(expected) => constant_time_eq(&expected, &provided.to_ascii_lowercase()),
        None => false,
    }
}

/// Checks Slack's `X-Slack-Signature: v0=<hex>` over `v0:{timestamp}:{body}`.
pub fn verify_slack_sig(signing_secret: &str, headers: &HeaderMap, body: &[u8]) -> bool {
    let timestamp = header(headers, "X-Slack-Request-Timestamp");
    let signature = header(headers, "X-Slack-Signature");
    if timestamp.is_empty() || signature.is_empty() {
        return false;
    }
    let base = format!("v0:{timestamp}:");
    match hmac_hex(signing_secret, &[base.as_bytes(), body]) {
        Some(digest) => constant_time_eq(&format!("v0={digest}"), signature),
        None => false,
    }
}
