use tracing::Span;

use crate::context::RelayLabels;

pub const FORWARDED_COUNTER: &str = "relay_forwarded";
pub const IGNORED_COUNTER: &str = "relay_ignored";
pub const FAILED_COUNTER: &str = "relay_failed";
const RELAY_SPAN_NAME: &str = "relay.handle";

pub fn record_counter(name: &'static str, value: u64, labels: &RelayLabels) {
    let tags: Vec<metrics::Label> = labels
        .tags()
        .into_iter()
        .map(|(key, value)| metrics::Label::new(key, value))
        .collect();
    metrics::counter!(name, tags).increment(value);
}

pub fn record_forwarded(labels: &RelayLabels) {
    record_counter(FORWARDED_COUNTER, 1, labels);
}

pub fn record_ignored(labels: &RelayLabels) {
    record_counter(IGNORED_COUNTER, 1, labels);
}

pub fn record_failed(labels: &RelayLabels) {
    record_counter(FAILED_COUNTER, 1, labels);
}

/// Fills the optional span fields once they become known mid-request.
pub fn with_common_fields(span: &Span, chat_id: Option<&str>, msg_id: Option<&str>) {
    if let Some(chat_id) = chat_id {
        span.record("chat_id", tracing::field::display(chat_id));
    }
    if let Some(msg_id) = msg_id {
        span.record("msg_id", tracing::field::display(msg_id));
    }
}

/// Opens the request span; `chat_id` and `msg_id` start empty.
pub fn start_relay_span(labels: &RelayLabels) -> Span {
    tracing::info_span!(
        RELAY_SPAN_NAME,
        direction = labels.direction.as_str(),
        chat_id = tracing::field::Empty,
        msg_id = tracing::field::Empty
    )
}
