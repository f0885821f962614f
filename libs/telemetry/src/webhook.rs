use metrics::counter;
use tracing::Span;

const WEBHOOK_COUNTER: &str = "relay_webhooks_total";
const WEBHOOK_SPAN_NAME: &str = "webhook.handle";

/// Terminal state of one inbound webhook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    Relayed,
    Ignored,
    Rejected,
    NotConfigured,
    FormatFailed,
    RelayFailed,
}

impl WebhookOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookOutcome::Relayed => "relayed",
            WebhookOutcome::Ignored => "ignored",
            WebhookOutcome::Rejected => "rejected",
            WebhookOutcome::NotConfigured => "not_configured",
            WebhookOutcome::FormatFailed => "format_failed",
            WebhookOutcome::RelayFailed => "relay_failed",
        }
    }
}

/// Counter label for an inbound event type. Types arrive from the request
/// body, so anything outside the relayed set collapses to `other`.
pub fn event_type_label(event_type: &str) -> &'static str {
    match event_type {
        "comment.created" => "comment.created",
        "asset.created" => "asset.created",
        "unknown" => "unknown",
        _ => "other",
    }
}

pub fn record_webhook(event_type: &str, outcome: WebhookOutcome) {
    counter!(
        WEBHOOK_COUNTER,
        "event_type" => event_type_label(event_type),
        "outcome" => outcome.as_str()
    )
    .increment(1);
}

/// Span covering one webhook; `event_type` is recorded once the body is parsed.
pub fn start_webhook_span() -> Span {
    tracing::info_span!(
        WEBHOOK_SPAN_NAME,
        event_type = tracing::field::Empty,
        outcome = tracing::field::Empty
    )
}

pub fn record_event_type(span: &Span, event_type: &str) {
    span.record("event_type", tracing::field::display(event_type));
}

pub fn record_outcome(span: &Span, outcome: WebhookOutcome) {
    span.record("outcome", outcome.as_str());
}
