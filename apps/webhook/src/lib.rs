//! Frame.io webhook endpoint.
//!
//! `POST /webhook` validates the relay configuration, formats the event into a
//! Slack message (resolving the project name through Frame.io) and posts it to
//! the configured Slack incoming webhook. `GET /` is a liveness probe.

use std::sync::Arc;

use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use relay_core::{
    ChatRelay, FrameioClient, InboundEvent, MessageStyle, ProjectDirectory, RelayConfig,
    SlackWebhook, TokenCache, format_inbound,
};
use relay_telemetry::{
    WebhookOutcome, record_event_type, record_outcome, record_webhook, start_webhook_span,
};
use tower_http::trace::TraceLayer;
use tracing::{Instrument, Span};

pub const HEALTH_MESSAGE: &str = "Frame.io to Slack relay is running";

#[derive(Clone)]
pub struct AppState {
    pub slack_webhook_url: Option<String>,
    pub style: MessageStyle,
    pub directory: Arc<dyn ProjectDirectory>,
    pub relay: Arc<dyn ChatRelay>,
}

impl AppState {
    /// Wires the production Frame.io client and Slack relay from config.
    pub fn from_config(config: &RelayConfig, http: reqwest::Client) -> Self {
        let tokens = Arc::new(TokenCache::new(
            http.clone(),
            config.token_url.clone(),
            config.credentials.clone(),
        ));
        Self {
            slack_webhook_url: config.slack_webhook_url.clone(),
            style: config.message_style,
            directory: Arc::new(FrameioClient::new(
                http.clone(),
                config.api_base.clone(),
                tokens,
            )),
            relay: Arc::new(SlackWebhook::new(http)),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/webhook", post(webhook))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    HEALTH_MESSAGE
}

async fn webhook(State(state): State<AppState>, body: Bytes) -> Response {
    let span = start_webhook_span();
    let (event_type, outcome) = process(&state, &body, &span)
        .instrument(span.clone())
        .await;
    record_outcome(&span, outcome);
    record_webhook(event_type.as_deref().unwrap_or("unknown"), outcome);
    respond(outcome)
}

/// Runs one webhook through configuration check, formatting and relay.
async fn process(
    state: &AppState,
    body: &[u8],
    span: &Span,
) -> (Option<String>, WebhookOutcome) {
    let Some(webhook_url) = state.slack_webhook_url.as_deref() else {
        tracing::error!("SLACK_WEBHOOK_URL is not configured");
        return (None, WebhookOutcome::NotConfigured);
    };

    let event: InboundEvent = match serde_json::from_slice(body) {
        Ok(event) => event,
        Err(err) => {
            tracing::warn!(error = %err, "webhook payload parse error");
            return (None, WebhookOutcome::Rejected);
        }
    };
    let event_type = event.kind.clone();
    record_event_type(span, &event_type);
    tracing::info!(event_type = %event_type, "webhook received");

    let message = match format_inbound(event, state.directory.as_ref(), state.style).await {
        Ok(Some(message)) => message,
        Ok(None) => {
            tracing::info!(event_type = %event_type, "event type not handled");
            return (Some(event_type), WebhookOutcome::Ignored);
        }
        Err(err) => {
            tracing::error!(event_type = %event_type, error = %err, "failed to format webhook");
            return (Some(event_type), WebhookOutcome::FormatFailed);
        }
    };

    let outcome = match state.relay.post(webhook_url, &message).await {
        Ok(()) => {
            tracing::info!(event_type = %event_type, "webhook relayed to slack");
            WebhookOutcome::Relayed
        }
        Err(err) => {
            tracing::error!(event_type = %event_type, error = %err, "slack relay failed; event dropped");
            WebhookOutcome::RelayFailed
        }
    };
    (Some(event_type), outcome)
}

fn respond(outcome: WebhookOutcome) -> Response {
    let (status, body) = match outcome {
        WebhookOutcome::Relayed => (StatusCode::OK, "Webhook processed"),
        WebhookOutcome::Ignored => (StatusCode::OK, "Event type not handled"),
        WebhookOutcome::Rejected => (StatusCode::BAD_REQUEST, "Invalid webhook payload"),
        WebhookOutcome::NotConfigured => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Slack webhook URL not configured",
        ),
        WebhookOutcome::FormatFailed | WebhookOutcome::RelayFailed => {
            (StatusCode::INTERNAL_SERVER_ERROR, "Error processing webhook")
        }
    };
    (status, body).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_of(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn responses_are_plain_text_per_outcome() {
        let cases = [
            (WebhookOutcome::Relayed, 200, "Webhook processed"),
            (WebhookOutcome::Ignored, 200, "Event type not handled"),
            (WebhookOutcome::Rejected, 400, "Invalid webhook payload"),
            (WebhookOutcome::NotConfigured, 500, "Slack webhook URL not configured"),
            (WebhookOutcome::FormatFailed, 500, "Error processing webhook"),
            (WebhookOutcome::RelayFailed, 500, "Error processing webhook"),
        ];
        for (outcome, status, text) in cases {
            let response = respond(outcome);
            assert_eq!(response.status().as_u16(), status, "{outcome:?}");
            assert_eq!(body_of(response).await, text);
        }
    }
}
