//! Telemetry helpers for the relay: subscriber installation with optional
//! OTLP export, plus webhook spans and counters.

mod config;
mod tracing_init;
mod webhook;

pub use config::{TelemetryConfig, TelemetryProtocol};
pub use tracing_init::{init_telemetry, shutdown_telemetry};
pub use webhook::{
    WebhookOutcome, event_type_label, record_event_type, record_outcome, record_webhook,
    start_webhook_span,
};
