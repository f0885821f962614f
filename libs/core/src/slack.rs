use async_trait::async_trait;
use reqwest::Client;

use crate::error::{RelayError, truncate_body};
use crate::format::OutboundMessage;

/// Delivers a formatted message to the chat endpoint.
#[async_trait]
pub trait ChatRelay: Send + Sync {
    async fn post(&self, webhook_url: &str, message: &OutboundMessage) -> Result<(), RelayError>;
}

/// Posts to Slack incoming webhooks.
#[derive(Clone)]
pub struct SlackWebhook {
    http: Client,
}

impl SlackWebhook {
    pub fn new(http: Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ChatRelay for SlackWebhook {
    async fn post(&self, webhook_url: &str, message: &OutboundMessage) -> Result<(), RelayError> {
        let response = self
            .http
            .post(webhook_url)
            .json(message)
            .send()
            .await
            .map_err(RelayError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable>".into());
            return Err(RelayError::Rejected {
                status,
                body: truncate_body(body),
            });
        }
        Ok(())
    }
}
