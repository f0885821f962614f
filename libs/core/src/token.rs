//! Cached OAuth access token for the Frame.io API.

use std::time::{Duration, Instant};

use metrics::counter;
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::clock::{Clock, SystemClock};
use crate::config::{Credentials, Grant};
use crate::error::{AuthError, truncate_body};

/// Subtracted from the provider-declared lifetime so a token is never sent right at expiry.
pub const EXPIRY_SAFETY_BUFFER: Duration = Duration::from_secs(60);
/// Lifetime assumed when the provider omits `expires_in`.
pub const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(3600);

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: Instant,
}

#[derive(Debug, Default)]
struct TokenState {
    cached: Option<CachedToken>,
    /// Latest refresh token; replaced when the provider rotates it.
    refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// Holds one bearer token and refreshes it through the identity endpoint on demand.
///
/// The lock is held across the exchange, so concurrent callers that find the
/// token expired wait for a single refresh and then share its result.
pub struct TokenCache<C: Clock = SystemClock> {
    http: Client,
    token_url: String,
    credentials: Option<Credentials>,
    clock: C,
    state: Mutex<TokenState>,
}

impl TokenCache<SystemClock> {
    pub fn new(http: Client, token_url: impl Into<String>, credentials: Option<Credentials>) -> Self {
        Self::with_clock(http, token_url, credentials, SystemClock)
    }
}

impl<C: Clock> TokenCache<C> {
    pub fn with_clock(
        http: Client,
        token_url: impl Into<String>,
        credentials: Option<Credentials>,
        clock: C,
    ) -> Self {
        let refresh_token = match credentials.as_ref().map(|c| &c.grant) {
            Some(Grant::RefreshToken { refresh_token }) => Some(refresh_token.clone()),
            _ => None,
        };
        Self {
            http,
            token_url: token_url.into(),
            credentials,
            clock,
            state: Mutex::new(TokenState {
                cached: None,
                refresh_token,
            }),
        }
    }

    /// Returns the cached token while it is valid, otherwise exchanges credentials for a new one.
    pub async fn token(&self) -> Result<String, AuthError> {
        let mut state = self.state.lock().await;
        let now = self.clock.now();
        if let Some(cached) = state.cached.as_ref().filter(|t| now < t.expires_at) {
            return Ok(cached.value.clone());
        }

        let credentials = self
            .credentials
            .as_ref()
            .ok_or(AuthError::MissingCredentials)?;
        let grant = credentials.grant.as_str();
        let response = match self.exchange(credentials, state.refresh_token.as_deref()).await {
            Ok(response) => response,
            Err(err) => {
                counter!("relay_token_refresh_total", "grant" => grant, "outcome" => "error")
                    .increment(1);
                tracing::error!(error = %err, grant, "access token exchange failed");
                return Err(err);
            }
        };
        counter!("relay_token_refresh_total", "grant" => grant, "outcome" => "ok").increment(1);

        let lifetime = response
            .expires_in
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TOKEN_LIFETIME);
        let expires_at = self.clock.now() + lifetime.saturating_sub(EXPIRY_SAFETY_BUFFER);
        if let (Grant::RefreshToken { .. }, Some(rotated)) =
            (&credentials.grant, response.refresh_token)
        {
            state.refresh_token = Some(rotated);
        }
        tracing::debug!(grant, lifetime_secs = lifetime.as_secs(), "access token refreshed");

        state.cached = Some(CachedToken {
            value: response.access_token.clone(),
            expires_at,
        });
        Ok(response.access_token)
    }

    async fn exchange(
        &self,
        credentials: &Credentials,
        refresh_token: Option<&str>,
    ) -> Result<TokenResponse, AuthError> {
        let mut params: Vec<(&str, &str)> = vec![
            ("grant_type", credentials.grant.as_str()),
            ("client_id", credentials.client_id.as_str()),
            ("client_secret", credentials.client_secret.as_str()),
        ];
        match &credentials.grant {
            Grant::ClientCredentials { scope } => {
                if let Some(scope) = scope.as_deref() {
                    params.push(("scope", scope));
                }
            }
            Grant::RefreshToken { .. } => {
                let token = refresh_token.ok_or(AuthError::MissingCredentials)?;
                params.push(("refresh_token", token));
            }
        }

        let response = self
            .http
            .post(&self.token_url)
            .form(&params)
            .send()
            .await
            .map_err(AuthError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable>".into());
            return Err(AuthError::Rejected {
                status,
                body: truncate_body(body),
            });
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(AuthError::Decode)
    }
}
