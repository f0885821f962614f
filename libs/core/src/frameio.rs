//! Authenticated lookups against the Frame.io REST API.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;

use crate::clock::{Clock, SystemClock};
use crate::error::{AuthError, LookupError};
use crate::token::TokenCache;

pub const UNKNOWN_PROJECT: &str = "Unknown Project";

/// Resolves project ids to display names.
///
/// Lookup failures are recovered with [`UNKNOWN_PROJECT`]; only failures to
/// obtain credentials are reported to the caller.
#[async_trait]
pub trait ProjectDirectory: Send + Sync {
    async fn project_name(&self, project_id: Option<&str>) -> Result<String, AuthError>;
}

#[derive(Debug, Deserialize)]
struct Project {
    name: String,
}

pub struct FrameioClient<C: Clock = SystemClock> {
    http: Client,
    api_base: String,
    tokens: Arc<TokenCache<C>>,
}

impl<C: Clock> FrameioClient<C> {
    pub fn new(http: Client, api_base: impl Into<String>, tokens: Arc<TokenCache<C>>) -> Self {
        Self {
            http,
            api_base: api_base.into(),
            tokens,
        }
    }

    /// Appends `segments` to the API base. Each segment is percent-encoded,
    /// so `/`, `?` and `#` inside one stay part of that segment.
    fn build_url(&self, segments: &[&str]) -> Result<Url, LookupError> {
        let mut url = Url::parse(&self.api_base)
            .map_err(|err| LookupError::InvalidUrl(err.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| LookupError::InvalidUrl(self.api_base.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Authenticated GET returning the decoded JSON body.
    async fn get_json<T>(&self, segments: &[&str]) -> Result<T, LookupError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let url = self.build_url(segments)?;
        let token = self.tokens.token().await?;
        let response = self
            .http
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(LookupError::Transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Status(status));
        }
        response.json::<T>().await.map_err(LookupError::Decode)
    }
}

#[async_trait]
impl<C: Clock + 'static> ProjectDirectory for FrameioClient<C> {
    async fn project_name(&self, project_id: Option<&str>) -> Result<String, AuthError> {
        let Some(project_id) = project_id.map(str::trim).filter(|id| !id.is_empty()) else {
            return Ok(UNKNOWN_PROJECT.to_string());
        };
        if !is_project_id(project_id) {
            tracing::warn!(project_id, "project id has unexpected characters");
            return Ok(UNKNOWN_PROJECT.to_string());
        }

        match self.get_json::<Project>(&["projects", project_id]).await {
            Ok(project) if !project.name.trim().is_empty() => Ok(project.name),
            Ok(_) => {
                tracing::warn!(project_id, "project lookup returned an empty name");
                Ok(UNKNOWN_PROJECT.to_string())
            }
            Err(LookupError::Auth(err)) => Err(err),
            Err(err) => {
                tracing::warn!(project_id, error = %err, "project lookup failed");
                Ok(UNKNOWN_PROJECT.to_string())
            }
        }
    }
}

/// Frame.io ids are UUIDs; anything outside `[A-Za-z0-9_-]` never names a project.
fn is_project_id(id: &str) -> bool {
    id.bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Credentials, Grant};
    use crate::testkit::{MockServer, Recorder};
    use axum::extract::Path;
    use axum::http::{HeaderMap, StatusCode};
    use axum::response::IntoResponse;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::json;
    use tracing_test::traced_test;

    fn frameio_router(auth_headers: Recorder) -> Router {
        Router::new()
            .route(
                "/token",
                post(|| async { Json(json!({ "access_token": "tok", "expires_in": 3600 })) }),
            )
            .route(
                "/v2/projects/{id}",
                get(move |Path(id): Path<String>, headers: HeaderMap| {
                    let auth_headers = auth_headers.clone();
                    async move {
                        let auth = headers
                            .get("authorization")
                            .and_then(|v| v.to_str().ok())
                            .unwrap_or_default()
                            .to_string();
                        auth_headers.push(json!(auth));
                        match id.as_str() {
                            "p-1" => Json(json!({ "name": "Spring Campaign" })).into_response(),
                            "garbled" => (StatusCode::OK, "not json").into_response(),
                            _ => StatusCode::NOT_FOUND.into_response(),
                        }
                    }
                }),
            )
            .route(
                "/v2/me",
                get(|| async { Json(json!({ "name": "Account Owner" })) }),
            )
            .route(
                "/v2/projects",
                get(|| async { Json(json!({ "name": "Project Listing" })) }),
            )
    }

    fn client_for(server: &MockServer) -> FrameioClient {
        let credentials = Credentials {
            client_id: "cid".into(),
            client_secret: "secret".into(),
            grant: Grant::ClientCredentials { scope: None },
        };
        let tokens = Arc::new(TokenCache::new(
            Client::new(),
            server.url("/token"),
            Some(credentials),
        ));
        FrameioClient::new(Client::new(), server.url("/v2/"), tokens)
    }

    #[tokio::test]
    async fn resolves_project_name_with_bearer_token() {
        let auth_headers = Recorder::default();
        let Some(server) = MockServer::spawn(frameio_router(auth_headers.clone())).await else {
            return;
        };
        let client = client_for(&server);

        let name = client.project_name(Some("p-1")).await.unwrap();
        assert_eq!(name, "Spring Campaign");
        assert_eq!(auth_headers.take(), vec![json!("Bearer tok")]);
    }

    #[tokio::test]
    #[traced_test]
    async fn lookup_failures_fall_back_to_unknown_project() {
        let auth_headers = Recorder::default();
        let Some(server) = MockServer::spawn(frameio_router(auth_headers.clone())).await else {
            return;
        };
        let client = client_for(&server);

        assert_eq!(
            client.project_name(Some("missing")).await.unwrap(),
            UNKNOWN_PROJECT
        );
        assert_eq!(
            client.project_name(Some("garbled")).await.unwrap(),
            UNKNOWN_PROJECT
        );
        assert!(logs_contain("project lookup failed"));
    }

    #[tokio::test]
    async fn project_ids_cannot_escape_the_projects_path() {
        let auth_headers = Recorder::default();
        let Some(server) = MockServer::spawn(frameio_router(auth_headers.clone())).await else {
            return;
        };
        let client = FrameioClient::new(
            Client::new(),
            server.url("/v2"),
            client_for(&server).tokens.clone(),
        );

        for id in ["../me", "..", "p-1?x=", "p-1#frag", "p-1/../../me", "%2e%2e"] {
            assert_eq!(
                client.project_name(Some(id)).await.unwrap(),
                UNKNOWN_PROJECT,
                "id {id:?}"
            );
        }
        assert!(auth_headers.is_empty());
        assert_eq!(client.project_name(Some("p-1")).await.unwrap(), "Spring Campaign");
    }

    #[test]
    fn segments_are_percent_encoded_under_the_api_base() {
        let tokens = Arc::new(TokenCache::new(Client::new(), "http://127.0.0.1:9/token", None));
        let client = FrameioClient::new(Client::new(), "https://api.frame.io/v2/", tokens);

        let url = client.build_url(&["projects", "a/b?c#d"]).unwrap();
        assert_eq!(url.as_str(), "https://api.frame.io/v2/projects/a%2Fb%3Fc%23d");
    }

    #[tokio::test]
    async fn absent_project_id_skips_network_and_token() {
        // no identity endpoint and no credentials: any network or token call would fail
        let tokens = Arc::new(TokenCache::new(Client::new(), "http://127.0.0.1:9/token", None));
        let client = FrameioClient::new(Client::new(), "http://127.0.0.1:9", tokens);

        assert_eq!(client.project_name(None).await.unwrap(), UNKNOWN_PROJECT);
        assert_eq!(client.project_name(Some("  ")).await.unwrap(), UNKNOWN_PROJECT);
    }

    #[tokio::test]
    async fn auth_failures_propagate() {
        let tokens = Arc::new(TokenCache::new(Client::new(), "http://127.0.0.1:9/token", None));
        let client = FrameioClient::new(Client::new(), "http://127.0.0.1:9", tokens);

        assert!(matches!(
            client.project_name(Some("p-1")).await,
            Err(AuthError::MissingCredentials)
        ));
    }
}
