use std::net::SocketAddr;

use crate::error::ConfigError;

pub const DEFAULT_TOKEN_URL: &str = "https://ims-na1.adobelogin.com/ims/token/v3";
pub const DEFAULT_API_BASE: &str = "https://api.frame.io/v2";
pub const DEFAULT_PORT: u16 = 3000;

/// OAuth grant used to obtain Frame.io access tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Grant {
    ClientCredentials { scope: Option<String> },
    RefreshToken { refresh_token: String },
}

impl Grant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Grant::ClientCredentials { .. } => "client_credentials",
            Grant::RefreshToken { .. } => "refresh_token",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub grant: Grant,
}

/// Shape of the message posted to Slack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MessageStyle {
    #[default]
    Blocks,
    Text,
}

impl MessageStyle {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "blocks" | "block" | "block_kit" => Some(MessageStyle::Blocks),
            "text" | "plain" | "mrkdwn" => Some(MessageStyle::Text),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Unset means every webhook is answered with a server error.
    pub slack_webhook_url: Option<String>,
    pub message_style: MessageStyle,
    /// Unset means token exchanges fail with `AuthError::MissingCredentials`.
    pub credentials: Option<Credentials>,
    pub token_url: String,
    pub api_base: String,
    pub bind: SocketAddr,
}

impl RelayConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let message_style = match get("SLACK_MESSAGE_FORMAT") {
            Some(raw) => MessageStyle::parse(&raw).ok_or(ConfigError::Invalid {
                key: "SLACK_MESSAGE_FORMAT",
                value: raw,
            })?,
            None => MessageStyle::default(),
        };

        let refresh_token = get("FRAMEIO_REFRESH_TOKEN");
        let grant = match get("FRAMEIO_GRANT").as_deref() {
            Some("client_credentials") => Grant::ClientCredentials {
                scope: get("FRAMEIO_SCOPE"),
            },
            Some("refresh_token") => Grant::RefreshToken {
                refresh_token: refresh_token.ok_or(ConfigError::Missing("FRAMEIO_REFRESH_TOKEN"))?,
            },
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "FRAMEIO_GRANT",
                    value: other.to_string(),
                });
            }
            None => match refresh_token {
                Some(refresh_token) => Grant::RefreshToken { refresh_token },
                None => Grant::ClientCredentials {
                    scope: get("FRAMEIO_SCOPE"),
                },
            },
        };

        let credentials = match (get("FRAMEIO_CLIENT_ID"), get("FRAMEIO_CLIENT_SECRET")) {
            (Some(client_id), Some(client_secret)) => Some(Credentials {
                client_id,
                client_secret,
                grant,
            }),
            _ => None,
        };

        let bind = match get("BIND") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                key: "BIND",
                value: raw,
            })?,
            None => {
                let port = match get("PORT") {
                    Some(raw) => raw.parse::<u16>().map_err(|_| ConfigError::Invalid {
                        key: "PORT",
                        value: raw,
                    })?,
                    None => DEFAULT_PORT,
                };
                SocketAddr::from(([0, 0, 0, 0], port))
            }
        };

        Ok(Self {
            slack_webhook_url: get("SLACK_WEBHOOK_URL"),
            message_style,
            credentials,
            token_url: get("FRAMEIO_TOKEN_URL").unwrap_or_else(|| DEFAULT_TOKEN_URL.into()),
            api_base: get("FRAMEIO_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.into()),
            bind,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<RelayConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        RelayConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_env_is_empty() {
        let cfg = config_from(&[]).unwrap();
        assert!(cfg.slack_webhook_url.is_none());
        assert!(cfg.credentials.is_none());
        assert_eq!(cfg.message_style, MessageStyle::Blocks);
        assert_eq!(cfg.token_url, DEFAULT_TOKEN_URL);
        assert_eq!(cfg.api_base, DEFAULT_API_BASE);
        assert_eq!(cfg.bind, "0.0.0.0:3000".parse().unwrap());
    }

    #[test]
    fn refresh_token_selects_refresh_grant() {
        let cfg = config_from(&[
            ("FRAMEIO_CLIENT_ID", "cid"),
            ("FRAMEIO_CLIENT_SECRET", "secret"),
            ("FRAMEIO_REFRESH_TOKEN", "rt-1"),
        ])
        .unwrap();
        let creds = cfg.credentials.expect("credentials");
        assert_eq!(
            creds.grant,
            Grant::RefreshToken {
                refresh_token: "rt-1".into()
            }
        );
    }

    #[test]
    fn explicit_client_credentials_ignores_refresh_token() {
        let cfg = config_from(&[
            ("FRAMEIO_CLIENT_ID", "cid"),
            ("FRAMEIO_CLIENT_SECRET", "secret"),
            ("FRAMEIO_REFRESH_TOKEN", "rt-1"),
            ("FRAMEIO_GRANT", "client_credentials"),
            ("FRAMEIO_SCOPE", "openid"),
        ])
        .unwrap();
        assert_eq!(
            cfg.credentials.unwrap().grant,
            Grant::ClientCredentials {
                scope: Some("openid".into())
            }
        );
    }

    #[test]
    fn refresh_grant_without_token_is_rejected() {
        let err = config_from(&[("FRAMEIO_GRANT", "refresh_token")]).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("FRAMEIO_REFRESH_TOKEN")));
    }

    #[test]
    fn port_and_format_are_parsed() {
        let cfg = config_from(&[
            ("PORT", "8080"),
            ("SLACK_MESSAGE_FORMAT", "text"),
            ("SLACK_WEBHOOK_URL", "  https://hooks.slack.test/x  "),
        ])
        .unwrap();
        assert_eq!(cfg.bind.port(), 8080);
        assert_eq!(cfg.message_style, MessageStyle::Text);
        assert_eq!(
            cfg.slack_webhook_url.as_deref(),
            Some("https://hooks.slack.test/x")
        );
    }

    #[test]
    fn invalid_values_fail() {
        assert!(config_from(&[("PORT", "nope")]).is_err());
        assert!(config_from(&[("SLACK_MESSAGE_FORMAT", "html")]).is_err());
        assert!(config_from(&[("FRAMEIO_GRANT", "password")]).is_err());
    }

    #[test]
    fn blank_webhook_url_counts_as_unset() {
        let cfg = config_from(&[("SLACK_WEBHOOK_URL", "   ")]).unwrap();
        assert!(cfg.slack_webhook_url.is_none());
    }
}
