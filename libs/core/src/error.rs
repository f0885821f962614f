use reqwest::StatusCode;
use thiserror::Error;

/// Upper bound on how much of a remote error body is kept in an error value.
pub(crate) const MAX_ERROR_BODY: usize = 512;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
    #[error("{0} is required for the selected grant")]
    Missing(&'static str),
}

/// Failures while exchanging credentials with the identity provider.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("identity credentials are not configured")]
    MissingCredentials,
    #[error("identity provider transport error")]
    Transport(#[source] reqwest::Error),
    #[error("identity provider rejected the exchange: status={status} body={body}")]
    Rejected { status: StatusCode, body: String },
    #[error("identity provider returned an undecodable body")]
    Decode(#[source] reqwest::Error),
}

/// Failures of a Frame.io API lookup. Only `Auth` leaves the client.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("frame.io transport error: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("frame.io returned status={0}")]
    Status(StatusCode),
    #[error("frame.io returned an undecodable body: {0}")]
    Decode(#[source] reqwest::Error),
    #[error("invalid frame.io api base: {0}")]
    InvalidUrl(String),
}

/// Failures while turning an inbound event into a chat message.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
    #[error("invalid value for `{field}`: {reason}")]
    InvalidField { field: &'static str, reason: String },
    #[error("malformed event resource")]
    Resource(#[source] serde_json::Error),
    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Failures while posting a message to the chat webhook.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("chat webhook transport error")]
    Transport(#[source] reqwest::Error),
    #[error("chat webhook returned status={status} body={body}")]
    Rejected { status: StatusCode, body: String },
}

pub(crate) fn truncate_body(mut body: String) -> String {
    if body.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let body = "é".repeat(MAX_ERROR_BODY);
        let truncated = truncate_body(body);
        assert!(truncated.len() <= MAX_ERROR_BODY);
        assert!(truncated.chars().all(|c| c == 'é'));
    }

    #[test]
    fn short_bodies_are_kept() {
        assert_eq!(truncate_body("nope".into()), "nope");
    }
}
