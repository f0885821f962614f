//! Inbound Frame.io webhook events.
//!
//! The wire shape is `{ "type": ..., "resource": { ... } }` where the resource
//! layout depends on the type. [`InboundEvent`] is the loose wire form;
//! [`WebhookEvent`] is the validated, typed form the formatter works with.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::FormatError;

pub const COMMENT_CREATED: &str = "comment.created";
pub const ASSET_CREATED: &str = "asset.created";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct InboundEvent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub resource: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WebhookEvent {
    CommentCreated(CommentCreated),
    AssetCreated(AssetCreated),
    /// Acknowledged but never forwarded.
    Unhandled(String),
}

impl WebhookEvent {
    pub fn kind(&self) -> &str {
        match self {
            WebhookEvent::CommentCreated(_) => COMMENT_CREATED,
            WebhookEvent::AssetCreated(_) => ASSET_CREATED,
            WebhookEvent::Unhandled(kind) => kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommentCreated {
    pub project_id: String,
    pub commenter: String,
    pub asset_name: String,
    pub thumbnail_url: String,
    /// Frame rate of the commented asset, when known.
    pub fps: Option<f64>,
    /// Position in the asset, in seconds.
    pub timestamp: f64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssetCreated {
    pub project_id: Option<String>,
    pub name: String,
    pub short_url: String,
    pub uploader: Option<String>,
    pub thumbnail_url: Option<String>,
    /// Size in bytes.
    pub filesize: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct Owner {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct CommentAsset {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    thumbnail_url: Option<String>,
    #[serde(default)]
    fps: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawComment {
    #[serde(default)]
    owner: Option<Owner>,
    #[serde(default)]
    asset: Option<CommentAsset>,
    #[serde(default)]
    timestamp: Option<f64>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    project_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawAsset {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    short_url: Option<String>,
    #[serde(default)]
    owner: Option<Owner>,
    #[serde(default)]
    thumbnail_url: Option<String>,
    #[serde(default)]
    filesize: Option<f64>,
    #[serde(default)]
    project_id: Option<String>,
}

fn required<T>(value: Option<T>, field: &'static str) -> Result<T, FormatError> {
    value.ok_or(FormatError::MissingField(field))
}

fn resource<T>(value: Value) -> Result<T, FormatError>
where
    T: for<'de> Deserialize<'de>,
{
    if value.is_null() {
        return Err(FormatError::MissingField("resource"));
    }
    serde_json::from_value(value).map_err(FormatError::Resource)
}

impl TryFrom<InboundEvent> for WebhookEvent {
    type Error = FormatError;

    fn try_from(event: InboundEvent) -> Result<Self, Self::Error> {
        match event.kind.as_str() {
            COMMENT_CREATED => {
                let raw: RawComment = resource(event.resource)?;
                let owner = raw.owner.unwrap_or_default();
                let asset = raw.asset.unwrap_or_default();
                let timestamp = required(raw.timestamp, "resource.timestamp")?;
                if !timestamp.is_finite() || timestamp < 0.0 {
                    return Err(FormatError::InvalidField {
                        field: "resource.timestamp",
                        reason: format!("{timestamp} is not a non-negative number of seconds"),
                    });
                }
                Ok(WebhookEvent::CommentCreated(CommentCreated {
                    commenter: required(owner.name, "resource.owner.name")?,
                    asset_name: required(asset.name, "resource.asset.name")?,
                    timestamp,
                    text: required(raw.text, "resource.text")?,
                    thumbnail_url: required(asset.thumbnail_url, "resource.asset.thumbnail_url")?,
                    project_id: required(raw.project_id, "resource.project_id")?,
                    fps: asset.fps.filter(|fps| fps.is_finite() && *fps > 0.0),
                }))
            }
            ASSET_CREATED => {
                let raw: RawAsset = resource(event.resource)?;
                Ok(WebhookEvent::AssetCreated(AssetCreated {
                    name: required(raw.name, "resource.name")?,
                    short_url: required(raw.short_url, "resource.short_url")?,
                    uploader: raw.owner.and_then(|owner| owner.name),
                    thumbnail_url: raw.thumbnail_url,
                    filesize: raw.filesize,
                    project_id: raw.project_id,
                }))
            }
            _ => Ok(WebhookEvent::Unhandled(event.kind)),
        }
    }
}
