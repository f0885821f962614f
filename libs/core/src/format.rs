//! Turns Frame.io events into Slack webhook payloads.

use serde::Serialize;
use serde_json::{Value, json};

use crate::config::MessageStyle;
use crate::error::FormatError;
use crate::event::{AssetCreated, CommentCreated, InboundEvent, WebhookEvent};
use crate::frameio::ProjectDirectory;

pub const DEFAULT_UPLOADER: &str = "A user";
const BYTES_PER_MEGABYTE: f64 = 1024.0 * 1024.0;

/// Body posted verbatim to the Slack incoming webhook.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OutboundMessage {
    Text { text: String, mrkdwn: bool },
    Blocks { blocks: Vec<Value> },
}

/// Validates and formats a wire event. `Ok(None)` means "acknowledge, do not forward".
pub async fn format_inbound(
    event: InboundEvent,
    directory: &dyn ProjectDirectory,
    style: MessageStyle,
) -> Result<Option<OutboundMessage>, FormatError> {
    let event = WebhookEvent::try_from(event)?;
    format_event(&event, directory, style).await
}

pub async fn format_event(
    event: &WebhookEvent,
    directory: &dyn ProjectDirectory,
    style: MessageStyle,
) -> Result<Option<OutboundMessage>, FormatError> {
    let lines = match event {
        WebhookEvent::CommentCreated(comment) => {
            let project = directory
                .project_name(Some(comment.project_id.as_str()))
                .await?;
            comment_lines(comment, &project)
        }
        WebhookEvent::AssetCreated(asset) => {
            let project = directory.project_name(asset.project_id.as_deref()).await?;
            asset_lines(asset, &project)
        }
        WebhookEvent::Unhandled(kind) => {
            tracing::debug!(event_type = %kind, "event type not forwarded");
            return Ok(None);
        }
    };
    Ok(Some(lines.render(style)))
}

/// Style-independent content of a message, in display order.
struct MessageLines {
    context: String,
    body: String,
    image: Option<(String, String)>,
}

impl MessageLines {
    fn render(self, style: MessageStyle) -> OutboundMessage {
        match style {
            MessageStyle::Blocks => {
                let mut blocks = vec![context_md(&self.context), section_md(&self.body)];
                if let Some((url, alt)) = &self.image {
                    blocks.push(image(url, alt));
                }
                blocks.push(json!({ "type": "divider" }));
                OutboundMessage::Blocks { blocks }
            }
            MessageStyle::Text => {
                let mut text = format!("{}\n{}", self.context, self.body);
                if let Some((url, _)) = &self.image {
                    text.push_str(&format!("\n<{}|Thumbnail>", link_target(url)));
                }
                OutboundMessage::Text { text, mrkdwn: true }
            }
        }
    }
}

fn comment_lines(comment: &CommentCreated, project: &str) -> MessageLines {
    let body = format!(
        "*{}* commented on *{}* at `{}`\n{}",
        escape_mrkdwn(&comment.commenter),
        escape_mrkdwn(&comment.asset_name),
        format_timecode(comment.timestamp, comment.fps),
        quote(&comment.text),
    );
    MessageLines {
        context: project_line(project),
        body,
        image: Some((comment.thumbnail_url.clone(), comment.asset_name.clone())),
    }
}

fn asset_lines(asset: &AssetCreated, project: &str) -> MessageLines {
    let uploader = asset.uploader.as_deref().unwrap_or(DEFAULT_UPLOADER);
    let mut body = format!(
        "*{}* uploaded *<{}|{}>*",
        escape_mrkdwn(uploader),
        link_target(&asset.short_url),
        escape_mrkdwn(&asset.name),
    );
    if let Some(bytes) = asset.filesize {
        body.push_str(&format!("\n*Size:* {} MB", format_megabytes(bytes)));
    }
    MessageLines {
        context: project_line(project),
        body,
        image: asset
            .thumbnail_url
            .clone()
            .map(|url| (url, asset.name.clone())),
    }
}

fn project_line(project: &str) -> String {
    format!("*Project:* {}", escape_mrkdwn(project))
}

fn context_md(text: &str) -> Value {
    json!({
        "type": "context",
        "elements": [{ "type": "mrkdwn", "text": text }]
    })
}

fn section_md(text: &str) -> Value {
    json!({
        "type": "section",
        "text": { "type": "mrkdwn", "text": text }
    })
}

fn image(url: &str, alt: &str) -> Value {
    json!({
        "type": "image",
        "image_url": url,
        "alt_text": alt
    })
}

fn quote(text: &str) -> String {
    if text.is_empty() {
        return ">".to_string();
    }
    text.lines()
        .map(|line| format!(">{}", escape_mrkdwn(line)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Escapes the three characters Slack treats as control sequences in mrkdwn.
pub fn escape_mrkdwn(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Escapes a URL for use inside `<url|label>`; `|` would end the target early.
fn link_target(url: &str) -> String {
    escape_mrkdwn(url).replace('|', "%7C")
}

/// Formats seconds as `HH:MM:SS`, or `HH:MM:SS:FF` when the frame rate is known.
///
/// ```
/// use relay_core::format_timecode;
///
/// assert_eq!(format_timecode(3725.0, None), "01:02:05");
/// assert_eq!(format_timecode(1.5, Some(24.0)), "00:00:01:12");
/// ```
pub fn format_timecode(seconds: f64, fps: Option<f64>) -> String {
    let seconds = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
    let whole = seconds.floor() as u64;
    let clock = format!(
        "{:02}:{:02}:{:02}",
        whole / 3600,
        (whole % 3600) / 60,
        whole % 60
    );
    match fps.filter(|fps| fps.is_finite() && *fps > 0.0) {
        Some(fps) => {
            let max_frame = (fps.ceil() as u64).saturating_sub(1);
            let frame = (((seconds - whole as f64) * fps).floor() as u64).min(max_frame);
            format!("{clock}:{frame:02}")
        }
        None => clock,
    }
}

/// Converts bytes to mebibytes with two decimals.
pub fn format_megabytes(bytes: f64) -> String {
    format!("{:.2}", bytes / BYTES_PER_MEGABYTE)
}
