//! The host side of the widget channel.
//!
//! Drains `Op`s from the UI, normalizes each submission with the protocol
//! decoder, keeps the session's conversation history, assembles the
//! provider request (media type → image/document block), calls the
//! endpoint, and dispatches `Event`s back. Failures are scoped to a single
//! submission; the runner itself only stops on `Op::Shutdown` or when the
//! UI goes away.

use anyhow::Context;
use serde::Deserialize;
use serde::Serialize;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::mpsc::UnboundedSender;

use chatline_protocol::Event;
use chatline_protocol::Op;
use chatline_protocol::Submission;
use chatline_protocol::decode_submission;
use chatline_protocol::is_image_media_type;
use chatline_protocol::resolve_media_type;
use chatline_protocol::transport;

#[derive(Debug, Clone)]
pub struct ChatRunnerConfig {
    pub model_id: String,
    pub endpoint: String,
    pub max_tokens: u64,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text { text: String },
    Image { source: MediaSource },
    Document { source: MediaSource },
}

#[derive(Debug, Clone, Serialize)]
struct MediaSource {
    #[serde(rename = "type")]
    source_type: &'static str,
    media_type: String,
    data: String,
}

#[derive(Debug, Clone, Serialize)]
struct ApiMessage {
    role: &'static str,
    content: Vec<ContentBlock>,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: u64,
    messages: &'a [ApiMessage],
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    content: Vec<ResponseBlock>,
}

#[derive(Debug, Deserialize)]
struct ResponseBlock {
    #[serde(default)]
    text: Option<String>,
}

pub async fn run_chat_runner(
    config: ChatRunnerConfig,
    mut op_rx: UnboundedReceiver<Op>,
    event_tx: UnboundedSender<Event>,
) {
    let client = reqwest::Client::new();
    let mut history: Vec<ApiMessage> = Vec::new();

    while let Some(op) = op_rx.recv().await {
        match op {
            Op::Shutdown => break,
            Op::ClearHistory => history.clear(),
            Op::SubmitMessage { payload } => {
                let submission = match decode_submission(Some(payload)) {
                    Ok(Some(submission)) => submission,
                    Ok(None) => continue,
                    Err(err) => {
                        tracing::warn!("submission decode failed: {err}");
                        let _ = event_tx.send(Event::TurnError {
                            message: format!("Error: {err}"),
                        });
                        continue;
                    }
                };

                let _ = event_tx.send(Event::TurnStarted);
                history.push(ApiMessage {
                    role: "user",
                    content: build_content_blocks(&submission),
                });

                match request_reply(&client, &config, &history).await {
                    Ok(reply) => {
                        history.push(ApiMessage {
                            role: "assistant",
                            content: vec![ContentBlock::Text {
                                text: reply.clone(),
                            }],
                        });
                        let _ = event_tx.send(Event::AssistantMessage { text: reply });
                    }
                    Err(err) => {
                        // Drop the failed user turn so a retry does not
                        // duplicate it in the replayed history.
                        history.pop();
                        tracing::warn!("model call failed: {err:#}");
                        let _ = event_tx.send(Event::TurnError {
                            message: format!("Error: {err:#}"),
                        });
                    }
                }
            }
            _ => {}
        }
    }
}

/// Provider content for one submission: the attachment block (image for
/// `image/*`, document otherwise) ahead of the text block.
fn build_content_blocks(submission: &Submission) -> Vec<ContentBlock> {
    let mut content = Vec::new();

    if let Some(file) = &submission.file {
        let media_type = resolve_media_type(&file.mime_type, &file.name);
        let source = MediaSource {
            source_type: "base64",
            media_type: media_type.clone(),
            data: transport::encode(&file.payload),
        };
        if is_image_media_type(&media_type) {
            content.push(ContentBlock::Image { source });
        } else {
            content.push(ContentBlock::Document { source });
        }
    }

    if !submission.text.is_empty() {
        content.push(ContentBlock::Text {
            text: submission.text.clone(),
        });
    }

    content
}

async fn request_reply(
    client: &reqwest::Client,
    config: &ChatRunnerConfig,
    messages: &[ApiMessage],
) -> anyhow::Result<String> {
    let Some(api_key) = config.api_key.as_deref() else {
        anyhow::bail!("no API key configured; set ANTHROPIC_API_KEY");
    };

    let response = client
        .post(&config.endpoint)
        .header("x-api-key", api_key)
        .header("anthropic-version", "2023-06-01")
        .json(&ChatRequest {
            model: &config.model_id,
            max_tokens: config.max_tokens,
            messages,
        })
        .send()
        .await
        .context("send request")?
        .error_for_status()
        .context("model endpoint")?;

    let parsed: ChatResponse = response.json().await.context("parse reply")?;
    parsed
        .content
        .into_iter()
        .find_map(|block| block.text)
        .context("reply contained no text block")
}
