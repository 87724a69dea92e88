/// Anthropic Messages API backend
///
/// Sends the conversation with `stream: true` and turns the server-sent
/// events into `StreamEvent`s as they arrive.
use std::collections::HashMap;
use std::time::Duration;

use reqwest::Client as HttpClient;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tracing::instrument;

use super::model::{ChatModel, ModelRequest, StopReason, StreamEvent, ToolCall};
use super::sse::{SseDecoder, SseFrame};
use crate::error::{AppError, AppResult};

const ANTHROPIC_VERSION: &str = "2023-06-01";
const EVENT_BUFFER: usize = 64;

/// Fixed sampling parameters for the recommendation model
#[derive(Debug, Clone)]
pub struct ModelSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

#[derive(Clone)]
pub struct AnthropicModel {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    settings: ModelSettings,
}

impl AnthropicModel {
    pub fn new(api_key: String, api_url: String, settings: ModelSettings) -> AppResult<Self> {
        let http_client = HttpClient::builder().timeout(settings.timeout).build()?;

        Ok(Self {
            http_client,
            api_key,
            api_url,
            settings,
        })
    }

    fn request_body(&self, request: &ModelRequest<'_>) -> Value {
        json!({
            "model": self.settings.model,
            "max_tokens": self.settings.max_tokens,
            "temperature": self.settings.temperature,
            "system": request.system,
            "messages": request.messages,
            "tools": request.tools,
            "stream": true,
        })
    }

    async fn pump(
        mut response: reqwest::Response,
        tx: mpsc::Sender<AppResult<StreamEvent>>,
    ) {
        let mut decoder = SseDecoder::default();
        let mut assembler = TurnAssembler::default();

        loop {
            let chunk = match response.chunk().await {
                Ok(Some(chunk)) => chunk,
                Ok(None) => break,
                Err(e) => {
                    let _ = tx.send(Err(e.into())).await;
                    return;
                }
            };

            for frame in decoder.push(&chunk) {
                match assembler.apply(&frame) {
                    Ok(events) => {
                        for event in events {
                            if tx.send(Ok(event)).await.is_err() {
                                return;
                            }
                        }
                    }
                    Err(e) => {
                        let _ = tx.send(Err(e)).await;
                        return;
                    }
                }
            }
        }
    }
}

#[async_trait::async_trait]
impl ChatModel for AnthropicModel {
    #[instrument(skip(self, request), fields(model = %self.settings.model))]
    async fn stream(
        &self,
        request: &ModelRequest<'_>,
    ) -> AppResult<mpsc::Receiver<AppResult<StreamEvent>>> {
        let url = format!("{}/v1/messages", self.api_url);
        let response = self
            .http_client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&self.request_body(request))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "Model API returned status {}: {}",
                status, body
            )));
        }

        tracing::debug!(messages = request.messages.len(), "Model stream opened");

        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        tokio::spawn(Self::pump(response, tx));

        Ok(rx)
    }

    fn name(&self) -> &'static str {
        "anthropic"
    }
}

// ============================================================================
// Streaming wire types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ApiStreamEvent {
    MessageStart {},
    ContentBlockStart {
        index: usize,
        content_block: ApiContentBlock,
    },
    ContentBlockDelta {
        index: usize,
        delta: ApiDelta,
    },
    ContentBlockStop {
        index: usize,
    },
    MessageDelta {
        delta: ApiMessageDelta,
    },
    MessageStop {},
    Ping {},
    Error {
        error: ApiErrorBody,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ApiContentBlock {
    Text {
        #[serde(default)]
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        #[serde(default)]
        input: Value,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ApiDelta {
    TextDelta { text: String },
    InputJsonDelta { partial_json: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct ApiMessageDelta {
    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(rename = "type")]
    kind: String,
    message: String,
}

struct PendingToolUse {
    id: String,
    name: String,
    input: Value,
    partial_json: String,
}

/// Rebuilds complete tool calls from block-level stream events
#[derive(Default)]
struct TurnAssembler {
    pending: HashMap<usize, PendingToolUse>,
}

impl TurnAssembler {
    fn apply(&mut self, frame: &SseFrame) -> AppResult<Vec<StreamEvent>> {
        if frame.event.as_deref() == Some("ping") {
            return Ok(Vec::new());
        }

        let event: ApiStreamEvent = serde_json::from_str(&frame.data).map_err(|e| {
            AppError::ExternalApi(format!("Malformed model stream event: {}", e))
        })?;

        let mut out = Vec::new();

        match event {
            ApiStreamEvent::ContentBlockStart {
                index,
                content_block,
            } => match content_block {
                ApiContentBlock::Text { text } if !text.is_empty() => {
                    out.push(StreamEvent::TextDelta(text));
                }
                ApiContentBlock::ToolUse { id, name, input } => {
                    self.pending.insert(
                        index,
                        PendingToolUse {
                            id,
                            name,
                            input,
                            partial_json: String::new(),
                        },
                    );
                }
                _ => {}
            },
            ApiStreamEvent::ContentBlockDelta { index, delta } => match delta {
                ApiDelta::TextDelta { text } => out.push(StreamEvent::TextDelta(text)),
                ApiDelta::InputJsonDelta { partial_json } => {
                    if let Some(pending) = self.pending.get_mut(&index) {
                        pending.partial_json.push_str(&partial_json);
                    }
                }
                ApiDelta::Other => {}
            },
            ApiStreamEvent::ContentBlockStop { index } => {
                if let Some(pending) = self.pending.remove(&index) {
                    out.push(StreamEvent::ToolUse(pending.finish()?));
                }
            }
            ApiStreamEvent::MessageDelta { delta } => {
                if let Some(reason) = delta.stop_reason {
                    out.push(StreamEvent::Stop(StopReason::from(reason.as_str())));
                }
            }
            ApiStreamEvent::Error { error } => {
                return Err(AppError::ExternalApi(format!(
                    "Model stream error ({}): {}",
                    error.kind, error.message
                )));
            }
            ApiStreamEvent::MessageStart {}
            | ApiStreamEvent::MessageStop {}
            | ApiStreamEvent::Ping {}
            | ApiStreamEvent::Other => {}
        }

        Ok(out)
    }
}

impl PendingToolUse {
    fn finish(self) -> AppResult<ToolCall> {
        let input = if self.partial_json.trim().is_empty() {
            match self.input {
                Value::Null => json!({}),
                input => input,
            }
        } else {
            serde_json::from_str(&self.partial_json).map_err(|e| {
                AppError::ExternalApi(format!(
                    "Invalid arguments for tool call {}: {}",
                    self.name, e
                ))
            })?
        };

        Ok(ToolCall {
            id: self.id,
            name: self.name,
            input,
        })
    }
}
