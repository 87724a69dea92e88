//! Tool-using recommendation agent.
//!
//! An `Agent` drives a `ChatModel` through rounds of tool calls until the model
//! answers without requesting any more tools. Progress is reported as a stream
//! of `AgentEvent`s so callers never have to inspect raw model output.

pub mod anthropic;
pub mod model;
pub mod prompt;
pub mod session;
pub mod sse;
pub mod tool;

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::mpsc;

use crate::error::{AppError, AppResult};
use model::{ChatModel, ModelRequest, StreamEvent, ToolCall};
use session::AgentSession;
use tool::ToolRegistry;

pub use anthropic::{AnthropicModel, ModelSettings};
pub use tool::{Tool, ToolDefinition};

const EVENT_BUFFER: usize = 64;

/// Settings shared by every agent run
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub system_prompt: String,
    /// Upper bound on model rounds in one run
    pub max_turns: usize,
}

/// Progress of an agent run
#[derive(Debug, Clone, PartialEq)]
pub enum AgentEvent {
    ToolCallRequested {
        id: String,
        name: String,
        input: Value,
    },
    ToolResult {
        id: String,
        name: String,
        output: String,
    },
    /// Text produced by the model during round `turn` (1-based)
    ModelTextDelta { turn: usize, text: String },
    RunComplete { turns: usize },
}

#[derive(Clone)]
pub struct Agent {
    model: Arc<dyn ChatModel>,
    tools: ToolRegistry,
    config: Arc<AgentConfig>,
}

impl Agent {
    pub fn new(model: Arc<dyn ChatModel>, tools: ToolRegistry, config: Arc<AgentConfig>) -> Self {
        Self {
            model,
            tools,
            config,
        }
    }

    /// Starts a run for `instruction` and returns its event stream
    ///
    /// The stream ends after `RunComplete`, or right after an `Err` item if the
    /// run failed.
    pub fn stream(&self, instruction: impl Into<String>) -> mpsc::Receiver<AppResult<AgentEvent>> {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let agent = self.clone();
        let instruction = instruction.into();

        tokio::spawn(async move {
            if let Err(e) = agent.run(instruction, &tx).await {
                tracing::error!(error = %e, "Agent run failed");
                let _ = tx.send(Err(e)).await;
            }
        });

        rx
    }

    async fn run(
        &self,
        instruction: String,
        tx: &mpsc::Sender<AppResult<AgentEvent>>,
    ) -> AppResult<()> {
        let mut session = AgentSession::new(instruction);
        let definitions = self.tools.definitions();

        if self.tools.is_empty() {
            tracing::warn!("Agent run started without any tools");
        }
        tracing::info!(
            model = self.model.name(),
            tool_count = self.tools.len(),
            tools = ?self.tools.names(),
            "Agent run started"
        );

        for turn in 1..=self.config.max_turns {
            let request = ModelRequest {
                system: &self.config.system_prompt,
                messages: session.messages(),
                tools: &definitions,
            };
            let mut stream = self.model.stream(&request).await?;

            let mut text = String::new();
            let mut calls: Vec<ToolCall> = Vec::new();

            while let Some(event) = stream.recv().await {
                match event? {
                    StreamEvent::TextDelta(delta) => {
                        text.push_str(&delta);
                        if !emit(tx, AgentEvent::ModelTextDelta { turn, text: delta }).await {
                            return Ok(());
                        }
                    }
                    StreamEvent::ToolUse(call) => calls.push(call),
                    StreamEvent::Stop(reason) => {
                        tracing::debug!(turn, reason = ?reason, "Model turn stopped");
                    }
                }
            }

            session.push_assistant(&text, &calls);

            if calls.is_empty() {
                tracing::info!(
                    turns = turn,
                    tool_calls = session.trace().len(),
                    "Agent run completed"
                );
                emit(tx, AgentEvent::RunComplete { turns: turn }).await;
                return Ok(());
            }

            let mut results = Vec::with_capacity(calls.len());
            for call in calls {
                tracing::info!(turn, tool = %call.name, "Invoking tool");

                if !emit(
                    tx,
                    AgentEvent::ToolCallRequested {
                        id: call.id.clone(),
                        name: call.name.clone(),
                        input: call.input.clone(),
                    },
                )
                .await
                {
                    return Ok(());
                }

                let output = self.tools.dispatch(&call.name, call.input.clone()).await;

                if !emit(
                    tx,
                    AgentEvent::ToolResult {
                        id: call.id.clone(),
                        name: call.name.clone(),
                        output: output.clone(),
                    },
                )
                .await
                {
                    return Ok(());
                }

                results.push((call, output));
            }
            session.push_tool_results(results);
        }

        Err(AppError::Agent(format!(
            "Agent did not produce a final answer within {} turns",
            self.config.max_turns
        )))
    }
}

/// Sends an event; `false` once the receiver has gone away
async fn emit(tx: &mpsc::Sender<AppResult<AgentEvent>>, event: AgentEvent) -> bool {
    tx.send(Ok(event)).await.is_ok()
}
