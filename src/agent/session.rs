use serde_json::Value;

use super::model::{ContentBlock, Message, ToolCall};

/// A tool call and what it returned
#[derive(Debug, Clone)]
pub struct ToolTrace {
    pub name: String,
    pub input: Value,
    pub output: String,
}

/// Conversation state for a single agent run
///
/// Lives only as long as the run; nothing is carried over between requests.
#[derive(Debug, Default)]
pub struct AgentSession {
    messages: Vec<Message>,
    trace: Vec<ToolTrace>,
}

impl AgentSession {
    pub fn new(instruction: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::user(instruction)],
            trace: Vec::new(),
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn trace(&self) -> &[ToolTrace] {
        &self.trace
    }

    /// Records the model's turn; empty turns are not stored
    pub fn push_assistant(&mut self, text: &str, calls: &[ToolCall]) {
        let mut content = Vec::new();
        if !text.is_empty() {
            content.push(ContentBlock::Text {
                text: text.to_string(),
            });
        }
        content.extend(calls.iter().map(|call| ContentBlock::ToolUse {
            id: call.id.clone(),
            name: call.name.clone(),
            input: call.input.clone(),
        }));

        if !content.is_empty() {
            self.messages.push(Message::assistant(content));
        }
    }

    /// Appends tool outputs, in call order, as one user message
    pub fn push_tool_results(&mut self, results: Vec<(ToolCall, String)>) {
        if results.is_empty() {
            return;
        }

        let mut content = Vec::with_capacity(results.len());
        for (call, output) in results {
            content.push(ContentBlock::ToolResult {
                tool_use_id: call.id.clone(),
                content: output.clone(),
            });
            self.trace.push(ToolTrace {
                name: call.name,
                input: call.input,
                output,
            });
        }

        self.messages.push(Message::tool_results(content));
    }
}
