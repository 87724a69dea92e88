use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// A capability the agent may call while working on a request
///
/// `invoke` never fails: problems are reported back as text so the model can
/// read them and carry on.
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// JSON schema of the tool's input object
    fn parameters(&self) -> Value;

    async fn invoke(&self, args: Value) -> String;
}

/// Tool description sent to the model
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// Ordered set of tools, dispatched by name
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a tool, replacing any earlier tool with the same name
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.retain(|existing| existing.name() != tool.name());
        self.tools.push(tool);
    }

    pub fn with(mut self, tool: Arc<dyn Tool>) -> Self {
        self.register(tool);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|tool| tool.name() == name)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.tools.iter().map(|tool| tool.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .iter()
            .map(|tool| ToolDefinition {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                input_schema: tool.parameters(),
            })
            .collect()
    }

    /// Runs the named tool; an unknown name yields an error string
    pub async fn dispatch(&self, name: &str, args: Value) -> String {
        match self.get(name) {
            Some(tool) => tool.invoke(args).await,
            None => {
                tracing::warn!(tool = %name, "Model requested an unknown tool");
                format!(
                    "Error: unknown tool `{}`. Available tools: {}",
                    name,
                    self.names().join(", ")
                )
            }
        }
    }
}
