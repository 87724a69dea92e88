use serde_json::{json, Value};
use std::sync::Arc;

use crate::{agent::Tool, services::providers::SearchProvider};

pub const SEARCH_TOOL_NAME: &str = "search_similar_content";

/// Internet search exposed to the agent
#[derive(Clone)]
pub struct WebSearchTool {
    provider: Arc<dyn SearchProvider>,
}

impl WebSearchTool {
    pub fn new(provider: Arc<dyn SearchProvider>) -> Self {
        Self { provider }
    }

    /// Raw result text, or a description of why the search failed
    pub async fn search_similar_content(&self, query: &str) -> String {
        match self.provider.search(query).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(
                    query = %query,
                    provider = self.provider.name(),
                    error = %e,
                    "Web search failed"
                );
                format!("Error searching for \"{}\": {}", query, e)
            }
        }
    }
}

#[async_trait::async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &'static str {
        SEARCH_TOOL_NAME
    }

    fn description(&self) -> &'static str {
        "Search the internet for books, courses, articles or videos similar to a topic or title."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Free-text search query"
                }
            },
            "required": ["query"]
        })
    }

    async fn invoke(&self, args: Value) -> String {
        match args.get("query").and_then(Value::as_str) {
            Some(query) => self.search_similar_content(query).await,
            None => format!(
                "Error: {} requires a string `query` argument, got {}",
                SEARCH_TOOL_NAME, args
            ),
        }
    }
}
