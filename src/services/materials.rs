use serde_json::{json, Value};
use std::sync::Arc;

use crate::{agent::Tool, db::MaterialsStore, models::LearningItem};

pub const MATERIALS_TOOL_NAME: &str = "get_user_learning_materials";

/// Message returned when a user has no public learning items
pub fn no_materials_message(user_id: i64) -> String {
    format!("User {} has no learning materials yet.", user_id)
}

/// One summary line per item, in the order given
pub fn render_listing(items: &[LearningItem]) -> String {
    items
        .iter()
        .map(LearningItem::summary_line)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Summarises what a user is learning for the agent
///
/// Storage failures come back as text rather than errors so the agent can
/// still answer from search alone.
#[derive(Clone)]
pub struct MaterialsReader {
    store: Arc<dyn MaterialsStore>,
}

impl MaterialsReader {
    pub fn new(store: Arc<dyn MaterialsStore>) -> Self {
        Self { store }
    }

    pub async fn fetch_materials(&self, user_id: i64) -> String {
        match self.store.public_items(user_id).await {
            Ok(items) if items.is_empty() => no_materials_message(user_id),
            Ok(items) => render_listing(&items),
            Err(e) => {
                tracing::warn!(user_id, error = %e, "Materials lookup failed");
                format!("Error fetching materials for user {}: {}", user_id, e)
            }
        }
    }
}

fn parse_user_id(args: &Value) -> Option<i64> {
    match args.get("user_id")? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[async_trait::async_trait]
impl Tool for MaterialsReader {
    fn name(&self) -> &'static str {
        MATERIALS_TOOL_NAME
    }

    fn description(&self) -> &'static str {
        "Get the books, courses, articles and videos a user is currently learning or has completed."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "user_id": {
                    "type": "integer",
                    "description": "Identifier of the user whose materials to fetch"
                }
            },
            "required": ["user_id"]
        })
    }

    async fn invoke(&self, args: Value) -> String {
        match parse_user_id(&args) {
            Some(user_id) => self.fetch_materials(user_id).await,
            None => format!(
                "Error: {} requires an integer `user_id` argument, got {}",
                MATERIALS_TOOL_NAME, args
            ),
        }
    }
}
