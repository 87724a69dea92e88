use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::{
    agent::{prompt::user_instruction, Agent, AgentEvent},
    error::{AppError, AppResult},
    models::{Recommendation, RecommendationResponse},
};

pub const NO_RECOMMENDATIONS: &str = "No recommendations found.";

/// Runs the agent for a user and returns its final textual answer, if any
pub async fn final_answer_for_user(agent: &Agent, user_id: i64) -> AppResult<Option<String>> {
    let events = agent.stream(user_instruction(user_id));
    collect_final_answer(events).await
}

/// Drains an agent run and keeps the text of the last model turn that said anything
pub async fn collect_final_answer(
    mut events: mpsc::Receiver<AppResult<AgentEvent>>,
) -> AppResult<Option<String>> {
    let mut last: Option<(usize, String)> = None;
    let mut completed = false;

    while let Some(event) = events.recv().await {
        match event? {
            AgentEvent::ModelTextDelta { turn, text } => match last.as_mut() {
                Some((current, buffer)) if *current == turn => buffer.push_str(&text),
                _ => last = Some((turn, text)),
            },
            AgentEvent::ToolCallRequested { name, input, .. } => {
                tracing::debug!(tool = %name, input = %input, "Agent requested tool");
            }
            AgentEvent::ToolResult { name, output, .. } => {
                tracing::debug!(tool = %name, bytes = output.len(), "Tool returned");
            }
            AgentEvent::RunComplete { turns } => {
                tracing::debug!(turns, "Agent run complete");
                completed = true;
            }
        }
    }

    if !completed {
        return Err(AppError::Internal(
            "Agent run ended without completing".to_string(),
        ));
    }

    Ok(last
        .map(|(_, text)| text)
        .filter(|text| !text.trim().is_empty()))
}

/// Strict parse: a JSON array whose every element is a well-formed recommendation
///
/// The elements come back untouched once they validate.
pub fn parse_recommendations(text: &str) -> Result<Vec<Value>, serde_json::Error> {
    let records: Vec<Value> = serde_json::from_str(text.trim())?;
    for record in &records {
        Recommendation::deserialize(record)?;
    }
    Ok(records)
}

/// Maps the agent's final answer onto the endpoint's status and body
pub fn interpret_final_answer(final_text: Option<String>) -> (StatusCode, RecommendationResponse) {
    let Some(text) = final_text else {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            RecommendationResponse::failed(NO_RECOMMENDATIONS),
        );
    };

    match parse_recommendations(&text) {
        Ok(recommendations) => (StatusCode::OK, RecommendationResponse::parsed(recommendations)),
        Err(e) => {
            tracing::warn!(error = %e, "Agent answer is not a recommendation array");
            (StatusCode::OK, RecommendationResponse::degraded(text))
        }
    }
}
