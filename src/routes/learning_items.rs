use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::{error::AppResult, models::LearningItem, routes::AppState};

/// Handler listing a user's public learning items, newest first
pub async fn list_public(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
) -> AppResult<Json<Vec<LearningItem>>> {
    let items = state.store.public_items(user_id).await?;
    Ok(Json(items))
}
