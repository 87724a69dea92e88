use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use std::sync::Arc;

use crate::{
    middleware::request_id::RequestId,
    models::RecommendationResponse,
    routes::AppState,
    services::recommendations,
};

/// Handler for the per-user recommendations endpoint
///
/// Never answers with a non-JSON body: failures come back as a 500 with an
/// empty list and an `error` message.
pub async fn recommend(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Path(user_id): Path<i64>,
) -> (StatusCode, Json<RecommendationResponse>) {
    tracing::info!(
        request_id = %request_id,
        user_id,
        "Processing recommendation request"
    );

    let agent = state.build_agent();

    let (status, body) = match recommendations::final_answer_for_user(&agent, user_id).await {
        Ok(final_text) => recommendations::interpret_final_answer(final_text),
        Err(e) => {
            tracing::error!(request_id = %request_id, user_id, error = %e, "Recommendation run failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                RecommendationResponse::failed(e.to_string()),
            )
        }
    };

    tracing::info!(
        request_id = %request_id,
        status = status.as_u16(),
        recommendations = body.recommendations.len(),
        degraded = body.raw.is_some(),
        "Recommendation request finished"
    );

    (status, Json(body))
}
