//! Job record API handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use hlsladder_core::JobRecord;
use std::sync::Arc;

use super::handlers::ErrorResponse;
use crate::state::AppState;

/// GET /api/v1/jobs
pub async fn list_jobs(State(state): State<Arc<AppState>>) -> Json<Vec<JobRecord>> {
    Json(state.runner().jobs().await)
}

/// GET /api/v1/jobs/{id}
pub async fn get_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<JobRecord>, (StatusCode, Json<ErrorResponse>)> {
    state.runner().job(&id).await.map(Json).ok_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new(format!("Job not found: {}", id))),
        )
    })
}
