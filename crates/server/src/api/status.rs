//! Status API handler.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use hlsladder_core::JobStatusView;
use std::sync::Arc;

use crate::state::AppState;

/// GET /status/{filename}
///
/// 404 for unknown uploads, 500 when the manifest could not be read,
/// 200 otherwise.
pub async fn get_status(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> (StatusCode, Json<JobStatusView>) {
    let view = state.status().status(&filename).await;
    let code = StatusCode::from_u16(view.http_status()).unwrap_or(StatusCode::OK);
    (code, Json(view))
}
