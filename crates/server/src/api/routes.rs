use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use super::{handlers, jobs, middleware::metrics_middleware, status, upload};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Artifacts are served straight from the upload directory
    let artifacts = ServeDir::new(state.upload_dir());
    let max_upload_bytes = state.storage().max_upload_bytes;

    // API routes
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Jobs
        .route("/jobs", get(jobs::list_jobs))
        .route("/jobs/{id}", get(jobs::get_job))
        .with_state(Arc::clone(&state));

    Router::new()
        .route(
            "/upload",
            post(upload::upload_video).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/status/{filename}", get(status::get_status))
        .route("/metrics", get(handlers::metrics))
        .with_state(state)
        .nest("/api/v1", api_routes)
        .nest_service("/uploads", artifacts)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
