//! Upload API handler.

use std::path::Path;
use std::sync::Arc;

use axum::{
    extract::{multipart::Field, Multipart, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tracing::{error, info, warn};

use hlsladder_core::{Job, JobLayout};

use super::handlers::ErrorResponse;
use crate::metrics::UPLOADS_TOTAL;
use crate::state::AppState;

/// Multipart field carrying the source video.
pub const VIDEO_FIELD: &str = "video";

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub message: String,
    pub filename: String,
    /// Master manifest path relative to `/uploads`.
    pub hls_master: String,
}

type UploadError = (StatusCode, Json<ErrorResponse>);

fn reject(code: StatusCode, outcome: &str, message: impl Into<String>) -> UploadError {
    UPLOADS_TOTAL.with_label_values(&[outcome]).inc();
    (code, Json(ErrorResponse::new(message)))
}

/// POST /upload
///
/// Saves the uploaded video, starts its transcode job in the background and
/// replies 202 before any rendition has been encoded.
pub async fn upload_video(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), UploadError> {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                return Err(reject(
                    StatusCode::BAD_REQUEST,
                    "rejected",
                    format!("Malformed multipart body: {}", e),
                ))
            }
        };

        if field.name() != Some(VIDEO_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or("").to_string();
        if filename.is_empty() {
            return Err(reject(StatusCode::BAD_REQUEST, "rejected", "No file selected"));
        }

        let layout = JobLayout::new(state.upload_dir(), &filename).map_err(|e| {
            reject(
                StatusCode::BAD_REQUEST,
                "rejected",
                format!("Invalid file name: {}", e),
            )
        })?;

        if !layout.has_allowed_extension(&state.storage().allowed_extensions) {
            return Err(reject(StatusCode::BAD_REQUEST, "rejected", "Invalid file type"));
        }

        // Claim the id and output directory before touching the source
        // file, so a running job's input is never overwritten
        let reservation = match state
            .runner()
            .reserve(Job::new(&layout, state.ladder().clone()))
            .await
        {
            Ok(reservation) => reservation,
            Err(e) => {
                warn!(filename = %layout.filename, error = %e, "Upload conflicts with an active job");
                return Err(reject(StatusCode::CONFLICT, "conflict", e.to_string()));
            }
        };

        if let Err(e) = save_field(field, &layout.source_path).await {
            error!(filename = %layout.filename, error = %e, "Failed to save upload");
            return Err(reject(
                StatusCode::INTERNAL_SERVER_ERROR,
                "failed",
                format!("Failed to save upload: {}", e),
            ));
        }

        if let Err(e) = tokio::fs::create_dir_all(&layout.output_dir).await {
            error!(filename = %layout.filename, error = %e, "Failed to create output directory");
            return Err(reject(
                StatusCode::INTERNAL_SERVER_ERROR,
                "failed",
                "Failed to create output directory",
            ));
        }

        reservation.start();
        UPLOADS_TOTAL.with_label_values(&["accepted"]).inc();
        info!(filename = %layout.filename, hls_master = %layout.hls_master, "Upload accepted");
        return Ok((
            StatusCode::ACCEPTED,
            Json(UploadResponse {
                message: "File uploaded, HLS conversion started".to_string(),
                filename: layout.filename,
                hls_master: layout.hls_master,
            }),
        ));
    }

    Err(reject(StatusCode::BAD_REQUEST, "rejected", "No video part"))
}

/// Streams a multipart field to `path`, chunk by chunk.
async fn save_field(mut field: Field<'_>, path: &Path) -> anyhow::Result<()> {
    let mut file = tokio::fs::File::create(path).await?;
    while let Some(chunk) = field.chunk().await? {
        file.write_all(&chunk).await?;
    }
    file.flush().await?;
    Ok(())
}
