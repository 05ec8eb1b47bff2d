use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::AppState;
use crate::classify::ApiError;
use crate::service::{BatchItemResult, LanguageListing, TranscriptSegment};

pub const SERVICE_NAME: &str = "youtube-transcript-api";

/// Segment shape of the single-video endpoint; timings stay numeric
#[derive(Debug, Serialize)]
pub struct RawSegment {
    pub text: String,
    pub start: f64,
    pub duration: f64,
}

impl From<TranscriptSegment> for RawSegment {
    fn from(segment: TranscriptSegment) -> Self {
        Self {
            text: segment.text,
            start: segment.start,
            duration: segment.duration,
        }
    }
}

/// One entry of a batch request body
#[derive(Debug, Deserialize)]
pub struct VideoRequest {
    pub id: String,
}

pub async fn root() -> Json<Value> {
    Json(json!({
        "message": "YouTube Transcript API Server",
        "docs": "/docs",
        "health": "/health",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": SERVICE_NAME,
    }))
}

pub async fn get_transcript(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> Result<Json<Vec<RawSegment>>, ApiError> {
    let segments = state.service.transcript(&video_id).await?;
    Ok(Json(segments.into_iter().map(RawSegment::from).collect()))
}

pub async fn get_languages(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> Result<Json<LanguageListing>, ApiError> {
    Ok(Json(state.service.languages(&video_id).await?))
}

/// Always answers 200 once the body is structurally valid; per-item
/// failures are reported inside the array
pub async fn post_batch(
    State(state): State<AppState>,
    payload: Result<Json<Vec<VideoRequest>>, JsonRejection>,
) -> Result<Json<Vec<BatchItemResult>>, ApiError> {
    let Json(requests) = payload.map_err(|rejection| {
        tracing::warn!("Rejected batch body: {}", rejection.body_text());
        ApiError::bad_request(format!("Invalid request body: {}", rejection.body_text()))
    })?;

    state.service.check_batch_size(requests.len())?;

    let ids = requests.into_iter().map(|request| request.id).collect();
    Ok(Json(state.service.batch(ids).await))
}
