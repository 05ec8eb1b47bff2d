//! Maps validation and fetcher failures onto the externally visible error
//! taxonomy.
//!
//! Both the single-video and batch paths build their error text here, so the
//! two can never drift apart.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use std::time::Duration;

use crate::fetcher::FetchError;
use crate::validation::ValidationError;

pub const INVALID_VIDEO_ID: &str =
    "Invalid video ID format. YouTube video IDs must be exactly 11 characters.";
pub const REQUEST_BLOCKED: &str = "Request blocked. Please try again later.";

/// Stable external error categories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    BadRequest,
    NotFound,
    Forbidden,
    RateLimited,
    Internal,
}

impl ErrorCode {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorCode::BadRequest => StatusCode::BAD_REQUEST,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// A classified failure, ready to be shown to a caller
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
    retry_after: Option<Duration>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    detail: &'a str,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            retry_after: None,
        }
    }

    /// Classify a fetcher failure for `video_id`
    pub fn from_fetch(video_id: &str, err: &FetchError) -> Self {
        match err {
            FetchError::VideoUnavailable => Self::new(
                ErrorCode::NotFound,
                format!("Video with ID '{}' is not available", video_id),
            ),
            FetchError::NoTranscriptFound => Self::new(
                ErrorCode::NotFound,
                format!("No transcript found for video ID '{}'", video_id),
            ),
            FetchError::TranscriptsDisabled => Self::new(
                ErrorCode::Forbidden,
                format!("Transcripts are disabled for video ID '{}'", video_id),
            ),
            FetchError::RequestBlocked => Self::new(ErrorCode::RateLimited, REQUEST_BLOCKED),
            FetchError::Upstream(detail) => Self::new(
                ErrorCode::Internal,
                format!("An error occurred while fetching the transcript: {}", detail),
            ),
        }
    }

    /// Structurally invalid request (batch size, malformed body)
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, message)
    }

    /// Local throttling by the rate limiter
    pub fn rate_limited(limit: u32, window: Duration, retry_after: Duration) -> Self {
        Self {
            retry_after: Some(retry_after),
            ..Self::new(
                ErrorCode::RateLimited,
                format!(
                    "Rate limit exceeded: {} per {} seconds",
                    limit,
                    window.as_secs()
                ),
            )
        }
    }

    pub fn status(&self) -> StatusCode {
        self.code.status()
    }
}

impl From<ValidationError> for ApiError {
    fn from(_: ValidationError) -> Self {
        Self::new(ErrorCode::BadRequest, INVALID_VIDEO_ID)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = (
            self.status(),
            Json(ErrorBody {
                detail: &self.message,
            }),
        )
            .into_response();

        if let Some(retry_after) = self.retry_after {
            // Round up so clients never retry early
            let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
            if let Ok(value) = HeaderValue::from_str(&secs.max(1).to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "dQw4w9WgXcQ";

    #[test]
    fn test_fetch_error_table() {
        let cases = [
            (
                FetchError::VideoUnavailable,
                ErrorCode::NotFound,
                404,
                "Video with ID 'dQw4w9WgXcQ' is not available",
            ),
            (
                FetchError::NoTranscriptFound,
                ErrorCode::NotFound,
                404,
                "No transcript found for video ID 'dQw4w9WgXcQ'",
            ),
            (
                FetchError::TranscriptsDisabled,
                ErrorCode::Forbidden,
                403,
                "Transcripts are disabled for video ID 'dQw4w9WgXcQ'",
            ),
            (
                FetchError::RequestBlocked,
                ErrorCode::RateLimited,
                429,
                "Request blocked. Please try again later.",
            ),
            (
                FetchError::Upstream("connection reset".to_string()),
                ErrorCode::Internal,
                500,
                "An error occurred while fetching the transcript: connection reset",
            ),
        ];

        for (err, code, status, message) in cases {
            let classified = ApiError::from_fetch(ID, &err);
            assert_eq!(classified.code, code);
            assert_eq!(classified.status().as_u16(), status);
            assert_eq!(classified.message, message);
            assert_eq!(classified.to_string(), message);
        }
    }

    #[test]
    fn test_validation_errors_are_bad_requests() {
        for err in [
            ValidationError::BadLength { length: 5 },
            ValidationError::BadCharset { character: '!' },
        ] {
            let classified = ApiError::from(err);
            assert_eq!(classified.code, ErrorCode::BadRequest);
            assert_eq!(classified.status(), StatusCode::BAD_REQUEST);
            assert_eq!(classified.message, INVALID_VIDEO_ID);
        }
    }

    #[test]
    fn test_rate_limited_response_has_retry_after() {
        let err = ApiError::rate_limited(5, Duration::from_secs(60), Duration::from_millis(12_300));
        assert_eq!(err.message, "Rate limit exceeded: 5 per 60 seconds");

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "13");
    }

    #[test]
    fn test_classified_response_has_no_retry_after() {
        let response = ApiError::from_fetch(ID, &FetchError::TranscriptsDisabled).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(response.headers().get(header::RETRY_AFTER).is_none());
    }
}
