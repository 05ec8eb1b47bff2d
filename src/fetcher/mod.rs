use async_trait::async_trait;
use serde::Serialize;

pub mod captions;
pub mod timeout;
pub mod youtube;

pub use timeout::TimeoutFetcher;
pub use youtube::YoutubeFetcher;

use crate::validation::VideoId;

/// One caption entry as delivered by the platform
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snippet {
    pub text: String,

    /// Offset from the start of the video in seconds
    pub start: f64,

    /// Display duration in seconds
    pub duration: f64,
}

/// A fetched transcript in a single language.
///
/// Snippets are kept in caption order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transcript {
    /// Human readable language name (e.g. "English (auto-generated)")
    pub language: String,

    /// Language tag of every snippet (e.g. "en")
    pub language_code: String,

    /// Whether the captions were generated by speech recognition
    pub is_generated: bool,

    pub snippets: Vec<Snippet>,
}

/// Describes one transcript that can be fetched for a video
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranscriptLanguageInfo {
    pub language: String,
    pub language_code: String,
    pub is_generated: bool,
    pub is_translatable: bool,
}

/// Failure kinds a fetcher may report.
///
/// Every call either succeeds completely or fails with exactly one of these.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("video is unavailable")]
    VideoUnavailable,

    #[error("no transcript found in the requested languages")]
    NoTranscriptFound,

    #[error("transcripts are disabled for this video")]
    TranscriptsDisabled,

    #[error("request was blocked by YouTube")]
    RequestBlocked,

    #[error("{0}")]
    Upstream(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.status().map(|s| s.as_u16()) == Some(429) {
            return FetchError::RequestBlocked;
        }
        FetchError::Upstream(err.to_string())
    }
}

/// Retrieves transcript data for a video from the hosting platform.
///
/// Network access, proxies and retries are implementation details; callers
/// only see the [`FetchError`] taxonomy.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranscriptFetcher: Send + Sync {
    /// Fetch the transcript in the implementation's preferred language
    async fn fetch(&self, video_id: &VideoId) -> Result<Transcript, FetchError>;

    /// List every transcript available for the video
    async fn list_languages(
        &self,
        video_id: &VideoId,
    ) -> Result<Vec<TranscriptLanguageInfo>, FetchError>;

    /// Name used in logs
    fn name(&self) -> &'static str;
}
