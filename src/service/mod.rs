use futures_util::stream::{self, StreamExt};
use serde::ser::Serializer;
use serde::Serialize;
use std::sync::Arc;

use crate::classify::ApiError;
use crate::config::LimitsConfig;
use crate::fetcher::{TranscriptFetcher, TranscriptLanguageInfo};
use crate::utils::format_seconds;
use crate::validation::VideoId;

/// One caption unit annotated with the transcript's language
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscriptSegment {
    pub text: String,
    pub start: f64,
    pub duration: f64,
    pub language_code: String,
}

/// Transcripts available for a video
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LanguageListing {
    pub video_id: VideoId,
    pub available_transcripts: Vec<TranscriptLanguageInfo>,
}

/// Batch form of a segment; timings are strings for compatibility with
/// existing batch consumers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSegment {
    pub text: String,
    pub duration: String,
    pub offset: String,
    pub lang: String,
}

impl From<&TranscriptSegment> for BatchSegment {
    fn from(segment: &TranscriptSegment) -> Self {
        Self {
            text: segment.text.clone(),
            duration: format_seconds(segment.duration),
            offset: format_seconds(segment.start),
            lang: segment.language_code.clone(),
        }
    }
}

/// Outcome for one position of a batch request
#[derive(Debug, Clone, PartialEq)]
pub enum BatchItemResult {
    Success { transcript: Vec<BatchSegment> },
    Failure { error: String },
}

impl BatchItemResult {
    pub fn is_success(&self) -> bool {
        matches!(self, BatchItemResult::Success { .. })
    }
}

#[derive(Serialize)]
struct BatchItemBody<'a> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    transcript: Option<&'a [BatchSegment]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

impl Serialize for BatchItemResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let body = match self {
            BatchItemResult::Success { transcript } => BatchItemBody {
                success: true,
                transcript: Some(transcript.as_slice()),
                error: None,
            },
            BatchItemResult::Failure { error } => BatchItemBody {
                success: false,
                transcript: None,
                error: Some(error.as_str()),
            },
        };
        body.serialize(serializer)
    }
}

/// Request handlers for single, language-listing and batch lookups.
///
/// Every failure leaving this type has been classified into an [`ApiError`];
/// fetcher errors never escape raw.
#[derive(Clone)]
pub struct TranscriptService {
    fetcher: Arc<dyn TranscriptFetcher>,
    max_batch_size: usize,
    batch_concurrency: usize,
}

impl TranscriptService {
    pub fn new(fetcher: Arc<dyn TranscriptFetcher>) -> Self {
        let limits = LimitsConfig::default();
        Self {
            fetcher,
            max_batch_size: limits.max_batch_size,
            batch_concurrency: limits.batch_concurrency,
        }
    }

    pub fn with_limits(mut self, limits: &LimitsConfig) -> Self {
        self.max_batch_size = limits.max_batch_size.max(1);
        self.batch_concurrency = limits.batch_concurrency.max(1);
        self
    }

    pub fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }

    /// Fetch the transcript for one video
    pub async fn transcript(&self, raw_id: &str) -> Result<Vec<TranscriptSegment>, ApiError> {
        let video_id = VideoId::parse(raw_id)?;

        tracing::info!("Fetching transcript for {}", video_id);
        let transcript = self
            .fetcher
            .fetch(&video_id)
            .await
            .map_err(|err| classified(raw_id, ApiError::from_fetch(raw_id, &err)))?;

        tracing::debug!(
            "Fetched {} {} segments for {}",
            transcript.snippets.len(),
            transcript.language_code,
            video_id
        );

        let language_code = transcript.language_code;
        Ok(transcript
            .snippets
            .into_iter()
            .map(|snippet| TranscriptSegment {
                text: snippet.text,
                start: snippet.start,
                duration: snippet.duration,
                language_code: language_code.clone(),
            })
            .collect())
    }

    /// List the transcripts available for one video
    pub async fn languages(&self, raw_id: &str) -> Result<LanguageListing, ApiError> {
        let video_id = VideoId::parse(raw_id)?;

        tracing::info!("Listing transcript languages for {}", video_id);
        let available_transcripts = self
            .fetcher
            .list_languages(&video_id)
            .await
            .map_err(|err| classified(raw_id, ApiError::from_fetch(raw_id, &err)))?;

        Ok(LanguageListing {
            video_id,
            available_transcripts,
        })
    }

    /// Reject batches that are empty or larger than the configured maximum
    pub fn check_batch_size(&self, len: usize) -> Result<(), ApiError> {
        if len == 0 || len > self.max_batch_size {
            return Err(ApiError::bad_request(format!(
                "Batch must contain between 1 and {} video IDs, got {}",
                self.max_batch_size, len
            )));
        }
        Ok(())
    }

    /// Fetch transcripts for every id, one result per input position.
    ///
    /// Items run with bounded concurrency but results are assigned by input
    /// index, so output order always mirrors input order.
    pub async fn batch(&self, raw_ids: Vec<String>) -> Vec<BatchItemResult> {
        tracing::info!(
            "Processing batch of {} videos (concurrency {})",
            raw_ids.len(),
            self.batch_concurrency
        );

        let results: Vec<BatchItemResult> = stream::iter(raw_ids)
            .map(|raw_id| async move {
                match self.transcript(&raw_id).await {
                    Ok(segments) => BatchItemResult::Success {
                        transcript: segments.iter().map(BatchSegment::from).collect(),
                    },
                    Err(err) => BatchItemResult::Failure { error: err.message },
                }
            })
            .buffered(self.batch_concurrency)
            .collect()
            .await;

        let failed = results.iter().filter(|r| !r.is_success()).count();
        tracing::info!(
            "Batch complete: {} succeeded, {} failed",
            results.len() - failed,
            failed
        );

        results
    }
}

fn classified(raw_id: &str, err: ApiError) -> ApiError {
    tracing::warn!("Request for {} failed ({:?}): {}", raw_id, err.code, err.message);
    err
}
