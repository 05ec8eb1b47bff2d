//! Per-call time bound for any fetcher.
//!
//! Each call is wrapped on its own, so a slow video only fails that video
//! and never the whole batch it belongs to.

use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

use super::{FetchError, Transcript, TranscriptFetcher, TranscriptLanguageInfo};
use crate::validation::VideoId;

/// Wraps another fetcher and fails calls that exceed `limit`
pub struct TimeoutFetcher<F> {
    inner: F,
    limit: Duration,
}

impl<F> TimeoutFetcher<F>
where
    F: TranscriptFetcher,
{
    pub fn new(inner: F, limit: Duration) -> Self {
        Self { inner, limit }
    }

    async fn bounded<T>(
        &self,
        video_id: &VideoId,
        call: impl Future<Output = Result<T, FetchError>>,
    ) -> Result<T, FetchError> {
        match tokio::time::timeout(self.limit, call).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    "{} call for {} timed out after {:?}",
                    self.inner.name(),
                    video_id,
                    self.limit
                );
                Err(FetchError::Upstream(format!(
                    "request timed out after {} seconds",
                    self.limit.as_secs_f64()
                )))
            }
        }
    }
}

#[async_trait]
impl<F> TranscriptFetcher for TimeoutFetcher<F>
where
    F: TranscriptFetcher,
{
    async fn fetch(&self, video_id: &VideoId) -> Result<Transcript, FetchError> {
        self.bounded(video_id, self.inner.fetch(video_id)).await
    }

    async fn list_languages(
        &self,
        video_id: &VideoId,
    ) -> Result<Vec<TranscriptLanguageInfo>, FetchError> {
        self.bounded(video_id, self.inner.list_languages(video_id)).await
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SlowFetcher {
        delay: Duration,
    }

    #[async_trait]
    impl TranscriptFetcher for SlowFetcher {
        async fn fetch(&self, _video_id: &VideoId) -> Result<Transcript, FetchError> {
            tokio::time::sleep(self.delay).await;
            Ok(Transcript {
                language: "English".to_string(),
                language_code: "en".to_string(),
                is_generated: false,
                snippets: Vec::new(),
            })
        }

        async fn list_languages(
            &self,
            _video_id: &VideoId,
        ) -> Result<Vec<TranscriptLanguageInfo>, FetchError> {
            tokio::time::sleep(self.delay).await;
            Err(FetchError::VideoUnavailable)
        }

        fn name(&self) -> &'static str {
            "slow"
        }
    }

    fn video_id() -> VideoId {
        VideoId::parse("dQw4w9WgXcQ").unwrap()
    }

    #[tokio::test]
    async fn test_fast_calls_pass_through() {
        let fetcher = TimeoutFetcher::new(
            SlowFetcher { delay: Duration::from_millis(1) },
            Duration::from_secs(5),
        );

        let transcript = fetcher.fetch(&video_id()).await.unwrap();
        assert_eq!(transcript.language_code, "en");

        // Inner errors are not rewritten
        assert_eq!(
            fetcher.list_languages(&video_id()).await,
            Err(FetchError::VideoUnavailable)
        );
    }

    #[tokio::test]
    async fn test_slow_calls_become_upstream_failures() {
        let fetcher = TimeoutFetcher::new(
            SlowFetcher { delay: Duration::from_secs(10) },
            Duration::from_millis(20),
        );

        match fetcher.fetch(&video_id()).await {
            Err(FetchError::Upstream(detail)) => assert!(detail.contains("timed out")),
            other => panic!("expected timeout, got {other:?}"),
        }
        assert!(matches!(
            fetcher.list_languages(&video_id()).await,
            Err(FetchError::Upstream(_))
        ));
        assert_eq!(fetcher.name(), "slow");
    }
}
