use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, COOKIE};
use reqwest::{Client, Proxy, Response};
use serde_json::{json, Value};
use std::time::Duration;

use super::captions::{self, CaptionTrack};
use super::{FetchError, Transcript, TranscriptFetcher, TranscriptLanguageInfo};
use crate::config::Config;
use crate::validation::VideoId;

const WATCH_URL: &str = "https://www.youtube.com/watch";
const INNERTUBE_PLAYER_URL: &str = "https://www.youtube.com/youtubei/v1/player";
const INNERTUBE_CLIENT_NAME: &str = "ANDROID";
const INNERTUBE_CLIENT_VERSION: &str = "20.10.38";

/// Fetches transcripts straight from YouTube's InnerTube API
pub struct YoutubeFetcher {
    client: Client,
    languages: Vec<String>,
}

impl YoutubeFetcher {
    pub fn new(config: &Config) -> crate::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US"));

        let mut builder = Client::builder()
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(10));

        if let Some(proxy) = config.active_proxy() {
            tracing::info!("Routing YouTube requests through proxy {}", proxy.url);
            builder = builder.proxy(
                Proxy::all(proxy.url.as_str())
                    .map_err(|e| anyhow::anyhow!("Invalid proxy URL {}: {}", proxy.url, e))?
                    .basic_auth(&format!("{}-rotate", proxy.username), &proxy.password),
            );
        }

        let client = builder
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {}", e))?;

        Ok(Self {
            client,
            languages: config.youtube.languages.clone(),
        })
    }

    /// Fetch the watch page, accepting the consent interstitial if shown
    async fn fetch_video_html(&self, video_id: &VideoId) -> Result<String, FetchError> {
        tracing::debug!("Fetching watch page for {}", video_id);

        let html = self.get_watch_page(video_id, None).await?;
        if !captions::is_consent_page(&html) {
            return Ok(html);
        }

        let cookie = captions::consent_cookie(&html).ok_or_else(|| {
            FetchError::Upstream("failed to create consent cookie".to_string())
        })?;

        tracing::debug!("Accepting consent form for {}", video_id);
        let html = self.get_watch_page(video_id, Some(&cookie)).await?;
        if captions::is_consent_page(&html) {
            return Err(FetchError::Upstream(
                "failed to create consent cookie".to_string(),
            ));
        }

        Ok(html)
    }

    async fn get_watch_page(
        &self,
        video_id: &VideoId,
        cookie: Option<&str>,
    ) -> Result<String, FetchError> {
        let mut request = self.client.get(WATCH_URL).query(&[("v", video_id.as_str())]);
        if let Some(cookie) = cookie {
            request = request.header(COOKIE, cookie);
        }

        let response = check_status(request.send().await?)?;
        Ok(response.text().await?)
    }

    /// Ask the InnerTube player endpoint for the video's metadata
    async fn fetch_player_response(
        &self,
        video_id: &VideoId,
        api_key: &str,
    ) -> Result<Value, FetchError> {
        tracing::debug!("Requesting InnerTube player data for {}", video_id);

        let body = json!({
            "context": {
                "client": {
                    "clientName": INNERTUBE_CLIENT_NAME,
                    "clientVersion": INNERTUBE_CLIENT_VERSION
                }
            },
            "videoId": video_id.as_str()
        });

        let response = self
            .client
            .post(INNERTUBE_PLAYER_URL)
            .query(&[("key", api_key)])
            .json(&body)
            .send()
            .await?;

        check_status(response)?
            .json::<Value>()
            .await
            .map_err(|e| FetchError::Upstream(format!("failed to parse InnerTube response: {}", e)))
    }

    async fn caption_tracks(&self, video_id: &VideoId) -> Result<Vec<CaptionTrack>, FetchError> {
        let html = self.fetch_video_html(video_id).await?;
        let api_key = captions::extract_api_key(&html)?;
        let player = self.fetch_player_response(video_id, &api_key).await?;
        captions::parse_caption_tracks(&player)
    }

    async fn download_track(&self, track: &CaptionTrack) -> Result<Transcript, FetchError> {
        if track.requires_po_token() {
            return Err(FetchError::Upstream(
                "caption track requires a PO token".to_string(),
            ));
        }

        let response = check_status(self.client.get(&track.base_url).send().await?)?;
        let xml = response.text().await?;

        Ok(Transcript {
            language: track.language.clone(),
            language_code: track.language_code.clone(),
            is_generated: track.is_generated,
            snippets: captions::parse_timedtext(&xml),
        })
    }
}

fn check_status(response: Response) -> Result<Response, FetchError> {
    let status = response.status();
    if status.as_u16() == 429 {
        return Err(FetchError::RequestBlocked);
    }
    if !status.is_success() {
        return Err(FetchError::Upstream(format!(
            "YouTube returned HTTP {}",
            status
        )));
    }
    Ok(response)
}

#[async_trait]
impl TranscriptFetcher for YoutubeFetcher {
    async fn fetch(&self, video_id: &VideoId) -> Result<Transcript, FetchError> {
        let tracks = self.caption_tracks(video_id).await?;

        let track = captions::select_track(&tracks, &self.languages)
            .ok_or(FetchError::NoTranscriptFound)?;

        tracing::debug!(
            "Downloading {} transcript ({}) for {}",
            track.language_code,
            if track.is_generated { "generated" } else { "manual" },
            video_id
        );

        self.download_track(track).await
    }

    async fn list_languages(
        &self,
        video_id: &VideoId,
    ) -> Result<Vec<TranscriptLanguageInfo>, FetchError> {
        let tracks = self.caption_tracks(video_id).await?;
        Ok(tracks.iter().map(CaptionTrack::info).collect())
    }

    fn name(&self) -> &'static str {
        "YouTube"
    }
}
