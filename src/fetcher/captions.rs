//! Parsing of YouTube watch pages, InnerTube player responses and timed-text
//! caption documents.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

use super::{FetchError, Snippet, TranscriptLanguageInfo};

static API_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""INNERTUBE_API_KEY":\s*"([a-zA-Z0-9_-]+)""#).expect("valid api key regex")
});

static CONSENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"name="v" value="(.*?)""#).expect("valid consent regex"));

static TEXT_ELEMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<text\b([^>]*)>(.*?)</text>").expect("valid text regex"));

static ATTRIBUTE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"([\w-]+)="([^"]*)""#).expect("valid attribute regex"));

/// A caption track advertised in the player response
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionTrack {
    pub language: String,
    pub language_code: String,
    pub is_generated: bool,
    pub is_translatable: bool,
    pub base_url: String,
}

impl CaptionTrack {
    pub fn info(&self) -> TranscriptLanguageInfo {
        TranscriptLanguageInfo {
            language: self.language.clone(),
            language_code: self.language_code.clone(),
            is_generated: self.is_generated,
            is_translatable: self.is_translatable,
        }
    }

    /// Tracks protected by a proof-of-origin token cannot be downloaded
    pub fn requires_po_token(&self) -> bool {
        self.base_url.contains("&exp=xpe")
    }
}

/// Whether the watch page is the cookie consent interstitial
pub fn is_consent_page(html: &str) -> bool {
    html.contains("action=\"https://consent.youtube.com/s\"")
}

/// Value for the `CONSENT` cookie taken from the consent form
pub fn consent_cookie(html: &str) -> Option<String> {
    CONSENT_RE
        .captures(html)
        .and_then(|captures| captures.get(1))
        .map(|value| format!("CONSENT=YES+{}", value.as_str()))
}

/// Extract the InnerTube API key embedded in the watch page
pub fn extract_api_key(html: &str) -> Result<String, FetchError> {
    if html.contains("class=\"g-recaptcha\"") {
        return Err(FetchError::RequestBlocked);
    }

    API_KEY_RE
        .captures(html)
        .and_then(|captures| captures.get(1))
        .map(|key| key.as_str().to_string())
        .ok_or_else(|| FetchError::Upstream("unable to parse YouTube page data".to_string()))
}

/// Map a non-OK `playabilityStatus` onto the failure taxonomy
pub fn check_playability(player: &Value) -> Result<(), FetchError> {
    let Some(playability) = player.get("playabilityStatus") else {
        return Ok(());
    };

    let status = playability
        .get("status")
        .and_then(Value::as_str)
        .unwrap_or("");
    if status == "OK" {
        return Ok(());
    }

    let reason = playability
        .get("reason")
        .and_then(Value::as_str)
        .unwrap_or("");

    match status {
        "LOGIN_REQUIRED" if reason.contains("not a bot") => Err(FetchError::RequestBlocked),
        "LOGIN_REQUIRED" if reason.contains("inappropriate for some users") => Err(
            FetchError::Upstream("video is age restricted".to_string()),
        ),
        "ERROR" if reason.contains("unavailable") => Err(FetchError::VideoUnavailable),
        _ => Err(FetchError::Upstream(format!(
            "video is unplayable: {}",
            if reason.is_empty() { status } else { reason }
        ))),
    }
}

/// Collect the caption tracks from a player response.
///
/// Manually created tracks come first, followed by generated ones, each group
/// in the order YouTube lists them.
pub fn parse_caption_tracks(player: &Value) -> Result<Vec<CaptionTrack>, FetchError> {
    check_playability(player)?;

    let tracks = player
        .pointer("/captions/playerCaptionsTracklistRenderer/captionTracks")
        .and_then(Value::as_array)
        .ok_or(FetchError::TranscriptsDisabled)?;

    let (manual, generated): (Vec<CaptionTrack>, Vec<CaptionTrack>) = tracks
        .iter()
        .filter_map(parse_track)
        .partition(|track| !track.is_generated);

    if manual.is_empty() && generated.is_empty() {
        return Err(FetchError::TranscriptsDisabled);
    }

    Ok(manual.into_iter().chain(generated).collect())
}

fn parse_track(track: &Value) -> Option<CaptionTrack> {
    let language_code = track.get("languageCode")?.as_str()?.to_string();
    let base_url = track.get("baseUrl")?.as_str()?.replace("&fmt=srv3", "");

    let language = track
        .pointer("/name/runs/0/text")
        .or_else(|| track.pointer("/name/simpleText"))
        .and_then(Value::as_str)
        .unwrap_or(&language_code)
        .to_string();

    Some(CaptionTrack {
        language,
        language_code,
        is_generated: track.get("kind").and_then(Value::as_str) == Some("asr"),
        is_translatable: track
            .get("isTranslatable")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        base_url,
    })
}

/// Pick the first track matching the preferred languages, manual before generated
pub fn select_track<'a>(
    tracks: &'a [CaptionTrack],
    languages: &[String],
) -> Option<&'a CaptionTrack> {
    languages.iter().find_map(|code| {
        tracks
            .iter()
            .filter(|track| &track.language_code == code)
            .min_by_key(|track| track.is_generated)
    })
}

/// Parse a timed-text XML document into snippets, preserving document order
pub fn parse_timedtext(xml: &str) -> Vec<Snippet> {
    TEXT_ELEMENT_RE
        .captures_iter(xml)
        .filter_map(|captures| {
            let attributes = captures.get(1).map_or("", |m| m.as_str());
            let raw_text = captures.get(2).map_or("", |m| m.as_str());
            if raw_text.is_empty() {
                return None;
            }

            Some(Snippet {
                text: decode_caption_text(raw_text),
                start: attribute(attributes, "start").unwrap_or(0.0),
                duration: attribute(attributes, "dur").unwrap_or(0.0),
            })
        })
        .collect()
}

fn attribute(attributes: &str, name: &str) -> Option<f64> {
    ATTRIBUTE_RE
        .captures_iter(attributes)
        .find(|captures| &captures[1] == name)
        .and_then(|captures| captures[2].parse().ok())
}

/// Caption text is XML-escaped HTML; unescape both layers and drop markup.
/// Line breaks inside a caption are kept.
fn decode_caption_text(raw: &str) -> String {
    let unescaped = decode_lines(raw);
    decode_lines(&unescaped).trim().to_string()
}

fn decode_lines(text: &str) -> String {
    text.split('\n')
        .map(|line| nanohtml2text::html2text(line).trim().to_string())
        .collect::<Vec<_>>()
        .join("\n")
}
