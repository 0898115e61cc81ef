use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use eyre::{Result, bail};
use log::{debug, info, warn};
use regex::Regex;
use serde::Deserialize;

use crate::{Segment, Transcript};

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

#[derive(Debug, Deserialize)]
struct InnerTubePlayerResponse {
    captions: Option<CaptionsData>,
}

#[derive(Debug, Deserialize)]
struct CaptionsData {
    #[serde(rename = "playerCaptionsTracklistRenderer")]
    player_captions_tracklist_renderer: Option<CaptionTracklistRenderer>,
}

#[derive(Debug, Deserialize)]
struct CaptionTracklistRenderer {
    #[serde(rename = "captionTracks")]
    caption_tracks: Option<Vec<CaptionTrack>>,
}

#[derive(Debug, Deserialize)]
struct CaptionTrack {
    #[serde(rename = "baseUrl")]
    base_url: String,
    #[serde(rename = "languageCode")]
    language_code: String,
}

/// Anything that can list and download caption tracks for a video.
///
/// `languages = Some(..)` only accepts a track in one of those languages;
/// `None` accepts whatever track the video has first.
#[async_trait]
pub trait CaptionSource: Send + Sync {
    async fn fetch(&self, video_id: &str, languages: Option<&[String]>) -> Result<Transcript>;
}

/// Captions from YouTube's InnerTube player API
pub struct InnerTube {
    client: reqwest::Client,
    timeout: Duration,
}

impl InnerTube {
    pub fn new(client: reqwest::Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    async fn get_text(&self, url: &str) -> Result<String> {
        let text = self
            .client
            .get(url)
            .header("User-Agent", USER_AGENT)
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(text)
    }
}

#[async_trait]
impl CaptionSource for InnerTube {
    async fn fetch(&self, video_id: &str, languages: Option<&[String]>) -> Result<Transcript> {
        // Step 1: Fetch the watch page to get the InnerTube API key
        let watch_url = format!("https://www.youtube.com/watch?v={video_id}");
        debug!("Fetching watch page: {watch_url}");
        let page_html = self.get_text(&watch_url).await?;

        let api_key = extract_api_key(&page_html)?;
        debug!("Extracted InnerTube API key: {api_key}");

        // Step 2: Call InnerTube player endpoint
        let player_url = format!("https://www.youtube.com/youtubei/v1/player?key={api_key}&prettyPrint=false");
        let hl = languages.and_then(|l| l.first()).map(String::as_str).unwrap_or("en");

        let body = serde_json::json!({
            "context": {
                "client": {
                    "hl": hl,
                    "gl": "US",
                    "clientName": "WEB",
                    "clientVersion": "2.20241126.01.00"
                }
            },
            "videoId": video_id
        });

        let resp: InnerTubePlayerResponse = self
            .client
            .post(&player_url)
            .header("User-Agent", USER_AGENT)
            .header("Content-Type", "application/json")
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let tracks = resp
            .captions
            .and_then(|c| c.player_captions_tracklist_renderer)
            .and_then(|r| r.caption_tracks)
            .unwrap_or_default();

        let Some(track) = select_track(&tracks, languages) else {
            match languages {
                Some(langs) => bail!("no captions in {langs:?} for video {video_id}"),
                None => bail!("no captions available for video {video_id}"),
            }
        };
        debug!("Using caption track: lang={}", track.language_code);

        // Step 3: Fetch the caption XML
        let caption_xml = self.get_text(&track.base_url).await?;
        let segments = parse_caption_xml(&caption_xml)?;

        Ok(Transcript {
            video_id: video_id.to_string(),
            language: track.language_code.clone(),
            segments,
        })
    }
}

fn select_track<'a>(tracks: &'a [CaptionTrack], languages: Option<&[String]>) -> Option<&'a CaptionTrack> {
    match languages {
        Some(langs) => langs
            .iter()
            .find_map(|lang| tracks.iter().find(|t| &t.language_code == lang)),
        None => tracks.first(),
    }
}

fn extract_api_key(html: &str) -> Result<String> {
    let re = Regex::new(r#""INNERTUBE_API_KEY"\s*:\s*"([^"]+)""#)?;
    if let Some(caps) = re.captures(html) {
        return Ok(caps[1].to_string());
    }

    // Fallback: try the newer pattern
    let re2 = Regex::new(r#"innertubeApiKey\s*[=:]\s*"([^"]+)""#)?;
    if let Some(caps) = re2.captures(html) {
        return Ok(caps[1].to_string());
    }

    bail!("could not extract InnerTube API key from watch page");
}

fn parse_caption_xml(xml: &str) -> Result<Vec<Segment>> {
    use quick_xml::Reader;
    use quick_xml::events::Event;

    let mut reader = Reader::from_str(xml);
    let mut segments = Vec::new();
    let mut current_start: Option<f64> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"text" => {
                current_start = e
                    .attributes()
                    .flatten()
                    .find(|attr| attr.key.as_ref() == b"start")
                    .and_then(|attr| String::from_utf8_lossy(&attr.value).parse::<f64>().ok());
            }
            Ok(Event::Text(ref e)) => {
                if let Some(start) = current_start.take() {
                    let raw_text = e.unescape().unwrap_or_default().to_string();
                    let text = html_escape::decode_html_entities(&raw_text).to_string();
                    if !text.trim().is_empty() {
                        segments.push(Segment { text, start });
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => bail!("error parsing caption XML: {e}"),
            _ => {}
        }
    }

    Ok(segments)
}

/// Why a transcript could not be produced
#[derive(Debug, thiserror::Error)]
#[error("transcript unavailable for {video_id}: preferred: {preferred}; any: {fallback}")]
pub struct TranscriptError {
    pub video_id: String,
    pub preferred: String,
    pub fallback: String,
}

/// Fetches a flattened transcript, preferring the configured languages
#[derive(Clone)]
pub struct TranscriptFetcher {
    source: Arc<dyn CaptionSource>,
    preferred: Vec<String>,
}

impl TranscriptFetcher {
    pub fn new(source: Arc<dyn CaptionSource>, preferred: Vec<String>) -> Self {
        Self { source, preferred }
    }

    /// Try the preferred languages, then any track at all.
    /// Returns the space-joined caption text.
    pub async fn fetch(&self, video_id: &str) -> Result<String, TranscriptError> {
        let transcript = match self.source.fetch(video_id, Some(self.preferred.as_slice())).await {
            Ok(t) => t,
            Err(preferred) => {
                debug!("Preferred captions {:?} unavailable: {preferred}", self.preferred);
                match self.source.fetch(video_id, None).await {
                    Ok(t) => {
                        info!("Using fallback caption track '{}' for {video_id}", t.language);
                        t
                    }
                    Err(fallback) => {
                        warn!("No captions for {video_id}: {fallback}");
                        return Err(TranscriptError {
                            video_id: video_id.to_string(),
                            preferred: preferred.to_string(),
                            fallback: fallback.to_string(),
                        });
                    }
                }
            }
        };

        Ok(transcript.text())
    }
}
