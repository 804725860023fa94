//! YouTube video source: metadata via yt-dlp, captions via the track URLs
//! yt-dlp reports.

use super::{download_audio, CaptionFailure, VideoMetadata, VideoSource};
use crate::error::{Result, TubelensError};
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// YouTube-backed [`VideoSource`].
pub struct YoutubeSource {
    video_id_regex: Regex,
    http_client: reqwest::Client,
}

impl YoutubeSource {
    pub fn new() -> Self {
        // Matches various YouTube URL formats and bare video IDs
        let video_id_regex = Regex::new(
            r"(?x)
            (?:
                # Full YouTube URLs
                (?:https?://)?
                (?:www\.)?
                (?:youtube\.com/watch\?v=|youtu\.be/|youtube\.com/embed/|youtube\.com/v/)
                ([a-zA-Z0-9_-]{11})
            )
            |
            # Bare video ID (11 characters)
            ^([a-zA-Z0-9_-]{11})$
        ",
        )
        .expect("Invalid regex");

        Self {
            video_id_regex,
            http_client: reqwest::Client::new(),
        }
    }

    fn extract_video_id(&self, input: &str) -> Option<String> {
        let caps = self.video_id_regex.captures(input.trim())?;

        // Try group 1 (URL format) then group 2 (bare ID)
        caps.get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str().to_string())
    }

    /// Run `yt-dlp --dump-json` for a video and parse the output.
    async fn dump_json(&self, youtube_id: &str) -> Result<serde_json::Value> {
        let url = watch_url(youtube_id);

        let output = tokio::process::Command::new("yt-dlp")
            .args([
                "--dump-json",
                "--no-download",
                "--no-warnings",
                "--ignore-errors",
                &url,
            ])
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    TubelensError::ToolNotFound("yt-dlp".to_string())
                } else {
                    TubelensError::Acquisition(format!("Failed to run yt-dlp: {}", e))
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TubelensError::VideoNotFound(format!(
                "Video {} not found or unavailable: {}",
                youtube_id, stderr
            )));
        }

        let json_str = String::from_utf8_lossy(&output.stdout);
        serde_json::from_str(&json_str)
            .map_err(|e| TubelensError::Acquisition(format!("Failed to parse yt-dlp output: {}", e)))
    }
}

impl Default for YoutubeSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VideoSource for YoutubeSource {
    fn extract_id(&self, locator: &str) -> Option<String> {
        self.extract_video_id(locator)
    }

    async fn fetch_metadata(&self, youtube_id: &str) -> Result<VideoMetadata> {
        let json = self.dump_json(youtube_id).await?;

        Ok(VideoMetadata {
            youtube_id: youtube_id.to_string(),
            source_url: watch_url(youtube_id),
            title: json["title"].as_str().map(|s| s.to_string()),
            uploader: json["uploader"]
                .as_str()
                .or_else(|| json["channel"].as_str())
                .map(|s| s.to_string()),
            duration_seconds: json["duration"].as_f64().map(|d| d as u64),
            view_count: json["view_count"].as_u64(),
            like_count: json["like_count"].as_u64(),
            description: json["description"].as_str().map(|s| s.to_string()),
        })
    }

    async fn fetch_captions(
        &self,
        youtube_id: &str,
        language: &str,
    ) -> std::result::Result<String, CaptionFailure> {
        let json = self
            .dump_json(youtube_id)
            .await
            .map_err(|e| CaptionFailure::Other(e.to_string()))?;

        let track_url = select_caption_track(&json, language)?;
        debug!("Fetching caption track for language '{}'", language);

        let payload = self
            .http_client
            .get(&track_url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| CaptionFailure::Other(e.to_string()))?
            .text()
            .await
            .map_err(|e| CaptionFailure::Other(e.to_string()))?;

        parse_json3_captions(&payload)
    }

    async fn download_audio(&self, youtube_id: &str, output_dir: &Path) -> Result<PathBuf> {
        download_audio(&watch_url(youtube_id), youtube_id, output_dir).await
    }
}

fn watch_url(youtube_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", youtube_id)
}

/// Pick a json3 caption track URL for the requested language.
///
/// Manually uploaded subtitles take precedence over automatic captions.
/// An empty/missing `subtitles` map together with an empty
/// `automatic_captions` map means captioning is disabled for the video.
fn select_caption_track(
    info: &serde_json::Value,
    language: &str,
) -> std::result::Result<String, CaptionFailure> {
    let subtitles = info["subtitles"].as_object();
    let automatic = info["automatic_captions"].as_object();

    let has_any = subtitles.map(|m| !m.is_empty()).unwrap_or(false)
        || automatic.map(|m| !m.is_empty()).unwrap_or(false);
    if !has_any {
        return Err(CaptionFailure::Disabled);
    }

    let track = subtitles
        .and_then(|m| m.get(language))
        .or_else(|| automatic.and_then(|m| m.get(language)))
        .and_then(|t| t.as_array())
        .ok_or_else(|| CaptionFailure::NotFound {
            language: language.to_string(),
        })?;

    track
        .iter()
        .find(|entry| entry["ext"].as_str() == Some("json3"))
        .and_then(|entry| entry["url"].as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| CaptionFailure::Other("no json3 caption format available".to_string()))
}

#[derive(Debug, Deserialize)]
struct Json3Captions {
    events: Option<Vec<Json3Event>>,
}

#[derive(Debug, Deserialize)]
struct Json3Event {
    segs: Option<Vec<Json3Seg>>,
}

#[derive(Debug, Deserialize)]
struct Json3Seg {
    utf8: Option<String>,
}

/// Flatten a json3 caption payload into plain text: one entry per caption
/// event, empty entries dropped, original order preserved, joined with
/// single spaces.
fn parse_json3_captions(payload: &str) -> std::result::Result<String, CaptionFailure> {
    let captions: Json3Captions = serde_json::from_str(payload)
        .map_err(|e| CaptionFailure::Other(format!("unparseable caption payload: {}", e)))?;

    let texts: Vec<String> = captions
        .events
        .unwrap_or_default()
        .into_iter()
        .filter_map(|event| {
            let text: String = event
                .segs?
                .into_iter()
                .filter_map(|seg| seg.utf8)
                .collect();
            let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
            (!normalized.is_empty()).then_some(normalized)
        })
        .collect();

    Ok(texts.join(" "))
}
