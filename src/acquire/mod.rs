//! Transcript acquisition with a speech-to-text fallback.
//!
//! Acquisition is an explicit state machine:
//!
//! ```text
//! PRIMARY_FETCH --success--> DONE (captions)
//! PRIMARY_FETCH --any failure--> FALLBACK_DOWNLOAD -> FALLBACK_TRANSCRIBE -> DONE
//! fallback failure --> transcript unavailable (metadata still returned)
//! ```
//!
//! The fallback is attempted on *any* primary-path failure, not only the
//! anticipated "captions disabled" case. That broad-catch policy maximizes
//! acquisition success at the cost of occasionally treating a transient
//! caption-fetch error as "no captions"; the typed [`CaptionFailure`]
//! outcomes keep the causes distinguishable in logs.

mod audio;
mod youtube;

pub use audio::download_audio;
pub use youtube::YoutubeSource;

use crate::error::{Result, TubelensError};
use crate::models::SpeechToText;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Metadata about a source video, fetched independently of its transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoMetadata {
    /// 11-character YouTube video ID.
    pub youtube_id: String,
    /// Canonical watch URL.
    pub source_url: String,
    pub title: Option<String>,
    pub uploader: Option<String>,
    pub duration_seconds: Option<u64>,
    pub view_count: Option<u64>,
    pub like_count: Option<u64>,
    pub description: Option<String>,
}

/// Why the primary caption fetch did not yield a transcript.
#[derive(Debug, Clone)]
pub enum CaptionFailure {
    /// Captions are disabled for the video.
    Disabled,
    /// No caption track exists in the requested language.
    NotFound { language: String },
    /// Anything else: network errors, unparseable caption payloads.
    Other(String),
}

impl std::fmt::Display for CaptionFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaptionFailure::Disabled => write!(f, "captions disabled"),
            CaptionFailure::NotFound { language } => {
                write!(f, "no caption track for language '{}'", language)
            }
            CaptionFailure::Other(msg) => write!(f, "caption fetch failed: {}", msg),
        }
    }
}

/// Which path produced the transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptOrigin {
    /// First-party captions.
    Captions,
    /// Downloaded audio transcribed locally.
    SpeechToText,
    /// Both paths failed; `transcript_text` is empty.
    Unavailable { reason: String },
}

/// The result of one acquisition run. Metadata is present whenever the
/// metadata fetch succeeded, even if both transcript paths failed: callers
/// must check `transcript_text` (or `origin`) separately.
#[derive(Debug, Clone)]
pub struct AcquiredVideo {
    pub metadata: VideoMetadata,
    pub transcript_text: String,
    pub origin: TranscriptOrigin,
}

/// A source of video metadata, captions, and audio.
#[async_trait]
pub trait VideoSource: Send + Sync {
    /// Extract the video ID from a locator (URL or bare ID).
    fn extract_id(&self, locator: &str) -> Option<String>;

    /// Fetch video metadata.
    async fn fetch_metadata(&self, youtube_id: &str) -> Result<VideoMetadata>;

    /// Fetch first-party captions in the given language, concatenated into
    /// plain text.
    async fn fetch_captions(
        &self,
        youtube_id: &str,
        language: &str,
    ) -> std::result::Result<String, CaptionFailure>;

    /// Download the best available audio track into `output_dir`.
    async fn download_audio(&self, youtube_id: &str, output_dir: &Path) -> Result<PathBuf>;
}

/// Obtains metadata and transcript text for a video locator.
pub struct TranscriptAcquirer {
    source: Arc<dyn VideoSource>,
    speech_to_text: Arc<dyn SpeechToText>,
    language: String,
    temp_dir: PathBuf,
}

impl TranscriptAcquirer {
    pub fn new(
        source: Arc<dyn VideoSource>,
        speech_to_text: Arc<dyn SpeechToText>,
        language: &str,
        temp_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source,
            speech_to_text,
            language: language.to_string(),
            temp_dir: temp_dir.into(),
        }
    }

    /// Run the acquisition state machine for a locator.
    ///
    /// Fails with `InvalidLocator` for unparseable locators and propagates a
    /// metadata-fetch failure; transcript failures are folded into
    /// [`TranscriptOrigin::Unavailable`] instead so metadata survives.
    #[instrument(skip(self), fields(locator = %locator))]
    pub async fn acquire(&self, locator: &str) -> Result<AcquiredVideo> {
        let youtube_id = self
            .source
            .extract_id(locator)
            .ok_or_else(|| TubelensError::InvalidLocator(locator.to_string()))?;

        info!("Fetching metadata for {}", youtube_id);
        let metadata = self.source.fetch_metadata(&youtube_id).await?;

        match self.source.fetch_captions(&youtube_id, &self.language).await {
            Ok(text) => {
                info!("Transcript fetched from captions ({} chars)", text.len());
                Ok(AcquiredVideo {
                    metadata,
                    transcript_text: text,
                    origin: TranscriptOrigin::Captions,
                })
            }
            Err(failure) => {
                match &failure {
                    CaptionFailure::Disabled | CaptionFailure::NotFound { .. } => {
                        info!("{}, using speech-to-text fallback", failure)
                    }
                    CaptionFailure::Other(_) => {
                        warn!("{}, using speech-to-text fallback", failure)
                    }
                }
                self.fallback(metadata, &youtube_id, failure).await
            }
        }
    }

    /// FALLBACK_DOWNLOAD then FALLBACK_TRANSCRIBE. A failure in either step
    /// yields `Unavailable` carrying both causes.
    async fn fallback(
        &self,
        metadata: VideoMetadata,
        youtube_id: &str,
        primary_failure: CaptionFailure,
    ) -> Result<AcquiredVideo> {
        let outcome = self.download_and_transcribe(youtube_id).await;

        match outcome {
            Ok(text) => {
                info!("Transcript produced by speech-to-text ({} chars)", text.len());
                Ok(AcquiredVideo {
                    metadata,
                    transcript_text: text,
                    origin: TranscriptOrigin::SpeechToText,
                })
            }
            Err(e) => {
                warn!("Speech-to-text fallback failed: {}", e);
                Ok(AcquiredVideo {
                    metadata,
                    transcript_text: String::new(),
                    origin: TranscriptOrigin::Unavailable {
                        reason: format!("{}; fallback failed: {}", primary_failure, e),
                    },
                })
            }
        }
    }

    async fn download_and_transcribe(&self, youtube_id: &str) -> Result<String> {
        let audio_path = self
            .source
            .download_audio(youtube_id, &self.temp_dir)
            .await?;

        let result = self.speech_to_text.transcribe(&audio_path).await;

        if let Err(e) = std::fs::remove_file(&audio_path) {
            warn!("Failed to clean up audio file: {}", e);
        }

        result.map(|text| text.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct FakeSource {
        caption_outcome: std::result::Result<String, CaptionFailure>,
        download_fails: bool,
        downloaded: AtomicBool,
    }

    impl FakeSource {
        fn new(caption_outcome: std::result::Result<String, CaptionFailure>) -> Self {
            Self {
                caption_outcome,
                download_fails: false,
                downloaded: AtomicBool::new(false),
            }
        }
    }

    #[async_trait]
    impl VideoSource for FakeSource {
        fn extract_id(&self, locator: &str) -> Option<String> {
            (locator.len() == 11).then(|| locator.to_string())
        }

        async fn fetch_metadata(&self, youtube_id: &str) -> Result<VideoMetadata> {
            Ok(VideoMetadata {
                youtube_id: youtube_id.to_string(),
                source_url: format!("https://www.youtube.com/watch?v={}", youtube_id),
                title: Some("A Video".to_string()),
                uploader: Some("someone".to_string()),
                duration_seconds: Some(60),
                view_count: Some(1000),
                like_count: Some(10),
                description: None,
            })
        }

        async fn fetch_captions(
            &self,
            _youtube_id: &str,
            _language: &str,
        ) -> std::result::Result<String, CaptionFailure> {
            self.caption_outcome.clone()
        }

        async fn download_audio(&self, youtube_id: &str, output_dir: &Path) -> Result<PathBuf> {
            if self.download_fails {
                return Err(TubelensError::AudioDownload("boom".to_string()));
            }
            self.downloaded.store(true, Ordering::SeqCst);
            let path = output_dir.join(format!("{}.mp3", youtube_id));
            std::fs::write(&path, b"audio")?;
            Ok(path)
        }
    }

    struct FakeStt;

    #[async_trait]
    impl SpeechToText for FakeStt {
        async fn transcribe(&self, _audio_path: &Path) -> Result<String> {
            Ok("  whisper transcript  ".to_string())
        }
    }

    fn acquirer(source: FakeSource, dir: &Path) -> (TranscriptAcquirer, Arc<FakeSource>) {
        let source = Arc::new(source);
        (
            TranscriptAcquirer::new(source.clone(), Arc::new(FakeStt), "en", dir),
            source,
        )
    }

    #[tokio::test]
    async fn test_captions_path_skips_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let (acquirer, source) =
            acquirer(FakeSource::new(Ok("caption text".to_string())), dir.path());

        let acquired = acquirer.acquire("abcdefghijk").await.unwrap();
        assert_eq!(acquired.transcript_text, "caption text");
        assert_eq!(acquired.origin, TranscriptOrigin::Captions);
        assert!(!source.downloaded.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_disabled_captions_invoke_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let (acquirer, source) =
            acquirer(FakeSource::new(Err(CaptionFailure::Disabled)), dir.path());

        let acquired = acquirer.acquire("abcdefghijk").await.unwrap();
        assert_eq!(acquired.transcript_text, "whisper transcript");
        assert_eq!(acquired.origin, TranscriptOrigin::SpeechToText);
        assert!(source.downloaded.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_any_caption_error_invokes_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let (acquirer, _) = acquirer(
            FakeSource::new(Err(CaptionFailure::Other("connection reset".to_string()))),
            dir.path(),
        );

        let acquired = acquirer.acquire("abcdefghijk").await.unwrap();
        assert_eq!(acquired.origin, TranscriptOrigin::SpeechToText);
    }

    #[tokio::test]
    async fn test_fallback_failure_preserves_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = FakeSource::new(Err(CaptionFailure::Disabled));
        source.download_fails = true;
        let (acquirer, _) = acquirer(source, dir.path());

        let acquired = acquirer.acquire("abcdefghijk").await.unwrap();
        assert_eq!(acquired.metadata.title.as_deref(), Some("A Video"));
        assert!(acquired.transcript_text.is_empty());
        assert!(matches!(
            acquired.origin,
            TranscriptOrigin::Unavailable { .. }
        ));
    }

    #[tokio::test]
    async fn test_invalid_locator_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let (acquirer, _) = acquirer(FakeSource::new(Ok(String::new())), dir.path());

        assert!(matches!(
            acquirer.acquire("bad").await,
            Err(TubelensError::InvalidLocator(_))
        ));
    }

    #[tokio::test]
    async fn test_fallback_audio_file_cleaned_up() {
        let dir = tempfile::tempdir().unwrap();
        let (acquirer, _) =
            acquirer(FakeSource::new(Err(CaptionFailure::Disabled)), dir.path());

        acquirer.acquire("abcdefghijk").await.unwrap();
        assert!(!dir.path().join("abcdefghijk.mp3").exists());
    }
}
