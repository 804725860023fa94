//! Pipeline orchestrator for tubelens.
//!
//! Coordinates the build phase (acquire -> analyze -> persist -> segment ->
//! index) and the query phase (retrieve -> compose answer). Persistence is
//! all-or-nothing in stage order: the video record is saved only after both
//! analyses succeed, chunk metadata after the record, and the vector index
//! last, so a failed stage never leaves later-stage state behind.

use crate::acquire::{TranscriptAcquirer, TranscriptOrigin, VideoSource, YoutubeSource};
use crate::analysis::{Sentiment, SentimentClassifier, Summarizer};
use crate::config::{Prompts, Settings};
use crate::error::{Result, TubelensError};
use crate::index::{EmbeddingIndexer, IndexStore};
use crate::models::ModelSet;
use crate::rag::{Answer, AnswerComposer};
use crate::record::{ChunkRecord, RecordStore, SqliteRecordStore, VideoRecord, VideoSummary};
use crate::segment::{segment_transcript, Segment};
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// A transcript shorter than this (after trimming) is considered unusable.
const MIN_TRANSCRIPT_CHARS: usize = 5;

/// The main orchestrator. Holds the process-wide model resources; construct
/// one per process and share it across requests.
pub struct Pipeline {
    settings: Settings,
    acquirer: TranscriptAcquirer,
    summarizer: Summarizer,
    sentiment: SentimentClassifier,
    indexer: EmbeddingIndexer,
    composer: AnswerComposer,
    records: Arc<dyn RecordStore>,
}

impl Pipeline {
    /// Create a pipeline with OpenAI-backed models and the SQLite record
    /// store from settings.
    pub fn new(settings: Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings
                .prompts
                .custom_path
                .as_deref()
                .map(std::path::Path::new),
        )?;
        let models = ModelSet::openai(&settings);
        let source: Arc<dyn VideoSource> = Arc::new(YoutubeSource::new());
        let records: Arc<dyn RecordStore> =
            Arc::new(SqliteRecordStore::new(&settings.sqlite_path())?);

        Self::with_components(settings, prompts, models, source, records)
    }

    /// Create a pipeline with injected components (used by tests to
    /// substitute fakes for the model resources).
    pub fn with_components(
        settings: Settings,
        prompts: Prompts,
        models: ModelSet,
        source: Arc<dyn VideoSource>,
        records: Arc<dyn RecordStore>,
    ) -> Result<Self> {
        let temp_dir = settings.temp_dir();
        std::fs::create_dir_all(&temp_dir)?;

        let index_store = Arc::new(IndexStore::new(settings.index_dir())?);

        let acquirer = TranscriptAcquirer::new(
            source,
            models.speech_to_text.clone(),
            &settings.acquisition.language,
            temp_dir,
        );
        let summarizer = Summarizer::new(
            models.generator.clone(),
            prompts.clone(),
            settings.summarization.window_chars,
            settings.summarization.min_summary_words,
            settings.summarization.max_summary_tokens,
        );
        let sentiment = SentimentClassifier::new(
            models.sentiment.clone(),
            settings.sentiment.prefix_chars,
        );
        let indexer = EmbeddingIndexer::new(models.embedder.clone(), index_store.clone());
        let composer = AnswerComposer::new(
            models.embedder,
            models.generator,
            index_store,
            prompts,
            settings.generation.max_output_tokens,
        );

        Ok(Self {
            settings,
            acquirer,
            summarizer,
            sentiment,
            indexer,
            composer,
            records,
        })
    }

    /// Run the full build phase for one video locator.
    #[instrument(skip(self), fields(locator = %locator))]
    pub async fn process_video(&self, locator: &str) -> Result<ProcessOutcome> {
        let acquired = self.acquirer.acquire(locator).await?;

        if let TranscriptOrigin::Unavailable { reason } = &acquired.origin {
            return Err(TubelensError::Acquisition(reason.clone()));
        }

        let transcript = acquired.transcript_text.trim().to_string();
        if transcript.chars().count() < MIN_TRANSCRIPT_CHARS {
            return Err(TubelensError::EmptyTranscript(
                acquired.metadata.youtube_id.clone(),
            ));
        }

        // Summary and sentiment depend only on the transcript text and may
        // run concurrently.
        info!("Analyzing transcript ({} chars)", transcript.len());
        let (summary, sentiment) = futures::try_join!(
            self.summarizer.summarize(&transcript),
            self.sentiment.classify(&transcript),
        )?;

        let video_id = Uuid::new_v4().to_string();
        let record = VideoRecord {
            video_id: video_id.clone(),
            youtube_id: acquired.metadata.youtube_id.clone(),
            source_url: acquired.metadata.source_url.clone(),
            title: acquired.metadata.title.clone(),
            uploader: acquired.metadata.uploader.clone(),
            duration_seconds: acquired.metadata.duration_seconds,
            view_count: acquired.metadata.view_count,
            like_count: acquired.metadata.like_count,
            description: acquired.metadata.description.clone(),
            transcript_text: transcript.clone(),
            summary: summary.clone(),
            sentiment: sentiment.clone(),
            created_at: Utc::now(),
        };

        info!("Saving video record {}", video_id);
        self.records.put(&record).await?;

        let segments = segment_transcript(
            &transcript,
            self.settings.segmentation.window_words,
            self.settings.segmentation.overlap_words,
        )?;

        info!("Storing {} segment records", segments.len());
        for segment in &segments {
            self.records
                .put_chunk(&video_id, &chunk_record(segment))
                .await?;
        }

        let indexed = self.indexer.build(&video_id, &segments).await?;
        info!("Indexed {} segments for {}", indexed, video_id);

        Ok(ProcessOutcome {
            video_id,
            youtube_id: record.youtube_id,
            title: record.title,
            chunks_indexed: indexed,
            summary,
            sentiment,
        })
    }

    /// Answer a question about a previously processed video.
    ///
    /// `top_k` falls back to the configured default when `None`.
    #[instrument(skip(self), fields(video_id = %video_id))]
    pub async fn answer(
        &self,
        video_id: &str,
        question: &str,
        top_k: Option<usize>,
    ) -> Result<Answer> {
        if self.records.get(video_id).await?.is_none() {
            return Err(TubelensError::VideoNotFound(video_id.to_string()));
        }

        let top_k = top_k.unwrap_or(self.settings.generation.default_top_k);
        self.composer.answer(video_id, question, top_k).await
    }

    /// List all stored videos.
    pub async fn list_videos(&self) -> Result<Vec<VideoSummary>> {
        self.records.list().await
    }

    /// Fetch one stored video record.
    pub async fn get_video(&self, video_id: &str) -> Result<Option<VideoRecord>> {
        self.records.get(video_id).await
    }

    /// Number of stored chunks for a video.
    pub async fn chunk_count(&self, video_id: &str) -> Result<usize> {
        self.records.chunk_count(video_id).await
    }
}

fn chunk_record(segment: &Segment) -> ChunkRecord {
    ChunkRecord {
        chunk_id: segment.id,
        chunk_index: segment.index,
        text: segment.text.clone(),
    }
}

/// Result of processing one video.
#[derive(Debug, Clone)]
pub struct ProcessOutcome {
    pub video_id: String,
    pub youtube_id: String,
    pub title: Option<String>,
    pub chunks_indexed: usize,
    pub summary: String,
    pub sentiment: Sentiment,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquire::{CaptionFailure, VideoMetadata};
    use crate::models::{Embedder, Generator, SentimentModel, SpeechToText};
    use async_trait::async_trait;
    use std::path::{Path, PathBuf};

    struct FakeSource {
        caption_outcome: std::result::Result<String, CaptionFailure>,
    }

    #[async_trait]
    impl crate::acquire::VideoSource for FakeSource {
        fn extract_id(&self, locator: &str) -> Option<String> {
            (locator.len() == 11).then(|| locator.to_string())
        }

        async fn fetch_metadata(&self, youtube_id: &str) -> crate::error::Result<VideoMetadata> {
            Ok(VideoMetadata {
                youtube_id: youtube_id.to_string(),
                source_url: format!("https://www.youtube.com/watch?v={}", youtube_id),
                title: Some("Animals Explained".to_string()),
                uploader: Some("someone".to_string()),
                duration_seconds: Some(300),
                view_count: Some(5000),
                like_count: Some(100),
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

        async fn download_audio(
            &self,
            _youtube_id: &str,
            _output_dir: &Path,
        ) -> crate::error::Result<PathBuf> {
            Err(TubelensError::AudioDownload("no network in tests".into()))
        }
    }

    struct KeywordEmbedder;

    fn keyword_vector(text: &str) -> Vec<f32> {
        let lower = text.to_lowercase();
        vec![
            if lower.contains("cats") { 1.0 } else { 0.0 },
            if lower.contains("dogs") { 1.0 } else { 0.0 },
            if lower.contains("are") { 1.0 } else { 0.0 },
            1.0,
        ]
    }

    #[async_trait]
    impl Embedder for KeywordEmbedder {
        async fn embed(&self, text: &str) -> crate::error::Result<Vec<f32>> {
            Ok(keyword_vector(text))
        }

        async fn embed_batch(&self, texts: &[String]) -> crate::error::Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|t| keyword_vector(t)).collect())
        }

        fn dimensions(&self) -> usize {
            4
        }
    }

    struct CannedGenerator;

    #[async_trait]
    impl Generator for CannedGenerator {
        async fn generate(
            &self,
            _prompt: &str,
            _max_output_tokens: u32,
        ) -> crate::error::Result<String> {
            Ok("canned model output".to_string())
        }
    }

    struct NoStt;

    #[async_trait]
    impl SpeechToText for NoStt {
        async fn transcribe(&self, _audio_path: &Path) -> crate::error::Result<String> {
            Err(TubelensError::Transcription("not available in tests".into()))
        }
    }

    struct PositiveSentiment;

    #[async_trait]
    impl SentimentModel for PositiveSentiment {
        async fn classify(&self, _text: &str) -> crate::error::Result<(String, f32)> {
            Ok(("POSITIVE".to_string(), 0.9))
        }
    }

    fn test_settings(dir: &Path) -> Settings {
        let mut settings = Settings::default();
        settings.general.data_dir = dir.join("data").to_string_lossy().to_string();
        settings.general.temp_dir = dir.join("tmp").to_string_lossy().to_string();
        // Small windows so short test transcripts still produce several
        // segments.
        settings.segmentation.window_words = 5;
        settings.segmentation.overlap_words = 1;
        settings
    }

    fn pipeline_with(
        dir: &Path,
        caption_outcome: std::result::Result<String, CaptionFailure>,
    ) -> Pipeline {
        let models = ModelSet::from_parts(
            Arc::new(KeywordEmbedder),
            Arc::new(CannedGenerator),
            Arc::new(NoStt),
            Arc::new(PositiveSentiment),
        );
        Pipeline::with_components(
            test_settings(dir),
            Prompts::default(),
            models,
            Arc::new(FakeSource { caption_outcome }),
            Arc::new(SqliteRecordStore::in_memory().unwrap()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_process_then_answer_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let transcript =
            "cats are small mammals that purr and dogs are loyal companions that bark loudly";
        let pipeline = pipeline_with(dir.path(), Ok(transcript.to_string()));

        let outcome = pipeline.process_video("abcdefghijk").await.unwrap();
        assert_eq!(outcome.youtube_id, "abcdefghijk");
        assert!(outcome.chunks_indexed > 1);
        assert_eq!(outcome.sentiment.label, "POSITIVE");
        assert!(!outcome.summary.is_empty());

        let record = pipeline.get_video(&outcome.video_id).await.unwrap().unwrap();
        assert_eq!(record.transcript_text, transcript);
        assert_eq!(
            pipeline.chunk_count(&outcome.video_id).await.unwrap(),
            outcome.chunks_indexed
        );

        let answer = pipeline
            .answer(&outcome.video_id, "what are cats", Some(2))
            .await
            .unwrap();
        assert_eq!(answer.text, "canned model output");
        assert_eq!(answer.sources.len(), 2);
    }

    #[tokio::test]
    async fn test_unavailable_transcript_fails_processing() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline_with(dir.path(), Err(CaptionFailure::Disabled));

        // Captions disabled and the audio fallback cannot download, so the
        // pipeline must fail while the acquisition still fetched metadata.
        assert!(matches!(
            pipeline.process_video("abcdefghijk").await,
            Err(TubelensError::Acquisition(_))
        ));
        assert!(pipeline.list_videos().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_too_short_transcript_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline_with(dir.path(), Ok("  hi  ".to_string()));

        assert!(matches!(
            pipeline.process_video("abcdefghijk").await,
            Err(TubelensError::EmptyTranscript(_))
        ));
    }

    #[tokio::test]
    async fn test_answer_unknown_video_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline_with(dir.path(), Ok("irrelevant".to_string()));

        assert!(matches!(
            pipeline.answer("nope", "question", None).await,
            Err(TubelensError::VideoNotFound(_))
        ));
    }
}
