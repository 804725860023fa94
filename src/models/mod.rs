//! Model-call boundary for tubelens.
//!
//! The four expensive models (embedding, generation, speech-to-text,
//! sentiment) are process-wide resources: they are constructed exactly once
//! per process and shared by `Arc` thereafter. Components receive them as
//! injected capabilities rather than ambient globals, so tests can substitute
//! lightweight fakes.

mod embedding;
mod generation;
mod sentiment;
mod whisper;

pub use embedding::OpenAiEmbedder;
pub use generation::OpenAiGenerator;
pub use sentiment::OpenAiSentimentModel;
pub use whisper::WhisperTranscriber;

use crate::config::Settings;
use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

/// Trait for embedding generation.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate an embedding for a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for multiple texts, one vector per input in order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Get the embedding dimensions.
    fn dimensions(&self) -> usize;
}

/// Trait for bounded-length text generation.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generate text for a prompt, capped at `max_output_tokens`.
    async fn generate(&self, prompt: &str, max_output_tokens: u32) -> Result<String>;
}

/// Trait for speech-to-text transcription.
#[async_trait]
pub trait SpeechToText: Send + Sync {
    /// Transcribe an audio file into plain text.
    async fn transcribe(&self, audio_path: &Path) -> Result<String>;
}

/// Trait for sentiment classification.
#[async_trait]
pub trait SentimentModel: Send + Sync {
    /// Classify text, returning the top label and its confidence score.
    async fn classify(&self, text: &str) -> Result<(String, f32)>;
}

/// The shared, load-once model resources for one process.
#[derive(Clone)]
pub struct ModelSet {
    pub embedder: Arc<dyn Embedder>,
    pub generator: Arc<dyn Generator>,
    pub speech_to_text: Arc<dyn SpeechToText>,
    pub sentiment: Arc<dyn SentimentModel>,
}

impl ModelSet {
    /// Build the OpenAI-backed model set from settings.
    pub fn openai(settings: &Settings) -> Self {
        Self {
            embedder: Arc::new(OpenAiEmbedder::with_config(
                &settings.embedding.model,
                settings.embedding.dimensions as usize,
            )),
            generator: Arc::new(OpenAiGenerator::new(&settings.generation.model)),
            speech_to_text: Arc::new(WhisperTranscriber::new(
                &settings.acquisition.whisper_model,
                &settings.acquisition.language,
            )),
            sentiment: Arc::new(OpenAiSentimentModel::new(&settings.sentiment.model)),
        }
    }

    /// Assemble a model set from individual components (used by tests).
    pub fn from_parts(
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
        speech_to_text: Arc<dyn SpeechToText>,
        sentiment: Arc<dyn SentimentModel>,
    ) -> Self {
        Self {
            embedder,
            generator,
            speech_to_text,
            sentiment,
        }
    }
}
