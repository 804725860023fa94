//! Transcript analysis: summarization and sentiment.
//!
//! Both analyses work from the acquired transcript text only and are
//! independent of the vector index, so the pipeline may run them
//! concurrently with each other.

use crate::config::{render, Prompts};
use crate::error::Result;
use crate::models::{Generator, SentimentModel};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};

/// A sentiment label with its confidence score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Sentiment {
    pub label: String,
    pub score: f32,
}

impl Sentiment {
    /// The default returned for empty input, without a model call.
    pub fn neutral() -> Self {
        Self {
            label: "NEUTRAL".to_string(),
            score: 0.0,
        }
    }
}

/// Chunked, flat transcript summarizer.
///
/// The transcript is split into fixed-length character windows (character
/// based, unlike the word-based retrieval segmenter, to bound the model's
/// input budget), each window is summarized independently, and the window
/// summaries are joined with spaces. There is no second reduction pass over
/// the concatenation, so coherence across windows is not guaranteed; that
/// flat behavior is intentional and kept.
pub struct Summarizer {
    generator: Arc<dyn Generator>,
    prompts: Prompts,
    window_chars: usize,
    min_summary_words: u32,
    max_summary_tokens: u32,
}

impl Summarizer {
    pub fn new(
        generator: Arc<dyn Generator>,
        prompts: Prompts,
        window_chars: usize,
        min_summary_words: u32,
        max_summary_tokens: u32,
    ) -> Self {
        Self {
            generator,
            prompts,
            window_chars,
            min_summary_words,
            max_summary_tokens,
        }
    }

    /// Summarize a transcript. Empty or whitespace-only input returns an
    /// empty string without any model call.
    #[instrument(skip(self, text), fields(text_chars = text.len()))]
    pub async fn summarize(&self, text: &str) -> Result<String> {
        if text.trim().is_empty() {
            return Ok(String::new());
        }

        let windows = char_windows(text, self.window_chars);
        debug!("Summarizing {} windows", windows.len());

        let min_words = self.min_summary_words.to_string();
        let max_words = estimated_words(self.max_summary_tokens).to_string();

        let mut parts = Vec::with_capacity(windows.len());
        for window in windows {
            let prompt = render(
                &self.prompts.summary.window,
                &[
                    ("min_words", min_words.as_str()),
                    ("max_words", max_words.as_str()),
                    ("text", window),
                ],
            );
            let summary = self
                .generator
                .generate(&prompt, self.max_summary_tokens)
                .await?;
            parts.push(summary.trim().to_string());
        }

        Ok(parts.join(" "))
    }
}

/// Rough token-to-word conversion for the prompt's word budget.
fn estimated_words(tokens: u32) -> u32 {
    (tokens * 3) / 4
}

/// Single-pass sentiment classifier over a truncated transcript prefix.
///
/// Only the first `prefix_chars` characters are classified; long
/// transcripts' sentiment is judged from their opening portion. That
/// cost-bounding truncation is a documented limitation.
pub struct SentimentClassifier {
    model: Arc<dyn SentimentModel>,
    prefix_chars: usize,
}

impl SentimentClassifier {
    pub fn new(model: Arc<dyn SentimentModel>, prefix_chars: usize) -> Self {
        Self {
            model,
            prefix_chars,
        }
    }

    /// Classify a transcript. Empty input returns the neutral default.
    #[instrument(skip(self, text), fields(text_chars = text.len()))]
    pub async fn classify(&self, text: &str) -> Result<Sentiment> {
        if text.trim().is_empty() {
            return Ok(Sentiment::neutral());
        }

        let prefix = char_prefix(text, self.prefix_chars);
        let (label, score) = self.model.classify(prefix).await?;
        Ok(Sentiment { label, score })
    }
}

/// First `max_chars` characters of a string, respecting UTF-8 boundaries.
pub fn char_prefix(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_offset, _)) => &text[..byte_offset],
        None => text,
    }
}

/// Split a string into consecutive windows of at most `window_chars`
/// characters, respecting UTF-8 boundaries.
fn char_windows(text: &str, window_chars: usize) -> Vec<&str> {
    if window_chars == 0 {
        return vec![text];
    }

    let mut boundaries: Vec<usize> = text
        .char_indices()
        .step_by(window_chars)
        .map(|(offset, _)| offset)
        .collect();
    boundaries.push(text.len());

    boundaries
        .windows(2)
        .map(|pair| &text[pair[0]..pair[1]])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct CountingGenerator {
        calls: Mutex<u32>,
    }

    #[async_trait]
    impl Generator for CountingGenerator {
        async fn generate(&self, _prompt: &str, _max_output_tokens: u32) -> Result<String> {
            let mut calls = self.calls.lock().unwrap();
            *calls += 1;
            Ok(format!("summary{}", calls))
        }
    }

    struct RecordingSentimentModel {
        inputs: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl SentimentModel for RecordingSentimentModel {
        async fn classify(&self, text: &str) -> Result<(String, f32)> {
            self.inputs.lock().unwrap().push(text.to_string());
            // Label derived from the input so prefix determinism is visible.
            Ok((format!("LEN{}", text.chars().count()), 0.9))
        }
    }

    fn summarizer(window_chars: usize) -> (Summarizer, Arc<CountingGenerator>) {
        let generator = Arc::new(CountingGenerator {
            calls: Mutex::new(0),
        });
        (
            Summarizer::new(generator.clone(), Prompts::default(), window_chars, 30, 130),
            generator,
        )
    }

    #[tokio::test]
    async fn test_blank_input_summarizes_to_empty() {
        let (summarizer, generator) = summarizer(1000);
        assert_eq!(summarizer.summarize("").await.unwrap(), "");
        assert_eq!(summarizer.summarize("  \n\t ").await.unwrap(), "");
        assert_eq!(*generator.calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_one_fragment_per_window_space_joined() {
        let (summarizer, generator) = summarizer(10);
        let text = "a".repeat(25); // three windows: 10, 10, 5

        let summary = summarizer.summarize(&text).await.unwrap();
        assert_eq!(summary, "summary1 summary2 summary3");
        assert_eq!(*generator.calls.lock().unwrap(), 3);
    }

    #[tokio::test]
    async fn test_sentiment_prefix_determinism() {
        let model = Arc::new(RecordingSentimentModel {
            inputs: Mutex::new(Vec::new()),
        });
        let classifier = SentimentClassifier::new(model.clone(), 10);

        let long = "x".repeat(100);
        let prefix = char_prefix(&long, 10).to_string();

        let full = classifier.classify(&long).await.unwrap();
        let truncated = classifier.classify(&prefix).await.unwrap();
        assert_eq!(full, truncated);

        let inputs = model.inputs.lock().unwrap();
        assert_eq!(inputs[0], inputs[1]);
    }

    #[tokio::test]
    async fn test_empty_sentiment_is_neutral_without_model_call() {
        let model = Arc::new(RecordingSentimentModel {
            inputs: Mutex::new(Vec::new()),
        });
        let classifier = SentimentClassifier::new(model.clone(), 1000);

        let sentiment = classifier.classify("  ").await.unwrap();
        assert_eq!(sentiment, Sentiment::neutral());
        assert!(model.inputs.lock().unwrap().is_empty());
    }

    #[test]
    fn test_char_helpers_respect_utf8_boundaries() {
        let text = "héllo wörld ありがとう";
        let prefix = char_prefix(text, 7);
        assert_eq!(prefix.chars().count(), 7);

        let windows = char_windows(text, 5);
        let rejoined: String = windows.concat();
        assert_eq!(rejoined, text);
        for w in &windows {
            assert!(w.chars().count() <= 5);
        }
    }
}
