//! Retrieval-augmented answer composition.
//!
//! Given a question and a video, loads that video's persisted index, finds
//! the nearest segments, assembles a bounded context, and conditions a single
//! generation call on it. Requires a previously built index; there is no
//! retry policy, so failures propagate to the caller.

use crate::config::{render, Prompts};
use crate::error::{Result, TubelensError};
use crate::index::{normalize_l2, IndexStore};
use crate::models::{Embedder, Generator};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// One retrieved segment with its similarity score.
#[derive(Debug, Clone)]
pub struct ScoredSegment {
    pub text: String,
    pub score: f32,
}

/// Ordered retrieval output: segments by descending similarity,
/// at most `min(top_k, segment_count)` entries.
pub type RetrievalResult = Vec<ScoredSegment>;

/// A composed answer with the segments it was conditioned on.
#[derive(Debug, Clone)]
pub struct Answer {
    pub text: String,
    pub sources: RetrievalResult,
}

/// Retriever and answer composer over per-video indexes.
pub struct AnswerComposer {
    embedder: Arc<dyn Embedder>,
    generator: Arc<dyn Generator>,
    store: Arc<IndexStore>,
    prompts: Prompts,
    max_output_tokens: u32,
}

impl AnswerComposer {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
        store: Arc<IndexStore>,
        prompts: Prompts,
        max_output_tokens: u32,
    ) -> Self {
        Self {
            embedder,
            generator,
            store,
            prompts,
            max_output_tokens,
        }
    }

    /// Retrieve the `top_k` most similar segments for a question.
    ///
    /// The question is embedded and normalized exactly as segments were at
    /// build time, so the index's inner product is cosine similarity.
    #[instrument(skip(self), fields(video_id = %video_id, top_k = top_k))]
    pub async fn retrieve(
        &self,
        video_id: &str,
        question: &str,
        top_k: usize,
    ) -> Result<RetrievalResult> {
        let question = question.trim();
        if question.is_empty() {
            return Err(TubelensError::EmptyQuestion);
        }

        let mut query = self.embedder.embed(question).await?;
        normalize_l2(&mut query);

        let (index, segments) = self.store.load(video_id).await?;
        let hits = index.search(&query, top_k);

        // Positions outside the mapping should be impossible given the
        // load-time alignment check, but a stale hit must never panic here.
        let retrieved: RetrievalResult = hits
            .into_iter()
            .filter_map(|hit| {
                segments.get(hit.position).map(|seg| ScoredSegment {
                    text: seg.text.clone(),
                    score: hit.score,
                })
            })
            .collect();

        debug!("Retrieved {} segments", retrieved.len());
        Ok(retrieved)
    }

    /// Answer a question about one video from its indexed transcript.
    ///
    /// Zero retrieved segments still produce a generation call with an empty
    /// context; the prompt instructs the model to declare ignorance rather
    /// than invent an answer.
    #[instrument(skip(self), fields(video_id = %video_id))]
    pub async fn answer(&self, video_id: &str, question: &str, top_k: usize) -> Result<Answer> {
        let question = question.trim();
        if question.is_empty() {
            return Err(TubelensError::EmptyQuestion);
        }

        let sources = self.retrieve(video_id, question, top_k).await?;

        let context = sources
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        let prompt = render(
            &self.prompts.rag.answer,
            &[("context", context.as_str()), ("question", question)],
        );

        info!("Generating answer from {} context segments", sources.len());
        let text = self
            .generator
            .generate(&prompt, self.max_output_tokens)
            .await?;

        Ok(Answer { text, sources })
    }
}
