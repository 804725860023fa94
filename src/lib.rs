//! Tubelens - Video Transcripts, Summaries and Q&A
//!
//! Turn long-form video into a queryable knowledge base: fetch transcripts
//! (falling back to speech-to-text when captions are unavailable), summarize
//! them, classify their sentiment, and answer questions grounded in the
//! video's own words.
//!
//! # Overview
//!
//! Tubelens allows you to:
//! - Acquire transcripts for YouTube videos, with a Whisper fallback
//! - Build a per-video vector index over transcript segments
//! - Ask questions answered only from the retrieved transcript context
//! - Inspect summaries, sentiment, and engagement metrics per video
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management
//! - `acquire` - Transcript acquisition (captions, speech-to-text fallback)
//! - `segment` - Word-window transcript segmentation
//! - `models` - Model boundary (embedding, generation, STT, sentiment)
//! - `index` - Per-video vector index build and persistence
//! - `rag` - Retrieval-augmented answer composition
//! - `analysis` - Summarization and sentiment classification
//! - `record` - Persistent video/segment record store
//! - `pipeline` - End-to-end coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use tubelens::config::Settings;
//! use tubelens::pipeline::Pipeline;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let pipeline = Pipeline::new(settings)?;
//!
//!     let outcome = pipeline.process_video("dQw4w9WgXcQ").await?;
//!     println!("Indexed {} segments", outcome.chunks_indexed);
//!
//!     let answer = pipeline
//!         .answer(&outcome.video_id, "What is the video about?", None)
//!         .await?;
//!     println!("{}", answer.text);
//!
//!     Ok(())
//! }
//! ```

pub mod acquire;
pub mod analysis;
pub mod cli;
pub mod config;
pub mod error;
pub mod index;
pub mod models;
pub mod openai;
pub mod pipeline;
pub mod rag;
pub mod record;
pub mod segment;

pub use error::{Result, TubelensError};
