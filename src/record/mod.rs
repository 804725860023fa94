//! Persistent record store for video and segment metadata.
//!
//! A generic key-value/document contract over video records: the core
//! produces and consumes records through this trait and does not care what
//! backs it. The bundled implementation is SQLite.

mod sqlite;

pub use sqlite::SqliteRecordStore;

use crate::analysis::Sentiment;
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The full record for one processed video. Created once per successful
/// acquisition+analysis run and immutable thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoRecord {
    /// Internal video ID (distinct from the YouTube ID).
    pub video_id: String,
    pub youtube_id: String,
    pub source_url: String,
    pub title: Option<String>,
    pub uploader: Option<String>,
    pub duration_seconds: Option<u64>,
    pub view_count: Option<u64>,
    pub like_count: Option<u64>,
    pub description: Option<String>,
    pub transcript_text: String,
    pub summary: String,
    pub sentiment: Sentiment,
    pub created_at: DateTime<Utc>,
}

/// Metadata for one segment, addressable independently of the vector index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub chunk_id: Uuid,
    pub chunk_index: u32,
    pub text: String,
}

/// Lightweight listing entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoSummary {
    pub video_id: String,
    pub youtube_id: String,
    pub title: Option<String>,
    pub uploader: Option<String>,
    pub duration_seconds: Option<u64>,
    pub view_count: Option<u64>,
}

/// Trait for record store implementations.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Persist a full video record. Creating a record starts it with an
    /// empty chunk-metadata collection (any previous chunks are dropped).
    async fn put(&self, record: &VideoRecord) -> Result<()>;

    /// Persist one segment's metadata for a video.
    async fn put_chunk(&self, video_id: &str, chunk: &ChunkRecord) -> Result<()>;

    /// Fetch a video record, if present.
    async fn get(&self, video_id: &str) -> Result<Option<VideoRecord>>;

    /// List lightweight summaries of all stored videos.
    async fn list(&self) -> Result<Vec<VideoSummary>>;

    /// Number of stored chunks for a video.
    async fn chunk_count(&self, video_id: &str) -> Result<usize>;
}
