//! SQLite-backed record store implementation.

use super::{ChunkRecord, RecordStore, VideoRecord, VideoSummary};
use crate::analysis::Sentiment;
use crate::error::{Result, TubelensError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info, instrument};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS videos (
    video_id TEXT PRIMARY KEY,
    youtube_id TEXT NOT NULL,
    source_url TEXT NOT NULL,
    title TEXT,
    uploader TEXT,
    duration_seconds INTEGER,
    view_count INTEGER,
    like_count INTEGER,
    description TEXT,
    transcript_text TEXT NOT NULL,
    summary TEXT NOT NULL,
    sentiment_label TEXT NOT NULL,
    sentiment_score REAL NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS chunks (
    chunk_id TEXT PRIMARY KEY,
    video_id TEXT NOT NULL,
    chunk_index INTEGER NOT NULL,
    text TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_chunks_video_id ON chunks(video_id);
"#;

/// SQLite record store.
pub struct SqliteRecordStore {
    conn: Mutex<Connection>,
}

impl SqliteRecordStore {
    /// Open (or create) a record store at the given path.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // Enable WAL mode for better concurrent performance
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Initialized SQLite record store at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory record store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| TubelensError::Config(format!("Failed to acquire store lock: {}", e)))
    }
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<VideoRecord> {
    let created_at_str: String = row.get(13)?;
    Ok(VideoRecord {
        video_id: row.get(0)?,
        youtube_id: row.get(1)?,
        source_url: row.get(2)?,
        title: row.get(3)?,
        uploader: row.get(4)?,
        duration_seconds: row.get(5)?,
        view_count: row.get(6)?,
        like_count: row.get(7)?,
        description: row.get(8)?,
        transcript_text: row.get(9)?,
        summary: row.get(10)?,
        sentiment: Sentiment {
            label: row.get(11)?,
            score: row.get(12)?,
        },
        created_at: DateTime::parse_from_rfc3339(&created_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
    })
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    #[instrument(skip(self, record), fields(video_id = %record.video_id))]
    async fn put(&self, record: &VideoRecord) -> Result<()> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;

        tx.execute(
            r#"
            INSERT OR REPLACE INTO videos
            (video_id, youtube_id, source_url, title, uploader, duration_seconds,
             view_count, like_count, description, transcript_text, summary,
             sentiment_label, sentiment_score, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
            params![
                record.video_id,
                record.youtube_id,
                record.source_url,
                record.title,
                record.uploader,
                record.duration_seconds,
                record.view_count,
                record.like_count,
                record.description,
                record.transcript_text,
                record.summary,
                record.sentiment.label,
                record.sentiment.score,
                record.created_at.to_rfc3339(),
            ],
        )?;

        // A fresh record starts with an empty chunk collection.
        tx.execute("DELETE FROM chunks WHERE video_id = ?1", params![record.video_id])?;

        tx.commit()?;
        debug!("Stored video record");
        Ok(())
    }

    #[instrument(skip(self, chunk), fields(video_id = %video_id, chunk_index = chunk.chunk_index))]
    async fn put_chunk(&self, video_id: &str, chunk: &ChunkRecord) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            r#"
            INSERT OR REPLACE INTO chunks (chunk_id, video_id, chunk_index, text)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                chunk.chunk_id.to_string(),
                video_id,
                chunk.chunk_index,
                chunk.text,
            ],
        )?;
        Ok(())
    }

    async fn get(&self, video_id: &str) -> Result<Option<VideoRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT video_id, youtube_id, source_url, title, uploader, duration_seconds,
                   view_count, like_count, description, transcript_text, summary,
                   sentiment_label, sentiment_score, created_at
            FROM videos WHERE video_id = ?1
            "#,
        )?;

        let mut rows = stmt.query_map(params![video_id], record_from_row)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    async fn list(&self) -> Result<Vec<VideoSummary>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT video_id, youtube_id, title, uploader, duration_seconds, view_count
            FROM videos ORDER BY created_at DESC
            "#,
        )?;

        let summaries = stmt
            .query_map([], |row| {
                Ok(VideoSummary {
                    video_id: row.get(0)?,
                    youtube_id: row.get(1)?,
                    title: row.get(2)?,
                    uploader: row.get(3)?,
                    duration_seconds: row.get(4)?,
                    view_count: row.get(5)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(summaries)
    }

    async fn chunk_count(&self, video_id: &str) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM chunks WHERE video_id = ?1",
            params![video_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn sample_record(video_id: &str) -> VideoRecord {
        VideoRecord {
            video_id: video_id.to_string(),
            youtube_id: "dQw4w9WgXcQ".to_string(),
            source_url: "https://www.youtube.com/watch?v=dQw4w9WgXcQ".to_string(),
            title: Some("A Talk".to_string()),
            uploader: Some("someone".to_string()),
            duration_seconds: Some(212),
            view_count: Some(12345),
            like_count: Some(678),
            description: None,
            transcript_text: "hello world".to_string(),
            summary: "a greeting".to_string(),
            sentiment: Sentiment {
                label: "POSITIVE".to_string(),
                score: 0.98,
            },
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_put_get_round_trip() {
        let store = SqliteRecordStore::in_memory().unwrap();
        store.put(&sample_record("v1")).await.unwrap();

        let fetched = store.get("v1").await.unwrap().unwrap();
        assert_eq!(fetched.youtube_id, "dQw4w9WgXcQ");
        assert_eq!(fetched.sentiment.label, "POSITIVE");
        assert!((fetched.sentiment.score - 0.98).abs() < 1e-6);

        assert!(store.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_chunks_stored_and_counted() {
        let store = SqliteRecordStore::in_memory().unwrap();
        store.put(&sample_record("v1")).await.unwrap();

        for i in 0..3 {
            store
                .put_chunk(
                    "v1",
                    &ChunkRecord {
                        chunk_id: Uuid::new_v4(),
                        chunk_index: i,
                        text: format!("chunk {}", i),
                    },
                )
                .await
                .unwrap();
        }

        assert_eq!(store.chunk_count("v1").await.unwrap(), 3);
        assert_eq!(store.chunk_count("other").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_put_resets_chunk_collection() {
        let store = SqliteRecordStore::in_memory().unwrap();
        let record = sample_record("v1");
        store.put(&record).await.unwrap();
        store
            .put_chunk(
                "v1",
                &ChunkRecord {
                    chunk_id: Uuid::new_v4(),
                    chunk_index: 0,
                    text: "old chunk".to_string(),
                },
            )
            .await
            .unwrap();

        // Re-creating the record defaults the chunk collection to empty.
        store.put(&record).await.unwrap();
        assert_eq!(store.chunk_count("v1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_list_returns_summaries() {
        let store = SqliteRecordStore::in_memory().unwrap();
        store.put(&sample_record("v1")).await.unwrap();
        store.put(&sample_record("v2")).await.unwrap();

        let listed = store.list().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed.iter().all(|s| s.title.as_deref() == Some("A Talk")));
    }
}
