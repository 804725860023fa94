//! Per-video vector index construction and persistence.
//!
//! Each indexed video owns two artifacts, always produced together:
//!
//! - `{video_id}.index`: the serialized flat inner-product index, one row
//!   per segment in segment order, each row tagged with its segment ID.
//! - `{video_id}.segments.json`: the ordered segment text mapping.
//!
//! Row *i* of the index corresponds to entry *i* of the mapping. The loader
//! verifies counts and segment IDs on every load and treats any mismatch or
//! partial write as "no index". Writes go through a temp file + rename under
//! a per-video write lock, so a build in progress is never visible to a
//! concurrent retrieval on the same video. Builds for different videos are
//! independent.

mod flat;

pub use flat::{normalize_l2, FlatIpIndex, Hit};

use crate::error::{Result, TubelensError};
use crate::models::Embedder;
use crate::segment::Segment;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Serialize, Deserialize)]
struct SegmentMapping {
    segments: Vec<Segment>,
}

/// Filesystem store for per-video index artifacts with per-video
/// build/read exclusivity.
pub struct IndexStore {
    root: PathBuf,
    locks: Mutex<HashMap<String, Arc<RwLock<()>>>>,
}

impl IndexStore {
    /// Create a store rooted at the given directory, creating it if needed.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            locks: Mutex::new(HashMap::new()),
        })
    }

    fn index_path(&self, video_id: &str) -> PathBuf {
        self.root.join(format!("{}.index", video_id))
    }

    fn mapping_path(&self, video_id: &str) -> PathBuf {
        self.root.join(format!("{}.segments.json", video_id))
    }

    fn lock_for(&self, video_id: &str) -> Result<Arc<RwLock<()>>> {
        let mut locks = self
            .locks
            .lock()
            .map_err(|e| TubelensError::Index(format!("Failed to acquire lock map: {}", e)))?;
        Ok(locks
            .entry(video_id.to_string())
            .or_insert_with(|| Arc::new(RwLock::new(())))
            .clone())
    }

    /// Persist both artifacts for a video, replacing any previous pair.
    #[instrument(skip(self, index, segments), fields(video_id = %video_id, rows = index.len()))]
    pub async fn write(
        &self,
        video_id: &str,
        index: &FlatIpIndex,
        segments: &[Segment],
    ) -> Result<()> {
        if index.len() != segments.len() {
            return Err(TubelensError::Index(format!(
                "index has {} rows but mapping has {} segments",
                index.len(),
                segments.len()
            )));
        }

        let lock = self.lock_for(video_id)?;
        let _guard = lock.write().await;

        let mapping = SegmentMapping {
            segments: segments.to_vec(),
        };
        write_atomic(
            &self.root,
            &self.mapping_path(video_id),
            serde_json::to_vec_pretty(&mapping)?.as_slice(),
        )?;
        write_atomic(&self.root, &self.index_path(video_id), &index.to_bytes())?;

        info!("Persisted index artifacts ({} rows)", index.len());
        Ok(())
    }

    /// Load both artifacts for a video and verify their alignment.
    ///
    /// Returns `IndexNotFound` when either artifact is missing, unreadable,
    /// or the pair is inconsistent (partial write, mismatched segment IDs).
    #[instrument(skip(self), fields(video_id = %video_id))]
    pub async fn load(&self, video_id: &str) -> Result<(FlatIpIndex, Vec<Segment>)> {
        let lock = self.lock_for(video_id)?;
        let _guard = lock.read().await;

        let index_path = self.index_path(video_id);
        let mapping_path = self.mapping_path(video_id);
        if !index_path.exists() || !mapping_path.exists() {
            return Err(TubelensError::IndexNotFound(video_id.to_string()));
        }

        let index = match FlatIpIndex::from_bytes(&std::fs::read(&index_path)?) {
            Ok(index) => index,
            Err(e) => {
                warn!("Unreadable index artifact, treating as absent: {}", e);
                return Err(TubelensError::IndexNotFound(video_id.to_string()));
            }
        };

        let mapping: SegmentMapping = match serde_json::from_slice(&std::fs::read(&mapping_path)?)
        {
            Ok(mapping) => mapping,
            Err(e) => {
                warn!("Unreadable segment mapping, treating as absent: {}", e);
                return Err(TubelensError::IndexNotFound(video_id.to_string()));
            }
        };

        if !aligned(&index, &mapping.segments) {
            warn!("Index and segment mapping disagree, treating as absent");
            return Err(TubelensError::IndexNotFound(video_id.to_string()));
        }

        debug!("Loaded index with {} rows", index.len());
        Ok((index, mapping.segments))
    }
}

/// Positional alignment check: row *i* must carry the ID of segment *i*.
fn aligned(index: &FlatIpIndex, segments: &[Segment]) -> bool {
    index.len() == segments.len()
        && index
            .ids()
            .iter()
            .zip(segments)
            .enumerate()
            .all(|(i, (row_id, seg))| *row_id == seg.id && seg.index == i as u32)
}

fn write_atomic(dir: &Path, dest: &Path, bytes: &[u8]) -> Result<()> {
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.flush()?;
    tmp.persist(dest)
        .map_err(|e| TubelensError::Index(format!("failed to persist artifact: {}", e)))?;
    Ok(())
}

/// Builds and persists the vector index for one video's segments.
pub struct EmbeddingIndexer {
    embedder: Arc<dyn Embedder>,
    store: Arc<IndexStore>,
}

impl EmbeddingIndexer {
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<IndexStore>) -> Self {
        Self { embedder, store }
    }

    /// Embed every segment, build a flat inner-product index over the
    /// normalized vectors, and persist it with the text mapping.
    ///
    /// An empty segment list is a silent no-op: existing artifacts, if any,
    /// are left untouched. Returns the number of indexed segments.
    #[instrument(skip(self, segments), fields(video_id = %video_id, segments = segments.len()))]
    pub async fn build(&self, video_id: &str, segments: &[Segment]) -> Result<usize> {
        if segments.is_empty() {
            debug!("No segments to index, skipping");
            return Ok(0);
        }

        let texts: Vec<String> = segments.iter().map(|s| s.text.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        if embeddings.len() != segments.len() {
            return Err(TubelensError::Embedding(format!(
                "expected {} embeddings, got {}",
                segments.len(),
                embeddings.len()
            )));
        }

        let dims = embeddings
            .first()
            .map(|v| v.len())
            .unwrap_or_else(|| self.embedder.dimensions());
        let mut index = FlatIpIndex::new(dims);
        for (segment, vector) in segments.iter().zip(embeddings) {
            index.add(segment.id, vector)?;
        }

        self.store.write(video_id, &index, segments).await?;
        Ok(segments.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::Segment;
    use async_trait::async_trait;

    /// Deterministic fake embedder: a tiny keyword feature space.
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

    fn test_segments() -> Vec<Segment> {
        vec![
            Segment::new(0, "cats are small mammals".to_string()),
            Segment::new(1, "dogs are loyal companions".to_string()),
        ]
    }

    fn indexer_in(dir: &Path) -> (EmbeddingIndexer, Arc<IndexStore>) {
        let store = Arc::new(IndexStore::new(dir).unwrap());
        (
            EmbeddingIndexer::new(Arc::new(KeywordEmbedder), store.clone()),
            store,
        )
    }

    #[tokio::test]
    async fn test_build_and_load_stay_aligned() {
        let dir = tempfile::tempdir().unwrap();
        let (indexer, store) = indexer_in(dir.path());
        let segments = test_segments();

        let count = indexer.build("vid-1", &segments).await.unwrap();
        assert_eq!(count, 2);

        let (index, mapping) = store.load("vid-1").await.unwrap();
        assert_eq!(index.len(), mapping.len());
        assert_eq!(index.ids()[0], segments[0].id);
        assert_eq!(mapping[1].text, "dogs are loyal companions");
    }

    #[tokio::test]
    async fn test_empty_build_is_noop_and_preserves_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let (indexer, store) = indexer_in(dir.path());
        let segments = test_segments();

        indexer.build("vid-1", &segments).await.unwrap();
        let count = indexer.build("vid-1", &[]).await.unwrap();
        assert_eq!(count, 0);

        // Previous artifacts must still load.
        let (index, _) = store.load("vid-1").await.unwrap();
        assert_eq!(index.len(), 2);
    }

    #[tokio::test]
    async fn test_missing_index_reports_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let (_, store) = indexer_in(dir.path());

        match store.load("nope").await {
            Err(TubelensError::IndexNotFound(id)) => assert_eq!(id, "nope"),
            other => panic!("expected IndexNotFound, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_partial_write_treated_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let (indexer, store) = indexer_in(dir.path());

        indexer.build("vid-1", &test_segments()).await.unwrap();

        // Truncate the binary artifact to simulate a torn write.
        let index_path = dir.path().join("vid-1.index");
        let bytes = std::fs::read(&index_path).unwrap();
        std::fs::write(&index_path, &bytes[..bytes.len() / 2]).unwrap();

        assert!(matches!(
            store.load("vid-1").await,
            Err(TubelensError::IndexNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_mismatched_mapping_treated_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let (indexer, store) = indexer_in(dir.path());

        indexer.build("vid-1", &test_segments()).await.unwrap();

        // Replace the mapping with one whose IDs don't match the index rows.
        let stale = SegmentMapping {
            segments: test_segments(),
        };
        std::fs::write(
            dir.path().join("vid-1.segments.json"),
            serde_json::to_vec(&stale).unwrap(),
        )
        .unwrap();

        assert!(matches!(
            store.load("vid-1").await,
            Err(TubelensError::IndexNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_rebuild_replaces_both_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let (indexer, store) = indexer_in(dir.path());

        indexer.build("vid-1", &test_segments()).await.unwrap();

        let replacement = vec![Segment::new(0, "a whole new transcript".to_string())];
        indexer.build("vid-1", &replacement).await.unwrap();

        let (index, mapping) = store.load("vid-1").await.unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(mapping[0].text, "a whole new transcript");
    }
}
