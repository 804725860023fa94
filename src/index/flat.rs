//! Exact inner-product similarity index over normalized vectors.
//!
//! A flat (brute-force) index: every query scans all rows. Vectors are
//! L2-normalized before insertion so inner product equals cosine similarity.
//! Each row carries the segment ID it was built from, which lets the loader
//! verify that the index and the text mapping still describe the same
//! segments.

use crate::error::{Result, TubelensError};
use uuid::Uuid;

/// On-disk magic bytes and format version.
const MAGIC: &[u8; 4] = b"TLIX";
const VERSION: u32 = 1;

/// Flat inner-product index.
#[derive(Debug, Clone)]
pub struct FlatIpIndex {
    dims: usize,
    ids: Vec<Uuid>,
    vectors: Vec<Vec<f32>>,
}

/// A single search hit: row position and similarity score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub position: usize,
    pub score: f32,
}

impl FlatIpIndex {
    /// Create an empty index for vectors of the given dimensionality.
    pub fn new(dims: usize) -> Self {
        Self {
            dims,
            ids: Vec::new(),
            vectors: Vec::new(),
        }
    }

    /// Vector dimensionality.
    pub fn dims(&self) -> usize {
        self.dims
    }

    /// Number of rows in the index.
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Segment IDs in row order.
    pub fn ids(&self) -> &[Uuid] {
        &self.ids
    }

    /// Append a row. The vector is normalized in place before storage.
    pub fn add(&mut self, id: Uuid, mut vector: Vec<f32>) -> Result<()> {
        if vector.len() != self.dims {
            return Err(TubelensError::Index(format!(
                "vector has {} dimensions, index expects {}",
                vector.len(),
                self.dims
            )));
        }
        normalize_l2(&mut vector);
        self.ids.push(id);
        self.vectors.push(vector);
        Ok(())
    }

    /// Return the `top_k` rows with the highest inner product against the
    /// query, ordered by descending score. Returns at most `len()` hits when
    /// `top_k` exceeds the row count.
    ///
    /// The query is expected to be normalized by the caller (the same
    /// normalization applied at build time).
    pub fn search(&self, query: &[f32], top_k: usize) -> Vec<Hit> {
        let mut hits: Vec<Hit> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(position, v)| Hit {
                position,
                score: inner_product(query, v),
            })
            .collect();

        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(top_k);
        hits
    }

    /// Serialize to the binary artifact format.
    ///
    /// Layout: magic, version, dims, row count (all u32 LE), then per row a
    /// 16-byte segment UUID followed by `dims` f32 LE values.
    pub fn to_bytes(&self) -> Vec<u8> {
        let row_len = 16 + self.dims * 4;
        let mut buf = Vec::with_capacity(16 + self.len() * row_len);
        buf.extend_from_slice(MAGIC);
        buf.extend_from_slice(&VERSION.to_le_bytes());
        buf.extend_from_slice(&(self.dims as u32).to_le_bytes());
        buf.extend_from_slice(&(self.len() as u32).to_le_bytes());

        for (id, vector) in self.ids.iter().zip(&self.vectors) {
            buf.extend_from_slice(id.as_bytes());
            for value in vector {
                buf.extend_from_slice(&value.to_le_bytes());
            }
        }

        buf
    }

    /// Deserialize from the binary artifact format.
    ///
    /// Any truncation or header mismatch is an `Index` error; callers treat a
    /// failed parse as a partially written artifact.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < 16 {
            return Err(TubelensError::Index("index file truncated".to_string()));
        }
        if &bytes[0..4] != MAGIC {
            return Err(TubelensError::Index("bad index file magic".to_string()));
        }
        let version = read_u32(&bytes[4..8]);
        if version != VERSION {
            return Err(TubelensError::Index(format!(
                "unsupported index version {}",
                version
            )));
        }
        let dims = read_u32(&bytes[8..12]) as usize;
        let count = read_u32(&bytes[12..16]) as usize;

        let row_len = 16 + dims * 4;
        if bytes.len() != 16 + count * row_len {
            return Err(TubelensError::Index("index file truncated".to_string()));
        }

        let mut ids = Vec::with_capacity(count);
        let mut vectors = Vec::with_capacity(count);
        for row in 0..count {
            let offset = 16 + row * row_len;
            let id_bytes: [u8; 16] = bytes[offset..offset + 16]
                .try_into()
                .map_err(|_| TubelensError::Index("index file truncated".to_string()))?;
            ids.push(Uuid::from_bytes(id_bytes));

            let vector = bytes[offset + 16..offset + row_len]
                .chunks_exact(4)
                .map(|chunk| {
                    let arr: [u8; 4] = chunk.try_into().unwrap_or_default();
                    f32::from_le_bytes(arr)
                })
                .collect();
            vectors.push(vector);
        }

        Ok(Self { dims, ids, vectors })
    }
}

/// Scale a vector to unit length. Zero vectors are left unchanged.
pub fn normalize_l2(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in vector.iter_mut() {
            *value /= norm;
        }
    }
}

fn inner_product(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

fn read_u32(bytes: &[u8]) -> u32 {
    let arr: [u8; 4] = bytes.try_into().unwrap_or_default();
    u32::from_le_bytes(arr)
}
