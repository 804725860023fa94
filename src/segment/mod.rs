//! Transcript segmentation into overlapping word windows.
//!
//! The segmenter is a pure function of its inputs: the same transcript and
//! window parameters always produce the same ordered sequence of segments,
//! which is what keeps the vector index and its text mapping aligned across
//! rebuilds.

use crate::error::{Result, TubelensError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One ordered text span of a transcript.
///
/// `index` is the position of the segment within its video's sequence. The
/// vector index stores a row per segment in this order, so the index is part
/// of the persisted artifacts and is verified on load.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Segment {
    /// Unique segment ID.
    pub id: Uuid,
    /// Position within the video's segment sequence.
    pub index: u32,
    /// Text content of this window.
    pub text: String,
}

impl Segment {
    pub fn new(index: u32, text: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            index,
            text,
        }
    }
}

/// Split text into successive windows of `window_words` words, each window
/// starting `window_words - overlap_words` words after the previous one.
///
/// The final window may be shorter than `window_words`. Every word of the
/// input appears in at least one window, and consecutive windows share exactly
/// `overlap_words` words (except possibly the last, shorter window).
///
/// Returns `InvalidInput` when `overlap_words >= window_words`, since the
/// stride would be zero or negative and the window sequence would never
/// terminate.
pub fn segment_text(text: &str, window_words: usize, overlap_words: usize) -> Result<Vec<String>> {
    if window_words == 0 {
        return Err(TubelensError::InvalidInput(
            "window_words must be greater than zero".to_string(),
        ));
    }
    if overlap_words >= window_words {
        return Err(TubelensError::InvalidInput(format!(
            "overlap_words ({}) must be smaller than window_words ({})",
            overlap_words, window_words
        )));
    }

    let words: Vec<&str> = text.split_whitespace().collect();
    let stride = window_words - overlap_words;

    let mut windows = Vec::new();
    let mut start = 0;
    while start < words.len() {
        let end = (start + window_words).min(words.len());
        windows.push(words[start..end].join(" "));
        start += stride;
    }

    Ok(windows)
}

/// Segment a transcript and assign sequence indices and IDs.
pub fn segment_transcript(
    text: &str,
    window_words: usize,
    overlap_words: usize,
) -> Result<Vec<Segment>> {
    let windows = segment_text(text, window_words, overlap_words)?;
    Ok(windows
        .into_iter()
        .enumerate()
        .map(|(i, w)| Segment::new(i as u32, w))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn word_text(n: usize) -> String {
        (0..n).map(|i| format!("w{}", i)).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn test_windows_cover_every_word() {
        let text = word_text(137);
        let windows = segment_text(&text, 20, 5).unwrap();

        let mut seen: HashSet<String> = HashSet::new();
        for w in &windows {
            for word in w.split_whitespace() {
                seen.insert(word.to_string());
            }
        }

        for word in text.split_whitespace() {
            assert!(seen.contains(word), "word {} not covered", word);
        }
    }

    #[test]
    fn test_consecutive_windows_share_exact_overlap() {
        let text = word_text(100);
        let windows = segment_text(&text, 20, 5).unwrap();

        for pair in windows.windows(2) {
            let prev: Vec<&str> = pair[0].split_whitespace().collect();
            let next: Vec<&str> = pair[1].split_whitespace().collect();
            // The last window may be short, but it still starts exactly
            // `overlap` words before the previous window's end.
            if prev.len() == 20 {
                let shared = prev.len().min(5);
                assert_eq!(&prev[prev.len() - shared..], &next[..shared]);
            }
        }
    }

    #[test]
    fn test_final_window_may_be_short() {
        let text = word_text(25);
        let windows = segment_text(&text, 10, 2).unwrap();

        // Offsets 0, 8, 16, 24: last window has a single word.
        assert_eq!(windows.len(), 4);
        assert_eq!(windows[0].split_whitespace().count(), 10);
        assert_eq!(windows[3].split_whitespace().count(), 1);
    }

    #[test]
    fn test_rejects_degenerate_overlap() {
        assert!(segment_text("a b c", 5, 5).is_err());
        assert!(segment_text("a b c", 5, 7).is_err());
        assert!(segment_text("a b c", 0, 0).is_err());
    }

    #[test]
    fn test_empty_text_yields_no_windows() {
        assert!(segment_text("", 10, 2).unwrap().is_empty());
        assert!(segment_text("   \n\t ", 10, 2).unwrap().is_empty());
    }

    #[test]
    fn test_segment_transcript_assigns_ordered_indices() {
        let segments = segment_transcript(&word_text(30), 10, 2).unwrap();
        for (i, seg) in segments.iter().enumerate() {
            assert_eq!(seg.index, i as u32);
        }
    }
}
