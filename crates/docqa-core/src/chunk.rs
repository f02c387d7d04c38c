//! Recursive, overlap-aware text chunker.
//!
//! Splits extracted document text into [`Chunk`]s of at most `chunk_size`
//! characters, with adjacent chunks sharing up to `chunk_overlap`
//! characters so that context crossing a boundary survives intact in at
//! least one chunk.
//!
//! # Algorithm
//!
//! 1. Split the text on the highest-priority separator present
//!    (`"\n\n"`, then `"\n"`, then `" "`). The separator stays attached to
//!    the end of the piece it terminates, so the pieces tile the text.
//! 2. Pieces still longer than `chunk_size` are split again with the
//!    remaining, lower-priority separators. When none is left every
//!    character becomes its own unit (character fallback).
//! 3. Units are merged greedily into windows of at most `chunk_size`
//!    characters. After a window is emitted, units are dropped from its
//!    front until what remains fits in `chunk_overlap` and leaves room for
//!    the next unit; the remainder becomes the start of the next window.
//!
//! Every chunk is an exact substring of the input, identified by its
//! character span, so dropping each chunk's overlap with its predecessor
//! and concatenating reproduces the input.
//!
//! # Example
//!
//! ```rust
//! use docqa_core::chunk::Chunker;
//!
//! let chunker = Chunker::new(1000, 200).unwrap();
//! let chunks = chunker.chunk_document("doc-123", "Hello world.\n\nSecond paragraph.");
//! assert_eq!(chunks.len(), 1);
//! assert_eq!(chunks[0].chunk_index, 0);
//! assert_eq!(chunks[0].total_chunks, 1);
//! ```

use std::collections::VecDeque;
use std::ops::Range;

use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::Chunk;

/// Separators in priority order. The empty entry is the character fallback.
const SEPARATORS: &[&[char]] = &[&['\n', '\n'], &['\n'], &[' '], &[]];

/// Splits text into overlapping, positionally-tagged chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Chunker {
    /// Create a chunker.
    ///
    /// Fails with [`Error::ChunkingFailure`] unless
    /// `0 <= chunk_overlap < chunk_size`; an overlap as large as the chunk
    /// would never advance.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::ChunkingFailure(
                "chunk_size must be greater than 0".to_string(),
            ));
        }
        if chunk_overlap >= chunk_size {
            return Err(Error::ChunkingFailure(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                chunk_overlap, chunk_size
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Split `text` into plain strings, without chunk metadata.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        self.spans(&chars)
            .into_iter()
            .map(|span| chars[span].iter().collect())
            .collect()
    }

    /// Split a document's text into [`Chunk`]s with contiguous indices.
    ///
    /// # Guarantees
    ///
    /// - Empty or whitespace-only text yields no chunks.
    /// - Text of at most `chunk_size` characters yields exactly one chunk.
    /// - Indices are `0..n` and every chunk carries `total_chunks == n`.
    /// - Each chunk holds at most `chunk_size` characters and overlaps its
    ///   predecessor by at most `chunk_overlap` characters.
    pub fn chunk_document(&self, document_id: &str, text: &str) -> Vec<Chunk> {
        let chars: Vec<char> = text.chars().collect();
        let spans = self.spans(&chars);
        let total = spans.len();

        spans
            .into_iter()
            .enumerate()
            .map(|(index, span)| {
                let text: String = chars[span.clone()].iter().collect();
                make_chunk(document_id, index, total, text, span)
            })
            .collect()
    }

    /// Character spans of each chunk.
    fn spans(&self, chars: &[char]) -> Vec<Range<usize>> {
        if chars.iter().all(|c| c.is_whitespace()) {
            return Vec::new();
        }
        let mut units = Vec::new();
        self.split_units(chars, 0..chars.len(), 0, &mut units);
        self.merge_units(&units)
    }

    /// Break `range` into units no longer than `chunk_size`, using
    /// separators from `level` onwards.
    fn split_units(
        &self,
        chars: &[char],
        range: Range<usize>,
        level: usize,
        out: &mut Vec<Range<usize>>,
    ) {
        if range.len() <= self.chunk_size {
            out.push(range);
            return;
        }

        let mut level = level.min(SEPARATORS.len() - 1);
        while level < SEPARATORS.len() - 1
            && !contains_separator(&chars[range.clone()], SEPARATORS[level])
        {
            level += 1;
        }

        let sep = SEPARATORS[level];
        if sep.is_empty() {
            out.extend(range.map(|i| i..i + 1));
            return;
        }

        let mut piece_start = range.start;
        let mut i = range.start;
        while i + sep.len() <= range.end {
            if &chars[i..i + sep.len()] == sep {
                let piece_end = i + sep.len();
                self.split_units(chars, piece_start..piece_end, level + 1, out);
                piece_start = piece_end;
                i = piece_end;
            } else {
                i += 1;
            }
        }
        if piece_start < range.end {
            self.split_units(chars, piece_start..range.end, level + 1, out);
        }
    }

    /// Greedily merge contiguous units into overlapping windows.
    fn merge_units(&self, units: &[Range<usize>]) -> Vec<Range<usize>> {
        let mut spans = Vec::new();
        let mut window: VecDeque<Range<usize>> = VecDeque::new();
        let mut total = 0usize;

        for unit in units {
            let len = unit.len();
            if !window.is_empty() && total + len > self.chunk_size {
                if let Some(span) = window_span(&window) {
                    spans.push(span);
                }
                while total > self.chunk_overlap || (total > 0 && total + len > self.chunk_size) {
                    match window.pop_front() {
                        Some(front) => total -= front.len(),
                        None => break,
                    }
                }
            }
            window.push_back(unit.clone());
            total += len;
        }

        if let Some(span) = window_span(&window) {
            spans.push(span);
        }
        spans
    }
}

fn window_span(window: &VecDeque<Range<usize>>) -> Option<Range<usize>> {
    match (window.front(), window.back()) {
        (Some(first), Some(last)) => Some(first.start..last.end),
        _ => None,
    }
}

fn contains_separator(chars: &[char], sep: &[char]) -> bool {
    !sep.is_empty() && chars.windows(sep.len()).any(|w| w == sep)
}

/// Create a single [`Chunk`] with a deterministic ID and SHA-256 content hash.
fn make_chunk(
    document_id: &str,
    index: usize,
    total: usize,
    text: String,
    span: Range<usize>,
) -> Chunk {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let hash = format!("{:x}", hasher.finalize());

    let id = Uuid::new_v5(
        &Uuid::NAMESPACE_OID,
        format!("{}:{}", document_id, index).as_bytes(),
    );

    Chunk {
        id: id.to_string(),
        document_id: document_id.to_string(),
        chunk_index: index,
        total_chunks: total,
        text,
        hash,
        char_start: span.start,
        char_end: span.end,
    }
}
