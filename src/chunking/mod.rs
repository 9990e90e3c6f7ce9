//! Recursive, overlap-aware text chunking.
//!
//! [`RecursiveChunker`] splits a document into retrieval-sized pieces by
//! walking a priority-ordered separator ladder: section headers first, then
//! bullets, newlines, sentence boundaries, and finally single spaces. A span
//! that still exceeds the size bound after every separator has been tried is
//! hard-cut on grapheme cluster boundaries.
//!
//! Chunks are exact substrings of the input. Consecutive chunks share an
//! overlap of at most [`ChunkingConfig::chunk_overlap`] characters, and no
//! character outside those overlaps is dropped or duplicated —
//! [`RecursiveChunker::chunk_spans`] exposes the byte ranges that witness
//! this. Sizes count Unicode scalar values, not bytes.

use std::collections::VecDeque;
use std::ops::Range;

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

use crate::types::{RagError, RagResult};

/// Separator ladder tuned for résumé-style documents: markdown section
/// headers, list bullets, line breaks, sentence ends, spaces.
pub fn default_separators() -> Vec<String> {
    ["\n## ", "\n### ", "\n- ", "\n•", "\n", ". ", " "]
        .into_iter()
        .map(str::to_owned)
        .collect()
}

/// Configuration for [`RecursiveChunker`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Maximum chunk length in characters.
    pub chunk_size: usize,
    /// Maximum number of trailing characters repeated at the start of the
    /// next chunk.
    pub chunk_overlap: usize,
    /// Split candidates, most-structural first.
    pub separators: Vec<String>,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 900,
            chunk_overlap: 150,
            separators: default_separators(),
        }
    }
}

impl ChunkingConfig {
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    #[must_use]
    pub fn with_chunk_overlap(mut self, chunk_overlap: usize) -> Self {
        self.chunk_overlap = chunk_overlap;
        self
    }

    #[must_use]
    pub fn with_separators(mut self, separators: Vec<String>) -> Self {
        self.separators = separators;
        self
    }

    pub fn validate(&self) -> RagResult<()> {
        if self.chunk_size == 0 {
            return Err(RagError::Config("chunk_size must be at least 1".into()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(RagError::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

/// Byte range of one chunk within the source text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkSpan {
    pub start: usize,
    pub end: usize,
}

/// Splits text on the configured separator ladder and merges the pieces
/// into size-bounded, overlapping chunks.
#[derive(Clone, Debug)]
pub struct RecursiveChunker {
    config: ChunkingConfig,
}

impl RecursiveChunker {
    pub fn new(config: ChunkingConfig) -> RagResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn with_defaults() -> Self {
        Self {
            config: ChunkingConfig::default(),
        }
    }

    pub fn config(&self) -> &ChunkingConfig {
        &self.config
    }

    /// Chunk `text`, returning the chunk strings in document order.
    ///
    /// Empty input yields no chunks.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        self.chunk_spans(text)
            .into_iter()
            .map(|span| text[span.start..span.end].to_owned())
            .collect()
    }

    /// Chunk `text`, returning byte ranges instead of owned strings.
    ///
    /// Spans start at 0, end at `text.len()`, advance monotonically, and
    /// each span begins no earlier than `chunk_overlap` characters before
    /// the previous span's end.
    pub fn chunk_spans(&self, text: &str) -> Vec<ChunkSpan> {
        if text.is_empty() {
            return Vec::new();
        }
        let mut atoms = Vec::new();
        self.split_into_atoms(text, 0, &self.config.separators, &mut atoms);
        self.merge_atoms(atoms)
    }

    /// Recursively split `slice` (at byte offset `base` in the source) into
    /// atoms no longer than `chunk_size` characters, trying `separators` in
    /// order before falling back to a grapheme-boundary hard cut.
    fn split_into_atoms(
        &self,
        slice: &str,
        base: usize,
        separators: &[String],
        atoms: &mut Vec<(Range<usize>, usize)>,
    ) {
        let len = char_len(slice);
        if len <= self.config.chunk_size {
            atoms.push((base..base + slice.len(), len));
            return;
        }
        let Some((index, separator)) = separators
            .iter()
            .enumerate()
            .find(|(_, sep)| slice.contains(sep.as_str()))
        else {
            self.hard_cut(slice, base, atoms);
            return;
        };
        for piece in split_keeping_separator(slice, separator) {
            self.split_into_atoms(
                &slice[piece.clone()],
                base + piece.start,
                &separators[index + 1..],
                atoms,
            );
        }
    }

    /// Cut on grapheme cluster boundaries when no separator applies.
    fn hard_cut(&self, slice: &str, base: usize, atoms: &mut Vec<(Range<usize>, usize)>) {
        let size = self.config.chunk_size;
        let mut start = 0usize;
        let mut count = 0usize;
        for (offset, grapheme) in slice.grapheme_indices(true) {
            let grapheme_len = grapheme.chars().count();
            if count + grapheme_len > size && count > 0 {
                atoms.push((base + start..base + offset, count));
                start = offset;
                count = 0;
            }
            count += grapheme_len;
        }
        if start < slice.len() {
            atoms.push((base + start..base + slice.len(), count));
        }
    }

    /// Greedily pack atoms into chunks, retaining up to `chunk_overlap`
    /// trailing characters of each emitted chunk as the start of the next.
    fn merge_atoms(&self, atoms: Vec<(Range<usize>, usize)>) -> Vec<ChunkSpan> {
        let size = self.config.chunk_size;
        let overlap = self.config.chunk_overlap;
        let mut chunks = Vec::new();
        let mut window: VecDeque<(Range<usize>, usize)> = VecDeque::new();
        let mut window_len = 0usize;

        for (range, atom_len) in atoms {
            if window_len + atom_len > size && !window.is_empty() {
                chunks.push(span_of(&window));
                while window_len > overlap
                    || (!window.is_empty() && window_len + atom_len > size)
                {
                    match window.pop_front() {
                        Some((_, removed_len)) => window_len -= removed_len,
                        None => break,
                    }
                }
            }
            window_len += atom_len;
            window.push_back((range, atom_len));
        }
        if !window.is_empty() {
            chunks.push(span_of(&window));
        }
        chunks
    }
}

fn span_of(window: &VecDeque<(Range<usize>, usize)>) -> ChunkSpan {
    let start = window.front().map(|(r, _)| r.start).unwrap_or(0);
    let end = window.back().map(|(r, _)| r.end).unwrap_or(0);
    ChunkSpan { start, end }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Split at every occurrence of `separator`, with each separator kept
/// attached to the piece that follows it. The returned ranges partition
/// `text` exactly.
fn split_keeping_separator(text: &str, separator: &str) -> Vec<Range<usize>> {
    let mut boundaries = vec![0usize];
    let mut from = 0usize;
    while let Some(pos) = text[from..].find(separator) {
        let abs = from + pos;
        if abs != 0 {
            boundaries.push(abs);
        }
        from = abs + separator.len();
    }
    boundaries.push(text.len());
    boundaries.windows(2).map(|w| w[0]..w[1]).collect()
}
