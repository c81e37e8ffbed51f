//! Section-aware text chunking.
//!
//! Text is first cut at procurement section headings, noise pieces are
//! dropped, and every surviving section is split recursively into
//! overlapping windows that prefer paragraph, line and word boundaries.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::LazyLock;

pub const DEFAULT_CHUNK_SIZE: usize = 1500;
pub const DEFAULT_CHUNK_OVERLAP: usize = 100;

/// Sections shorter than this are treated as noise.
const MIN_SECTION_CHARS: usize = 100;

/// Boundaries tried in order; the empty separator is the hard character cut.
const SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

static SECTION_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(SECTION\s+\d+|SCOPE|SPECIFICATION|TERMS|ADDENDUM|REQUIREMENTS)")
        .expect("section heading pattern is valid")
});

/// An ordered slice of one document's normalized text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
}

impl Chunk {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Splits document text into bounded, overlapping chunks.
#[derive(Debug, Clone, Copy)]
pub struct Chunker {
    chunk_size: usize,
    overlap: usize,
}

impl Default for Chunker {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE, DEFAULT_CHUNK_OVERLAP)
    }
}

impl Chunker {
    /// `overlap` is clamped below `chunk_size`; a zero size is raised to one.
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            overlap: overlap.min(chunk_size - 1),
        }
    }

    pub fn chunk(&self, text: &str) -> Vec<Chunk> {
        let mut sections: Vec<&str> = split_sections(text)
            .into_iter()
            .map(str::trim)
            .filter(|s| s.chars().count() >= MIN_SECTION_CHARS)
            .collect();

        // A short document has no piece above the noise floor; keep it whole
        if sections.is_empty() && !text.trim().is_empty() {
            sections.push(text.trim());
        }

        sections
            .into_iter()
            .flat_map(|s| self.split_recursive(s, &SEPARATORS))
            .map(Chunk::new)
            .collect()
    }

    fn split_recursive(&self, text: &str, separators: &[&str]) -> Vec<String> {
        let (idx, separator) = separators
            .iter()
            .enumerate()
            .find(|(_, sep)| sep.is_empty() || text.contains(**sep))
            .map(|(i, sep)| (i, *sep))
            .unwrap_or((separators.len().saturating_sub(1), ""));
        let remaining = &separators[(idx + 1).min(separators.len())..];

        let splits: Vec<String> = if separator.is_empty() {
            text.chars().map(String::from).collect()
        } else {
            text.split(separator)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        };

        let mut chunks = Vec::new();
        let mut good: Vec<String> = Vec::new();

        for piece in splits {
            if char_len(&piece) < self.chunk_size {
                good.push(piece);
                continue;
            }
            if !good.is_empty() {
                chunks.extend(self.merge_splits(&good, separator));
                good.clear();
            }
            if remaining.is_empty() {
                chunks.push(piece);
            } else {
                chunks.extend(self.split_recursive(&piece, remaining));
            }
        }

        if !good.is_empty() {
            chunks.extend(self.merge_splits(&good, separator));
        }

        chunks
    }

    /// Greedily pack pieces into windows, carrying up to `overlap` chars forward.
    fn merge_splits(&self, pieces: &[String], separator: &str) -> Vec<String> {
        let sep_len = char_len(separator);
        let mut docs = Vec::new();
        let mut current: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for piece in pieces {
            let len = char_len(piece);

            if total + len + joiner(&current, sep_len) > self.chunk_size && !current.is_empty() {
                push_joined(&mut docs, &current, separator);

                while total > self.overlap
                    || (total > 0 && total + len + joiner(&current, sep_len) > self.chunk_size)
                {
                    let Some(front) = current.pop_front() else {
                        break;
                    };
                    total -= char_len(front) + joiner(&current, sep_len);
                }
            }

            total += len + joiner(&current, sep_len);
            current.push_back(piece);
        }

        push_joined(&mut docs, &current, separator);
        docs
    }
}

fn joiner(current: &VecDeque<&str>, sep_len: usize) -> usize {
    if current.is_empty() {
        0
    } else {
        sep_len
    }
}

fn push_joined(docs: &mut Vec<String>, current: &VecDeque<&str>, separator: &str) {
    let joined = current.iter().copied().collect::<Vec<_>>().join(separator);
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        docs.push(trimmed.to_string());
    }
}

/// Split at headings, keeping each heading as its own piece.
fn split_sections(text: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut last = 0;
    for m in SECTION_HEADING.find_iter(text) {
        pieces.push(&text[last..m.start()]);
        pieces.push(m.as_str());
        last = m.end();
    }
    pieces.push(&text[last..]);
    pieces
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Convenience wrapper using explicit parameters.
#[cfg(test)]
pub fn chunk(text: &str, chunk_size: usize, overlap: usize) -> Vec<Chunk> {
    Chunker::new(chunk_size, overlap).chunk(text)
}
