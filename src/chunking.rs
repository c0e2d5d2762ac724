//! Paragraph-aware chunking with character overlap.
//!
//! A document is split on blank lines into paragraphs, which are packed
//! greedily into chunks of at most `max_chars` characters. When a
//! paragraph does not fit, the current chunk is closed and the next one is
//! seeded with the last `overlap` characters of the chunk just closed, so
//! that terms straddling a boundary remain retrievable together.
//!
//! Lengths are measured in Unicode scalar values, not bytes.
//!
//! The overlap seed counts towards the new chunk's length but is never
//! dropped to make room, so a seeded chunk can end up over `max_chars`.
//!
//! The overlap seed only ever comes from the immediately preceding chunk.
//! A run of oversized paragraphs therefore carries context one boundary
//! back and no further.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Default maximum chunk size in characters.
pub const DEFAULT_MAX_CHARS: usize = 1200;

/// Default overlap between consecutive chunks in characters.
pub const DEFAULT_OVERLAP: usize = 200;

/// Separator placed between paragraphs inside a chunk.
const PARAGRAPH_SEPARATOR: &str = "\n\n";

/// Character cost charged for each separator when packing paragraphs.
const SEPARATOR_CHARS: usize = 2;

static BLANK_LINES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\n\s*\n").expect("blank line pattern is valid")
});

/// Chunking parameters.
///
/// # Examples
///
/// ```
/// use lexrag::chunking::{ChunkingConfig, DEFAULT_MAX_CHARS, DEFAULT_OVERLAP};
///
/// let config = ChunkingConfig::default();
/// assert_eq!(config.max_chars, DEFAULT_MAX_CHARS);
/// assert_eq!(config.overlap, DEFAULT_OVERLAP);
/// assert_eq!(config.chunk("one\n\ntwo"), vec!["one\n\ntwo".to_string()]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Soft upper bound on chunk length in characters.
    pub max_chars: usize,
    /// Characters carried over from the previous chunk.
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chars: DEFAULT_MAX_CHARS,
            overlap: DEFAULT_OVERLAP,
        }
    }
}

impl ChunkingConfig {
    /// Chunk `text` with these settings.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        chunk_text(text, self.max_chars, self.overlap)
    }
}

/// Split text into trimmed, non-empty paragraphs separated by blank lines.
pub fn split_paragraphs(text: &str) -> Vec<&str> {
    BLANK_LINES
        .split(text)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

/// Split text into overlapping, paragraph-respecting chunks.
///
/// Paragraphs are never cut, so a chunk exceeds `max_chars` in two cases:
/// it holds a single paragraph longer than `max_chars`, or it is an
/// overlap tail plus one paragraph where `tail + 2 + paragraph` is over
/// the limit. The second case happens even for short paragraphs when
/// `overlap` is close to `max_chars`. Empty or whitespace-only input
/// yields no chunks.
///
/// # Examples
///
/// ```
/// use lexrag::chunking::chunk_text;
///
/// // Short text returns a single chunk
/// let chunks = chunk_text("Hello, world!", 1200, 200);
/// assert_eq!(chunks, vec!["Hello, world!".to_string()]);
///
/// // Paragraphs that do not fit start a new, overlap-seeded chunk
/// let chunks = chunk_text("aaaa\n\nbbbb", 8, 2);
/// assert_eq!(chunks, vec!["aaaa".to_string(), "aa\n\nbbbb".to_string()]);
/// ```
pub fn chunk_text(text: &str, max_chars: usize, overlap: usize) -> Vec<String> {
    let mut chunks: Vec<String> = Vec::new();
    let mut buffer: Vec<String> = Vec::new();
    let mut buffer_len = 0;

    for paragraph in split_paragraphs(text) {
        let paragraph_len = paragraph.chars().count();

        if buffer_len + paragraph_len + SEPARATOR_CHARS <= max_chars {
            buffer.push(paragraph.to_string());
            buffer_len += paragraph_len + SEPARATOR_CHARS;
            continue;
        }

        if !buffer.is_empty() {
            chunks.push(buffer.join(PARAGRAPH_SEPARATOR));
        }

        match chunks.last() {
            Some(previous) if overlap > 0 => {
                let tail = char_tail(previous, overlap).to_string();
                buffer_len =
                    tail.chars().count() + SEPARATOR_CHARS + paragraph_len;
                buffer = vec![tail, paragraph.to_string()];
            }
            _ => {
                buffer = vec![paragraph.to_string()];
                buffer_len = paragraph_len;
            }
        }
    }

    if !buffer.is_empty() {
        chunks.push(buffer.join(PARAGRAPH_SEPARATOR));
    }

    chunks
}

/// Return the last `n` characters of `s` (all of `s` if it is shorter).
pub fn char_tail(s: &str, n: usize) -> &str {
    let skip = s.chars().count().saturating_sub(n);
    match s.char_indices().nth(skip) {
        Some((byte_idx, _)) => &s[byte_idx..],
        None => "",
    }
}
