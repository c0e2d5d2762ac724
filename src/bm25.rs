//! BM25 Okapi ranking over an immutable snapshot of chunks.
//!
//! An [`Index`] is built once from a list of [`Chunk`]s and never mutated
//! afterwards. A new corpus state produces a new index; see
//! [`crate::service::RetrievalService`] for how snapshots are published.
//!
//! Scoring uses
//!
//! ```text
//! idf(t)  = ln(1 + (N - df(t) + 0.5) / (df(t) + 0.5))
//! norm    = 1 - b + b * (dl / avgdl)          (ratio is 1 when avgdl == 0)
//! contrib = idf(t) * tf * (k1 + 1) / max(1e-9, tf + k1 * norm)
//! ```
//!
//! summed over every query term that appears somewhere in the corpus.
//! Query terms are not deduplicated, so repeating a term weighs it again.

use std::{cmp::Ordering, collections::HashMap};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    error::{Error, Result},
    tokenizer::tokenize,
};

/// Default term-frequency saturation parameter.
pub const DEFAULT_K1: f64 = 1.5;

/// Default length normalization parameter.
pub const DEFAULT_B: f64 = 0.75;

/// Floor applied to the BM25 denominator.
const DENOMINATOR_FLOOR: f64 = 1e-9;

/// Default number of results returned by a search.
pub const DEFAULT_TOP_K: usize = 5;

/// BM25 hyperparameters, fixed when an index is built.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bm25Params {
    /// Term-frequency saturation. Higher values let repeated terms keep
    /// adding to the score for longer.
    pub k1: f64,
    /// Length normalization, from 0 (none) to 1 (full).
    pub b: f64,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self {
            k1: DEFAULT_K1,
            b: DEFAULT_B,
        }
    }
}

impl Bm25Params {
    /// Reject parameters that would make scores meaningless.
    pub fn validate(&self) -> Result<()> {
        if !self.k1.is_finite() || self.k1 < 0.0 {
            return Err(Error::Config(format!(
                "bm25 k1 must be a finite, non-negative number (got {})",
                self.k1
            )));
        }
        if !self.b.is_finite() || !(0.0..=1.0).contains(&self.b) {
            return Err(Error::Config(format!(
                "bm25 b must be between 0 and 1 (got {})",
                self.b
            )));
        }
        Ok(())
    }
}

/// An immutable unit of retrievable text.
///
/// Tokens are computed once from the text when the chunk is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    source: String,
    text: String,
    tokens: Vec<String>,
}

impl Chunk {
    pub fn new(source: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        let tokens = tokenize(&text);
        Self {
            source: source.into(),
            text,
            tokens,
        }
    }

    /// Identifier of the originating document.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    fn term_frequencies(&self) -> HashMap<String, u32> {
        let mut tf: HashMap<String, u32> = HashMap::new();
        for token in &self.tokens {
            *tf.entry(token.clone()).or_insert(0) += 1;
        }
        tf
    }
}

/// Summary numbers describing a built index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IndexStats {
    pub chunk_count: usize,
    pub vocabulary_size: usize,
    pub average_chunk_length: f64,
}

/// A BM25 index over a fixed, ordered set of chunks.
///
/// Chunk order is the tie-break for equal scores.
#[derive(Debug, Clone)]
pub struct Index {
    chunks: Vec<Chunk>,
    /// Per-chunk term counts, parallel to `chunks`.
    term_frequencies: Vec<HashMap<String, u32>>,
    document_frequency: HashMap<String, usize>,
    average_chunk_length: f64,
    params: Bm25Params,
}

impl Index {
    /// Build an index over `chunks`.
    ///
    /// Pure and total: an empty chunk list produces a valid index whose
    /// searches return nothing.
    ///
    /// # Examples
    ///
    /// ```
    /// use lexrag::bm25::{Bm25Params, Chunk, Index};
    ///
    /// let index = Index::build(
    ///     vec![
    ///         Chunk::new("a.txt", "hard hats on site"),
    ///         Chunk::new("b.txt", "sign in at reception"),
    ///     ],
    ///     Bm25Params::default(),
    /// );
    /// assert_eq!(index.document_count(), 2);
    /// assert_eq!(index.document_frequency("site"), 1);
    ///
    /// let hits = index.search("hard hats", 1);
    /// assert_eq!(hits[0].1.source(), "a.txt");
    /// ```
    pub fn build(chunks: Vec<Chunk>, params: Bm25Params) -> Self {
        let term_frequencies: Vec<HashMap<String, u32>> =
            chunks.iter().map(Chunk::term_frequencies).collect();

        // Presence, not frequency: each chunk counts once per distinct term.
        let mut document_frequency: HashMap<String, usize> = HashMap::new();
        for tf in &term_frequencies {
            for term in tf.keys() {
                *document_frequency.entry(term.clone()).or_insert(0) += 1;
            }
        }

        let average_chunk_length = if chunks.is_empty() {
            0.0
        } else {
            let total: usize = chunks.iter().map(|c| c.tokens.len()).sum();
            total as f64 / chunks.len() as f64
        };

        debug!(
            chunks = chunks.len(),
            vocabulary = document_frequency.len(),
            average_chunk_length,
            "built bm25 index"
        );

        Self {
            chunks,
            term_frequencies,
            document_frequency,
            average_chunk_length,
            params,
        }
    }

    /// An index with no chunks.
    pub fn empty(params: Bm25Params) -> Self {
        Self::build(Vec::new(), params)
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Number of chunks (N).
    pub fn document_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Number of chunks containing `term` at least once.
    pub fn document_frequency(&self, term: &str) -> usize {
        self.document_frequency.get(term).copied().unwrap_or(0)
    }

    pub fn average_chunk_length(&self) -> f64 {
        self.average_chunk_length
    }

    pub fn params(&self) -> Bm25Params {
        self.params
    }

    pub fn vocabulary_size(&self) -> usize {
        self.document_frequency.len()
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            chunk_count: self.document_count(),
            vocabulary_size: self.vocabulary_size(),
            average_chunk_length: self.average_chunk_length,
        }
    }

    /// Inverse document frequency of `term`, or `None` if the corpus
    /// never mentions it.
    pub fn idf(&self, term: &str) -> Option<f64> {
        let df = *self.document_frequency.get(term)? as f64;
        let n = self.chunks.len() as f64;
        Some((1.0 + (n - df + 0.5) / (df + 0.5)).ln())
    }

    /// Score an arbitrary chunk against already-tokenized query terms,
    /// using this index's corpus statistics.
    pub fn score<S: AsRef<str>>(&self, query_terms: &[S], chunk: &Chunk) -> f64 {
        self.score_with(query_terms, &chunk.term_frequencies(), chunk.tokens.len())
    }

    fn score_with<S: AsRef<str>>(
        &self,
        query_terms: &[S],
        tf: &HashMap<String, u32>,
        token_count: usize,
    ) -> f64 {
        let Bm25Params { k1, b } = self.params;
        let dl = token_count.max(1) as f64;
        let length_ratio = if self.average_chunk_length > 0.0 {
            dl / self.average_chunk_length
        } else {
            1.0
        };
        let length_norm = 1.0 - b + b * length_ratio;

        let mut score = 0.0;
        for term in query_terms {
            let term = term.as_ref();
            let Some(idf) = self.idf(term) else {
                continue;
            };
            let f = tf.get(term).copied().unwrap_or(0) as f64;
            let denominator = (f + k1 * length_norm).max(DENOMINATOR_FLOOR);
            score += idf * (f * (k1 + 1.0)) / denominator;
        }
        score
    }

    /// Rank every chunk against `query` and return the best `max(1, k)`.
    ///
    /// Equal scores keep chunk insertion order. An empty index returns an
    /// empty vector; otherwise at least one entry is returned, even if it
    /// scores zero.
    pub fn search(&self, query: &str, k: usize) -> Vec<(f64, &Chunk)> {
        let query_terms = tokenize(query);

        let mut scored: Vec<(f64, &Chunk)> = self
            .chunks
            .iter()
            .zip(&self.term_frequencies)
            .map(|(chunk, tf)| {
                (self.score_with(&query_terms, tf, chunk.tokens.len()), chunk)
            })
            .collect();

        // `sort_by` is stable, which gives the insertion-order tie-break.
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
        scored.truncate(k.max(1));
        scored
    }
}
