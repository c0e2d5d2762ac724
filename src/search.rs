use serde::Serialize;

use crate::{
    bm25::Chunk,
    text_util::{self, DEFAULT_PREVIEW_CHARS},
};

/// One ranked retrieval result.
///
/// `text` is the full matched chunk; truncation is left to the output
/// formatters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    /// 1-indexed position in the result list.
    pub rank: usize,
    /// Non-negative BM25 relevance, unbounded above.
    pub score: f64,
    pub source: String,
    pub text: String,
}

impl SearchHit {
    pub fn new(rank: usize, score: f64, chunk: &Chunk) -> Self {
        Self {
            rank,
            score,
            source: chunk.source().to_string(),
            text: chunk.text().to_string(),
        }
    }
}

/// Output shape for a single result in JSON mode.
#[derive(Debug, Serialize)]
pub struct HitView<'a> {
    pub rank: usize,
    pub score: f64,
    pub source: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<&'a str>,
}

impl<'a> HitView<'a> {
    /// Rounded score plus either a preview or the full chunk text.
    pub fn new(hit: &'a SearchHit, full: bool) -> Self {
        Self {
            rank: hit.rank,
            score: text_util::round_score(hit.score),
            source: &hit.source,
            preview: (!full)
                .then(|| text_util::preview(&hit.text, DEFAULT_PREVIEW_CHARS)),
            text: full.then_some(hit.text.as_str()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SearchResponse<'a> {
    pub query: &'a str,
    pub k: usize,
    pub result_count: usize,
    pub results: Vec<HitView<'a>>,
}

impl<'a> SearchResponse<'a> {
    pub fn new(query: &'a str, k: usize, hits: &'a [SearchHit], full: bool) -> Self {
        Self {
            query,
            k,
            result_count: hits.len(),
            results: hits.iter().map(|h| HitView::new(h, full)).collect(),
        }
    }
}

/// Render results for human-readable terminal output.
pub fn render_human(hits: &[SearchHit], full: bool) -> String {
    if hits.is_empty() {
        return "No results found.\n".to_string();
    }

    let mut out = String::new();
    for hit in hits {
        out.push_str(&format!(
            "{:>3}. [{:.4}] {}\n",
            hit.rank, hit.score, hit.source
        ));
        if full {
            for line in hit.text.lines() {
                out.push_str(&format!("     {line}\n"));
            }
        } else {
            let line = text_util::single_line(&hit.text);
            out.push_str(&format!(
                "     {}\n",
                text_util::preview(&line, DEFAULT_PREVIEW_CHARS)
            ));
        }
    }
    out.push_str(&format!("\n{} result(s)\n", hits.len()));
    out
}

/// Format results for human-readable terminal output.
pub fn format_human(hits: &[SearchHit], full: bool) {
    print!("{}", render_human(hits, full));
}

/// Format results as JSON output.
pub fn format_json(
    hits: &[SearchHit],
    query: &str,
    k: usize,
    full: bool,
) -> crate::error::Result<()> {
    let response = SearchResponse::new(query, k, hits, full);
    println!("{}", serde_json::to_string(&response)?);
    Ok(())
}
