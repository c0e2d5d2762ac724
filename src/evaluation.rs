//! Offline retrieval evaluation.
//!
//! A question set is JSON Lines, one object per line:
//!
//! ```text
//! {"id": "ppe-1", "question": "Do I need a hard hat?", "doc_hint": "safety"}
//! ```
//!
//! A question is a hit at `k` when its `doc_hint` occurs (case-insensitive)
//! in the source of any of the top `k` results. Questions without a hint
//! can never hit.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    service::RetrievalService,
};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Question {
    #[serde(default)]
    pub id: Option<String>,
    pub question: String,
    #[serde(default)]
    pub doc_hint: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionResult {
    pub id: String,
    pub hit: bool,
    /// Sources of the retrieved chunks, in rank order.
    pub sources: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvalReport {
    pub k: usize,
    pub total: usize,
    pub hits: usize,
    pub hit_rate: f64,
    pub questions: Vec<QuestionResult>,
}

/// Parse a JSONL question set. Blank lines are skipped; questions without
/// an `id` are numbered `q1`, `q2`, ... in file order.
pub fn parse_questions(contents: &str) -> Result<Vec<Question>> {
    let mut questions = Vec::new();
    for (line_no, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let mut question: Question =
            serde_json::from_str(line).map_err(|e| {
                Error::Config(format!("question file line {}: {e}", line_no + 1))
            })?;
        if question.id.is_none() {
            question.id = Some(format!("q{}", questions.len() + 1));
        }
        questions.push(question);
    }
    Ok(questions)
}

pub fn load_questions(path: &Path) -> Result<Vec<Question>> {
    if !path.is_file() {
        return Err(Error::NotFound {
            kind: "question file",
            name: path.display().to_string(),
        });
    }
    parse_questions(&std::fs::read_to_string(path)?)
}

fn is_hit(doc_hint: Option<&str>, sources: &[String]) -> bool {
    let Some(hint) = doc_hint.map(str::to_lowercase).filter(|h| !h.is_empty())
    else {
        return false;
    };
    sources.iter().any(|s| s.to_lowercase().contains(&hint))
}

/// Run every question against the service and tally hits at `k`.
pub fn evaluate(
    service: &RetrievalService,
    questions: &[Question],
    k: usize,
) -> Result<EvalReport> {
    let mut results = Vec::with_capacity(questions.len());
    for question in questions {
        let sources: Vec<String> = service
            .query(&question.question, k)?
            .into_iter()
            .map(|h| h.source)
            .collect();
        results.push(QuestionResult {
            id: question.id.clone().unwrap_or_default(),
            hit: is_hit(question.doc_hint.as_deref(), &sources),
            sources,
        });
    }

    let hits = results.iter().filter(|r| r.hit).count();
    let total = results.len();
    let hit_rate = if total == 0 {
        0.0
    } else {
        hits as f64 / total as f64
    };

    Ok(EvalReport {
        k,
        total,
        hits,
        hit_rate,
        questions: results,
    })
}

/// Render a report for the terminal.
pub fn render_report(report: &EvalReport) -> String {
    let mut out = String::new();
    for q in &report.questions {
        let mark = if q.hit { "hit " } else { "miss" };
        out.push_str(&format!("{mark}  {}  {}\n", q.id, q.sources.join(", ")));
    }
    out.push_str(&format!(
        "\nRetrieval hit@{}: {}/{} = {:.2}\n",
        report.k, report.hits, report.total, report.hit_rate
    ));
    out
}
