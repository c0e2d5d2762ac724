//! lexrag - in-memory lexical retrieval over a corpus of plain-text documents.
//!
//! Documents are split into overlapping, paragraph-respecting chunks and
//! ranked with BM25. The index lives only in memory; it is rebuilt from
//! the source text on start and on every reindex, and published as an
//! immutable snapshot so queries never observe a half-built index.
//!
//! # Quick start
//!
//! ```
//! use lexrag::{RetrievalService, Settings};
//! use lexrag::corpus::{SourceDocument, StaticLoader};
//!
//! let service = RetrievalService::new(
//!     StaticLoader::new(vec![
//!         SourceDocument::new("policy.txt", "Macrocomm policy requires hard hats on site."),
//!         SourceDocument::new("visitors.txt", "Visitors must sign in at reception."),
//!     ]),
//!     Settings::default(),
//! );
//! service.start().unwrap();
//!
//! let hits = service.query("hard hats", 1).unwrap();
//! assert_eq!(hits[0].source, "policy.txt");
//! assert!(hits[0].score > 0.0);
//! ```

pub mod bm25;
pub mod chunking;
pub mod cli;
pub mod config;
pub mod corpus;
pub mod corpus_dir;
pub mod error;
pub mod evaluation;
pub mod search;
pub mod service;
pub mod shell;
pub mod text_util;
pub mod tokenizer;

pub use bm25::{Bm25Params, Chunk, Index};
pub use config::Settings;
pub use corpus::{CorpusLoader, SourceDocument, TxtDirLoader};
pub use corpus_dir::CorpusDir;
pub use error::{Error, Result};
pub use search::SearchHit;
pub use service::{ReindexOutcome, RetrievalService};
