//! Lifecycle of the published retrieval index.
//!
//! The service owns at most one current [`Snapshot`]. Readers clone an
//! `Arc` to it under a short read lock and then search without holding any
//! lock, so a reindex never blocks or disturbs a query in flight. A reindex
//! builds the replacement index entirely on the side and publishes it with
//! a single pointer swap. Reindexes are serialized; a second request waits
//! for the first to finish.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tracing::{info, warn};

use crate::{
    bm25::{Chunk, Index, IndexStats},
    config::Settings,
    corpus::CorpusLoader,
    error::{Error, Result},
    search::SearchHit,
};

/// An immutable, published index together with its bookkeeping.
#[derive(Debug)]
pub struct Snapshot {
    /// Increments on every publish, starting at 1.
    pub generation: u64,
    /// Number of source documents the index was built from.
    pub document_count: usize,
    pub index: Index,
}

/// Result of a [`RetrievalService::reindex`] call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReindexOutcome {
    Reindexed {
        generation: u64,
        document_count: usize,
        chunk_count: usize,
    },
    Failed {
        reason: String,
    },
}

impl ReindexOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Reindexed { .. })
    }

    pub fn into_result(self) -> Result<Self> {
        match self {
            Self::Failed { reason } => Err(Error::Reindex(reason)),
            ok => Ok(ok),
        }
    }
}

/// Point-in-time view of the service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceStatus {
    pub ready: bool,
    pub generation: u64,
    pub document_count: usize,
    pub chunk_count: usize,
    pub vocabulary_size: usize,
    pub average_chunk_length: f64,
}

pub struct RetrievalService {
    loader: Box<dyn CorpusLoader>,
    settings: Settings,
    current: RwLock<Option<Arc<Snapshot>>>,
    writer: Mutex<()>,
}

impl std::fmt::Debug for RetrievalService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrievalService")
            .field("settings", &self.settings)
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

impl RetrievalService {
    pub fn new(loader: impl CorpusLoader + 'static, settings: Settings) -> Self {
        Self {
            loader: Box::new(loader),
            settings,
            current: RwLock::new(None),
            writer: Mutex::new(()),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Load, chunk and index the corpus, then publish the result.
    ///
    /// An empty corpus is a successful start with an empty index.
    pub fn start(&self) -> Result<IndexStats> {
        let _writer = self.writer.lock();
        let (index, document_count) = self.build()?;
        let stats = index.stats();
        let generation = self.publish(index, document_count);
        info!(
            generation,
            documents = document_count,
            chunks = stats.chunk_count,
            "retrieval index ready"
        );
        Ok(stats)
    }

    /// Search the current index.
    ///
    /// Returns [`Error::NotReady`] until an index has been published.
    pub fn query(&self, text: &str, k: usize) -> Result<Vec<SearchHit>> {
        let snapshot = self.snapshot().ok_or(Error::NotReady)?;
        Ok(snapshot
            .index
            .search(text, k)
            .into_iter()
            .enumerate()
            .map(|(i, (score, chunk))| SearchHit::new(i + 1, score, chunk))
            .collect())
    }

    /// Rebuild the index from the loader and swap it in.
    ///
    /// On failure the previously published index stays current.
    pub fn reindex(&self) -> ReindexOutcome {
        let _writer = self.writer.lock();
        match self.build() {
            Ok((index, document_count)) => {
                let chunk_count = index.document_count();
                let generation = self.publish(index, document_count);
                info!(
                    generation,
                    documents = document_count,
                    chunks = chunk_count,
                    "reindexed"
                );
                ReindexOutcome::Reindexed {
                    generation,
                    document_count,
                    chunk_count,
                }
            }
            Err(e) => {
                warn!(error = %e, "reindex failed, keeping previous index");
                ReindexOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// The currently published snapshot, if any.
    pub fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.current.read().clone()
    }

    pub fn is_ready(&self) -> bool {
        self.current.read().is_some()
    }

    pub fn status(&self) -> ServiceStatus {
        match self.snapshot() {
            Some(snapshot) => {
                let stats = snapshot.index.stats();
                ServiceStatus {
                    ready: true,
                    generation: snapshot.generation,
                    document_count: snapshot.document_count,
                    chunk_count: stats.chunk_count,
                    vocabulary_size: stats.vocabulary_size,
                    average_chunk_length: stats.average_chunk_length,
                }
            }
            None => ServiceStatus {
                ready: false,
                generation: 0,
                document_count: 0,
                chunk_count: 0,
                vocabulary_size: 0,
                average_chunk_length: 0.0,
            },
        }
    }

    fn build(&self) -> Result<(Index, usize)> {
        let documents = self.loader.load()?;
        let chunks: Vec<Chunk> = documents
            .iter()
            .flat_map(|doc| {
                self.settings
                    .chunking
                    .chunk(&doc.text)
                    .into_iter()
                    .map(move |text| Chunk::new(doc.source.clone(), text))
            })
            .collect();
        Ok((Index::build(chunks, self.settings.bm25), documents.len()))
    }

    fn publish(&self, index: Index, document_count: usize) -> u64 {
        let mut current = self.current.write();
        let generation = current.as_ref().map_or(1, |s| s.generation + 1);
        let previous = current.replace(Arc::new(Snapshot {
            generation,
            document_count,
            index,
        }));
        drop(current);
        // The old index may be large; free it after releasing the lock.
        drop(previous);
        generation
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;
    use crate::corpus::{SourceDocument, StaticLoader};

    fn hard_hats_service() -> RetrievalService {
        RetrievalService::new(
            StaticLoader::new(vec![
                SourceDocument::new(
                    "policy.txt",
                    "Macrocomm policy requires hard hats on site.",
                ),
                SourceDocument::new(
                    "visitors.txt",
                    "Visitors must sign in at reception.",
                ),
            ]),
            Settings::default(),
        )
    }

    /// Serves a document list, or fails while `broken` is set.
    struct FlakyLoader {
        broken: Arc<AtomicBool>,
        documents: Vec<SourceDocument>,
    }

    impl CorpusLoader for FlakyLoader {
        fn load(&self) -> Result<Vec<SourceDocument>> {
            if self.broken.load(Ordering::SeqCst) {
                return Err(Error::Io(std::io::Error::other("disk on fire")));
            }
            Ok(self.documents.clone())
        }
    }

    #[test]
    fn query_before_start_is_not_ready() {
        let service = hard_hats_service();
        assert!(!service.is_ready());
        assert!(matches!(service.query("hats", 5), Err(Error::NotReady)));
        assert!(!service.status().ready);
    }

    #[test]
    fn start_then_query() {
        let service = hard_hats_service();
        let stats = service.start().unwrap();
        assert_eq!(stats.chunk_count, 2);

        let hits = service.query("hard hats", 1).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].rank, 1);
        assert_eq!(hits[0].source, "policy.txt");
        assert_eq!(
            hits[0].text,
            "Macrocomm policy requires hard hats on site."
        );
        assert!(hits[0].score > 0.0);
    }

    #[test]
    fn second_document_scores_zero_for_unrelated_query() {
        let service = hard_hats_service();
        service.start().unwrap();
        let hits = service.query("hard hats", 5).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[1].source, "visitors.txt");
        assert_eq!(hits[1].score, 0.0);
        assert_eq!(hits[1].rank, 2);
    }

    #[test]
    fn empty_corpus_is_ready_but_empty() {
        let service =
            RetrievalService::new(StaticLoader::default(), Settings::default());
        let stats = service.start().unwrap();
        assert_eq!(stats.chunk_count, 0);
        assert!(service.is_ready());
        assert!(service.query("anything", 5).unwrap().is_empty());
    }

    #[test]
    fn start_failure_leaves_service_not_ready() {
        let service = RetrievalService::new(
            FlakyLoader {
                broken: Arc::new(AtomicBool::new(true)),
                documents: vec![],
            },
            Settings::default(),
        );
        assert!(service.start().is_err());
        assert!(matches!(service.query("x", 1), Err(Error::NotReady)));
    }

    #[test]
    fn failed_reindex_keeps_previous_index() {
        let broken = Arc::new(AtomicBool::new(false));
        let service = RetrievalService::new(
            FlakyLoader {
                broken: broken.clone(),
                documents: vec![SourceDocument::new("a.txt", "gloves required")],
            },
            Settings::default(),
        );
        service.start().unwrap();
        let before = service.snapshot().unwrap();

        broken.store(true, Ordering::SeqCst);
        let outcome = service.reindex();
        assert!(!outcome.is_success());
        match &outcome {
            ReindexOutcome::Failed { reason } => {
                assert!(reason.contains("disk on fire"))
            }
            other => panic!("expected failure, got {other:?}"),
        }
        assert!(matches!(outcome.into_result(), Err(Error::Reindex(_))));

        let after = service.snapshot().unwrap();
        assert!(Arc::ptr_eq(&before, &after));
        assert_eq!(service.query("gloves", 1).unwrap()[0].source, "a.txt");
    }

    #[test]
    fn reindex_publishes_new_generation() {
        let service = hard_hats_service();
        service.start().unwrap();
        assert_eq!(service.status().generation, 1);

        let outcome = service.reindex();
        assert_eq!(outcome, ReindexOutcome::Reindexed {
            generation: 2,
            document_count: 2,
            chunk_count: 2,
        });
        assert_eq!(service.status().generation, 2);
    }

    #[test]
    fn reindex_before_start_publishes() {
        let service = hard_hats_service();
        assert!(service.reindex().is_success());
        assert!(service.is_ready());
    }

    #[test]
    fn old_snapshot_survives_swap() {
        let service = hard_hats_service();
        service.start().unwrap();
        let held = service.snapshot().unwrap();
        service.reindex();
        assert_eq!(held.generation, 1);
        assert_eq!(held.index.document_count(), 2);
        assert_eq!(service.snapshot().unwrap().generation, 2);
    }

    #[test]
    fn status_reports_index_stats() {
        let service = hard_hats_service();
        service.start().unwrap();
        let status = service.status();
        assert!(status.ready);
        assert_eq!(status.document_count, 2);
        assert_eq!(status.chunk_count, 2);
        assert!(status.vocabulary_size > 0);
        assert!(status.average_chunk_length > 0.0);
    }

    #[test]
    fn long_documents_are_chunked_with_settings() {
        let text = (0..10)
            .map(|i| format!("paragraph {i} about ladders and scaffolding"))
            .collect::<Vec<_>>()
            .join("\n\n");
        let mut settings = Settings::default();
        settings.chunking.max_chars = 100;
        settings.chunking.overlap = 20;
        let service = RetrievalService::new(
            StaticLoader::new(vec![SourceDocument::new("long.txt", text)]),
            settings,
        );
        let stats = service.start().unwrap();
        assert!(stats.chunk_count > 1);
        assert!(
            service
                .query("ladders", 50)
                .unwrap()
                .iter()
                .all(|h| h.source == "long.txt")
        );
    }
}
