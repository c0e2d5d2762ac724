//! Corpus loading.
//!
//! [`TxtDirLoader`] differs from a plain `*.txt` glob in two ways: files
//! whose names start with `.` are ignored like any other hidden file, and
//! byte sequences that are not valid UTF-8 are dropped rather than
//! replaced, so a stray byte inside a word does not split it.

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::error::Result;

/// A loaded source document, before chunking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    /// Identifier of the document (the file name for on-disk corpora).
    pub source: String,
    /// Full, trimmed document text. Never empty.
    pub text: String,
}

impl SourceDocument {
    pub fn new(source: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            text: text.into(),
        }
    }
}

/// Supplies the documents an index is built from.
///
/// Implementations skip individual bad documents rather than failing; an
/// `Err` means the corpus as a whole could not be read.
pub trait CorpusLoader: Send + Sync {
    fn load(&self) -> Result<Vec<SourceDocument>>;
}

/// File extension of corpus documents.
const SUPPORTED_EXTENSION: &str = "txt";

/// Loads every `*.txt` file directly inside a directory.
///
/// Subdirectories and hidden files are ignored. Documents come back sorted
/// by file name.
#[derive(Debug, Clone)]
pub struct TxtDirLoader {
    dir: PathBuf,
}

impl TxtDirLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl CorpusLoader for TxtDirLoader {
    fn load(&self) -> Result<Vec<SourceDocument>> {
        if !self.dir.exists() {
            warn!(dir = %self.dir.display(), "corpus directory does not exist");
            return Ok(Vec::new());
        }

        let mut files = discover_txt_files(&self.dir)?;
        files.sort();

        let documents = read_documents(&files);
        debug!(
            dir = %self.dir.display(),
            files = files.len(),
            documents = documents.len(),
            "loaded corpus"
        );
        Ok(documents)
    }
}

/// A fixed, in-memory corpus.
#[derive(Debug, Clone, Default)]
pub struct StaticLoader {
    documents: Vec<SourceDocument>,
}

impl StaticLoader {
    pub fn new(documents: Vec<SourceDocument>) -> Self {
        Self { documents }
    }
}

impl CorpusLoader for StaticLoader {
    fn load(&self) -> Result<Vec<SourceDocument>> {
        Ok(self
            .documents
            .iter()
            .filter(|d| !d.text.trim().is_empty())
            .cloned()
            .collect())
    }
}

fn discover_txt_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        if name.to_string_lossy().starts_with('.') {
            continue;
        }
        let path = entry.path();
        if path.is_file() && is_supported(&path) {
            files.push(path);
        }
    }
    Ok(files)
}

fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext == SUPPORTED_EXTENSION)
}

/// Read `files` in parallel, keeping their order and skipping any that
/// cannot be read or hold no text.
fn read_documents(files: &[PathBuf]) -> Vec<SourceDocument> {
    let loaded: Vec<Option<SourceDocument>> =
        files.par_iter().map(|path| read_document(path)).collect();
    loaded.into_iter().flatten().collect()
}

/// Read one file, or `None` if it is unreadable or has no text.
fn read_document(path: &Path) -> Option<SourceDocument> {
    let bytes = match std::fs::read(path) {
        Ok(b) => b,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "skipping unreadable file");
            return None;
        }
    };
    let text = decode_dropping_invalid(&bytes).trim().to_string();
    if text.is_empty() {
        debug!(path = %path.display(), "skipping empty file");
        return None;
    }
    let source = path.file_name()?.to_string_lossy().into_owned();
    Some(SourceDocument { source, text })
}

/// Decode UTF-8, dropping byte sequences that are not valid.
pub fn decode_dropping_invalid(bytes: &[u8]) -> String {
    bytes.utf8_chunks().map(|chunk| chunk.valid()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_txt_files_sorted() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("zeta.txt"), "last").unwrap();
        std::fs::write(tmp.path().join("alpha.txt"), "  first  \n").unwrap();
        std::fs::write(tmp.path().join("notes.md"), "ignored").unwrap();

        let docs = TxtDirLoader::new(tmp.path()).load().unwrap();
        assert_eq!(docs, vec![
            SourceDocument::new("alpha.txt", "first"),
            SourceDocument::new("zeta.txt", "last"),
        ]);
    }

    #[test]
    fn skips_empty_and_hidden_files() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("blank.txt"), " \n\t\n").unwrap();
        std::fs::write(tmp.path().join(".hidden.txt"), "secret").unwrap();
        std::fs::write(tmp.path().join("real.txt"), "content").unwrap();

        let docs = TxtDirLoader::new(tmp.path()).load().unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].source, "real.txt");
    }

    #[test]
    fn does_not_recurse() {
        let tmp = tempfile::tempdir().unwrap();
        let sub = tmp.path().join("nested.txt");
        std::fs::create_dir(&sub).unwrap();
        std::fs::write(sub.join("deep.txt"), "deep").unwrap();
        std::fs::write(tmp.path().join("top.txt"), "top").unwrap();

        let docs = TxtDirLoader::new(tmp.path()).load().unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].source, "top.txt");
    }

    #[test]
    fn invalid_utf8_bytes_are_dropped() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("bin.txt"), b"ok \xff\xfe text").unwrap();
        std::fs::write(tmp.path().join("word.txt"), b"hard\xffhats").unwrap();

        let docs = TxtDirLoader::new(tmp.path()).load().unwrap();
        assert_eq!(docs, vec![
            SourceDocument::new("bin.txt", "ok  text"),
            SourceDocument::new("word.txt", "hardhats"),
        ]);
        assert_eq!(crate::tokenizer::tokenize(&docs[1].text), vec!["hardhats"]);
    }

    #[test]
    fn decode_keeps_valid_multibyte_text() {
        assert_eq!(decode_dropping_invalid("café ☕".as_bytes()), "café ☕");
        assert_eq!(decode_dropping_invalid(b"\xc3"), "");
    }

    #[test]
    fn unreadable_file_is_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(read_document(&tmp.path().join("gone.txt")).is_none());
    }

    #[test]
    fn unreadable_file_does_not_drop_its_neighbours() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("a.txt"), "first").unwrap();
        std::fs::write(tmp.path().join("c.txt"), "third").unwrap();
        // Listed, then removed before it could be read.
        let files = vec![
            tmp.path().join("a.txt"),
            tmp.path().join("b.txt"),
            tmp.path().join("c.txt"),
        ];

        assert_eq!(read_documents(&files), vec![
            SourceDocument::new("a.txt", "first"),
            SourceDocument::new("c.txt", "third"),
        ]);
    }

    #[test]
    fn missing_directory_is_an_empty_corpus() {
        let tmp = tempfile::tempdir().unwrap();
        let docs = TxtDirLoader::new(tmp.path().join("absent")).load().unwrap();
        assert!(docs.is_empty());
    }

    #[test]
    fn path_that_is_a_file_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("plain.txt");
        std::fs::write(&file, "x").unwrap();
        assert!(TxtDirLoader::new(&file).load().is_err());
    }

    #[test]
    fn static_loader_filters_blank_documents() {
        let loader = StaticLoader::new(vec![
            SourceDocument::new("a", "text"),
            SourceDocument::new("b", "   "),
        ]);
        let docs = loader.load().unwrap();
        assert_eq!(docs, vec![SourceDocument::new("a", "text")]);
    }
}
