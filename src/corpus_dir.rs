use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Environment variable overriding the corpus directory.
pub const CORPUS_DIR_ENV: &str = "LEXRAG_CORPUS_DIR";

/// Name of the optional settings file inside the corpus directory.
pub const SETTINGS_FILE: &str = "lexrag.json";

#[derive(Debug, Clone)]
pub struct CorpusDir {
    root: PathBuf,
}

impl CorpusDir {
    /// Resolve the corpus directory from, in order of priority:
    /// 1. An explicit path (from --corpus-dir)
    /// 2. The LEXRAG_CORPUS_DIR environment variable
    /// 3. `<base>/corp_docs/txt`, if it exists
    /// 4. The legacy `<base>/txt`
    ///
    /// `<base>` is the current working directory.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        let env = std::env::var_os(CORPUS_DIR_ENV).map(PathBuf::from);
        let base = std::env::current_dir()?;
        Self::resolve_from(explicit, env.as_deref(), &base)
    }

    fn resolve_from(
        explicit: Option<&Path>,
        env: Option<&Path>,
        base: &Path,
    ) -> Result<Self> {
        let root = if let Some(path) = explicit {
            path.to_path_buf()
        } else if let Some(path) = env.filter(|p| !p.as_os_str().is_empty()) {
            path.to_path_buf()
        } else {
            let canonical = base.join("corp_docs").join("txt");
            if canonical.exists() {
                canonical
            } else {
                base.join("txt")
            }
        };

        if root.exists() && !root.is_dir() {
            return Err(Error::CorpusDir(root));
        }

        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn settings_file(&self) -> PathBuf {
        self.root.join(SETTINGS_FILE)
    }
}
