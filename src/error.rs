use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("{kind} not found: {name}")]
    NotFound { kind: &'static str, name: String },

    #[error("corpus directory is not usable: {0}")]
    CorpusDir(PathBuf),

    #[error("retrieval index is not ready")]
    NotReady,

    #[error("reindex failed: {0}")]
    Reindex(String),
}
