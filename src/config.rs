//! Engine settings.
//!
//! Settings come from an optional JSON file; every field has a default, so
//! a partial file (or none at all) is fine:
//!
//! ```json
//! { "chunking": { "max_chars": 800 }, "bm25": { "k1": 1.2 } }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    bm25::Bm25Params,
    chunking::ChunkingConfig,
    error::{Error, Result},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub chunking: ChunkingConfig,
    pub bm25: Bm25Params,
}

impl Settings {
    /// Parse and validate settings from a JSON string.
    ///
    /// # Examples
    ///
    /// ```
    /// use lexrag::config::Settings;
    ///
    /// let settings = Settings::from_json(r#"{"bm25": {"b": 0.5}}"#).unwrap();
    /// assert_eq!(settings.bm25.b, 0.5);
    /// assert_eq!(settings.bm25.k1, 1.5);
    /// assert_eq!(settings.chunking.max_chars, 1200);
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Settings = serde_json::from_str(json)
            .map_err(|e| Error::Config(format!("invalid settings: {e}")))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from `path`. A missing file is an error.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json(&contents)
    }

    /// Resolve settings: the explicit file if given, else `fallback` if it
    /// exists, else defaults.
    pub fn resolve(explicit: Option<&Path>, fallback: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        if fallback.is_file() {
            debug!(path = %fallback.display(), "loading settings");
            return Self::from_file(fallback);
        }
        Ok(Self::default())
    }

    pub fn validate(&self) -> Result<()> {
        self.bm25.validate()?;
        if self.chunking.max_chars == 0 {
            return Err(Error::Config(
                "chunking max_chars must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{bm25, chunking};

    #[test]
    fn defaults() {
        let settings = Settings::default();
        assert_eq!(settings.chunking.max_chars, chunking::DEFAULT_MAX_CHARS);
        assert_eq!(settings.chunking.overlap, chunking::DEFAULT_OVERLAP);
        assert_eq!(settings.bm25.k1, bm25::DEFAULT_K1);
        assert_eq!(settings.bm25.b, bm25::DEFAULT_B);
    }

    #[test]
    fn partial_json_keeps_other_defaults() {
        let settings =
            Settings::from_json(r#"{"chunking": {"overlap": 0}}"#).unwrap();
        assert_eq!(settings.chunking.overlap, 0);
        assert_eq!(settings.chunking.max_chars, chunking::DEFAULT_MAX_CHARS);
        assert_eq!(settings.bm25, Bm25Params::default());
    }

    #[test]
    fn rejects_unknown_sections() {
        assert!(matches!(
            Settings::from_json(r#"{"embedding": {}}"#),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn rejects_out_of_range_params() {
        assert!(Settings::from_json(r#"{"bm25": {"b": 2.0}}"#).is_err());
        assert!(
            Settings::from_json(r#"{"chunking": {"max_chars": 0}}"#).is_err()
        );
    }

    #[test]
    fn resolve_prefers_explicit_file() {
        let tmp = tempfile::tempdir().unwrap();
        let explicit = tmp.path().join("explicit.json");
        let fallback = tmp.path().join("lexrag.json");
        std::fs::write(&explicit, r#"{"bm25": {"k1": 2.0}}"#).unwrap();
        std::fs::write(&fallback, r#"{"bm25": {"k1": 0.9}}"#).unwrap();

        let settings = Settings::resolve(Some(&explicit), &fallback).unwrap();
        assert_eq!(settings.bm25.k1, 2.0);

        let settings = Settings::resolve(None, &fallback).unwrap();
        assert_eq!(settings.bm25.k1, 0.9);
    }

    #[test]
    fn resolve_defaults_without_files() {
        let tmp = tempfile::tempdir().unwrap();
        let settings =
            Settings::resolve(None, &tmp.path().join("lexrag.json")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("nope.json");
        assert!(Settings::resolve(Some(&missing), &missing).is_err());
    }
}
