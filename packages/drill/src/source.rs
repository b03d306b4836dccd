//! Catalog source
//!
//! Fetches the raw word list from a local file or an http(s) URL. This is
//! the only asynchronous step; everything after it runs synchronously.

use serde_json::Value;
use tango_algo::{normalize_catalog, Catalog};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RetrievalError {
    #[error("failed to read word list: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to download word list: {0}")]
    Http(#[from] reqwest::Error),

    #[error("word list is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("word list must be a JSON array")]
    NotAnArray,
}

/// Outcome of a catalog load, shown to the learner
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogStatus {
    Ready { words: usize },
    /// Fetch failed; the session runs on an empty catalog
    Unavailable { reason: String },
}

pub fn is_remote(location: &str) -> bool {
    let lower = location.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Fetch the raw entries
pub async fn fetch_catalog(location: &str) -> Result<Vec<Value>, RetrievalError> {
    let document: Value = if is_remote(location) {
        reqwest::get(location)
            .await?
            .error_for_status()?
            .json::<Value>()
            .await?
    } else {
        let text = tokio::fs::read_to_string(location).await?;
        serde_json::from_str(&text)?
    };

    match document {
        Value::Array(entries) => Ok(entries),
        _ => Err(RetrievalError::NotAnArray),
    }
}

/// Fetch and normalize; a failed fetch degrades to an empty catalog
pub async fn load_catalog(location: &str) -> (Catalog, CatalogStatus) {
    match fetch_catalog(location).await {
        Ok(raw) => {
            let catalog = normalize_catalog(&raw);
            tracing::info!(location, words = catalog.len(), "word list loaded");
            let status = CatalogStatus::Ready {
                words: catalog.len(),
            };
            (catalog, status)
        }
        Err(err) => {
            tracing::warn!(location, error = %err, "word list unavailable");
            let status = CatalogStatus::Unavailable {
                reason: err.to_string(),
            };
            (Catalog::empty(), status)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_is_remote() {
        assert!(is_remote("https://example.com/words.json"));
        assert!(is_remote("HTTP://example.com/words.json"));
        assert!(!is_remote("words.json"));
        assert!(!is_remote("/srv/http/words.json"));
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"word": "cat", "position": 1}}, null, {{"word": ""}}, {{"word": "dog"}}]"#
        )
        .unwrap();

        let (catalog, status) = load_catalog(file.path().to_str().unwrap()).await;
        assert_eq!(status, CatalogStatus::Ready { words: 2 });
        assert!(catalog.contains("cat"));
        assert!(catalog.contains("dog"));
    }

    #[tokio::test]
    async fn test_missing_file_degrades_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");

        let (catalog, status) = load_catalog(path.to_str().unwrap()).await;
        assert!(catalog.is_empty());
        assert!(matches!(status, CatalogStatus::Unavailable { .. }));
    }

    #[tokio::test]
    async fn test_non_array_document_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"word": "cat"}}"#).unwrap();

        let err = fetch_catalog(file.path().to_str().unwrap()).await.unwrap_err();
        assert!(matches!(err, RetrievalError::NotAnArray));
    }

    #[tokio::test]
    async fn test_invalid_json_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[{{").unwrap();

        let err = fetch_catalog(file.path().to_str().unwrap()).await.unwrap_err();
        assert!(matches!(err, RetrievalError::Parse(_)));
    }
}
