//! Error types for the library
//!
//! Configuration problems are hard errors surfaced before any file is touched.
//! Per-file I/O problems never show up here; they are recorded on the
//! affected `FileRecord` instead.

use std::path::PathBuf;
use thiserror::Error;

/// Invalid configuration detected before discovery starts
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// No registered provider recognises the model name
    #[error("unknown token model '{model}'{}", hint_suffix(.hint))]
    UnknownModel { model: String, hint: Option<String> },

    #[error("unknown selection mode '{0}' (expected: included, removed, all)")]
    InvalidSelection(String),

    #[error("unknown binary classifier '{0}' (expected: auto, signature, heuristic)")]
    InvalidClassifier(String),
}

fn hint_suffix(hint: &Option<String>) -> String {
    hint.as_ref().map(|h| format!(": {}", h)).unwrap_or_default()
}

/// Failure of a single provider call for a single model
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("token provider for '{model}' failed: {message}")]
pub struct ProviderError {
    pub model: String,
    pub message: String,
}

impl ProviderError {
    pub fn new(model: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            message: message.into(),
        }
    }
}

/// Errors that abort a discovery run
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("scan root does not exist or is not a directory: {}", .0.display())]
    RootNotFound(PathBuf),

    #[error("discovery cancelled after {visited} files")]
    Cancelled { visited: usize },

    #[error("cannot read scan root {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors from tree mutations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[error("'{0}' is a directory; file metrics can only be set on files")]
    NotAFile(String),

    #[error("no node with id {0}")]
    UnknownNode(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_model_message() {
        let err = ConfigError::UnknownModel {
            model: "foo-bar".to_string(),
            hint: None,
        };
        assert_eq!(err.to_string(), "unknown token model 'foo-bar'");

        let err = ConfigError::UnknownModel {
            model: "gpt-x".to_string(),
            hint: Some("no tiktoken encoding".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "unknown token model 'gpt-x': no tiktoken encoding"
        );
    }

    #[test]
    fn test_config_error_converts_into_discovery_error() {
        let err: DiscoveryError = ConfigError::InvalidSelection("odd".to_string()).into();
        assert!(matches!(err, DiscoveryError::Config(_)));
        assert!(err.to_string().contains("odd"));
    }
}
