//! Token counting providers
//!
//! The discoverer never tokenizes text itself. It asks a `TokenRegistry` for
//! the provider responsible for each configured model name and stores the
//! counts it returns.
//!
//! Built-in providers are all local:
//! - `gpt-*`, `o1*`, `o3*`, `o4*`, `cl100k*`, `o200k*`: tiktoken BPE
//! - `chars-N`: N characters per token, rounded up
//! - `estimate`: fast heuristic without any encoding tables

pub mod chars;
pub mod estimate;
pub mod registry;
pub mod tiktoken;

pub use registry::TokenRegistry;

use crate::core::error::ProviderError;

/// Counts tokens for a family of model names
pub trait TokenProvider: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Check that `model` is something this provider can count for.
    ///
    /// Called once per model before any file is read.
    fn validate(&self, model: &str) -> Result<(), String>;

    /// Count the tokens of `text` for `model`
    fn count(&self, model: &str, text: &str) -> Result<u64, ProviderError>;
}
