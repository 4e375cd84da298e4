//! tiktoken BPE provider
//!
//! Model names map onto one of two encodings:
//! - o200k_base: gpt-4o, gpt-4.1, gpt-4.5, gpt-5, o1, o3, o4
//! - cl100k_base: gpt-4, gpt-4-turbo, gpt-3.5-turbo
//!
//! The encodings themselves are loaded once, on first use.

use once_cell::sync::Lazy;
use std::fmt;
use tiktoken_rs::{cl100k_base, o200k_base, CoreBPE};

use crate::core::error::ProviderError;
use crate::tokens::TokenProvider;

/// BPE encodings bundled with tiktoken-rs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Cl100k,
    O200k,
}

impl Encoding {
    /// Loaded BPE tables for this encoding
    fn bpe(self) -> Result<&'static CoreBPE, String> {
        let loaded = match self {
            Encoding::Cl100k => &*CL100K_BPE,
            Encoding::O200k => &*O200K_BPE,
        };
        loaded.as_ref().map_err(|e| e.clone())
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Encoding::Cl100k => "cl100k_base",
            Encoding::O200k => "o200k_base",
        };
        write!(f, "{}", name)
    }
}

// Lazy-initialized BPE encodings (loaded once on first use)
static CL100K_BPE: Lazy<Result<CoreBPE, String>> =
    Lazy::new(|| cl100k_base().map_err(|e| format!("Failed to load cl100k_base: {}", e)));

static O200K_BPE: Lazy<Result<CoreBPE, String>> =
    Lazy::new(|| o200k_base().map_err(|e| format!("Failed to load o200k_base: {}", e)));

const O200K_PREFIXES: &[&str] = &["gpt-4o", "gpt-4.1", "gpt-4.5", "gpt-5", "o1", "o3", "o4"];
const CL100K_PREFIXES: &[&str] = &["gpt-4", "gpt-3.5", "gpt-35"];

/// Encoding used for a model name, if tiktoken knows the model
pub fn encoding_for_model(model: &str) -> Option<Encoding> {
    let model = model.to_lowercase();
    if model.starts_with("o200k") {
        return Some(Encoding::O200k);
    }
    if model.starts_with("cl100k") {
        return Some(Encoding::Cl100k);
    }
    if O200K_PREFIXES.iter().any(|p| model.starts_with(p)) {
        return Some(Encoding::O200k);
    }
    if CL100K_PREFIXES.iter().any(|p| model.starts_with(p)) {
        return Some(Encoding::Cl100k);
    }
    None
}

/// Local BPE token counts through tiktoken
#[derive(Debug, Default)]
pub struct TiktokenProvider;

impl TiktokenProvider {
    pub fn new() -> Self {
        Self
    }
}

impl TokenProvider for TiktokenProvider {
    fn name(&self) -> &'static str {
        "tiktoken"
    }

    fn validate(&self, model: &str) -> Result<(), String> {
        let encoding = encoding_for_model(model)
            .ok_or_else(|| "no tiktoken encoding is known for this model".to_string())?;
        encoding.bpe().map(|_| ())
    }

    fn count(&self, model: &str, text: &str) -> Result<u64, ProviderError> {
        if text.is_empty() {
            return Ok(0);
        }
        let encoding = encoding_for_model(model)
            .ok_or_else(|| ProviderError::new(model, "no tiktoken encoding for model"))?;
        let bpe = encoding
            .bpe()
            .map_err(|message| ProviderError::new(model, message))?;
        Ok(bpe.encode_with_special_tokens(text).len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoding_for_model() {
        assert_eq!(encoding_for_model("gpt-4o"), Some(Encoding::O200k));
        assert_eq!(encoding_for_model("gpt-4o-mini"), Some(Encoding::O200k));
        assert_eq!(encoding_for_model("o3-mini"), Some(Encoding::O200k));
        assert_eq!(encoding_for_model("gpt-4"), Some(Encoding::Cl100k));
        assert_eq!(encoding_for_model("gpt-4-turbo"), Some(Encoding::Cl100k));
        assert_eq!(encoding_for_model("gpt-3.5-turbo"), Some(Encoding::Cl100k));
        assert_eq!(encoding_for_model("cl100k_base"), Some(Encoding::Cl100k));
        assert_eq!(encoding_for_model("o200k_base"), Some(Encoding::O200k));
        assert_eq!(encoding_for_model("gpt-neo"), None);
    }

    #[test]
    fn test_validate() {
        let provider = TiktokenProvider::new();
        assert!(provider.validate("gpt-4o").is_ok());
        assert!(provider.validate("gpt-unknown").is_err());
    }

    #[test]
    fn test_count_empty() {
        assert_eq!(TiktokenProvider::new().count("gpt-4o", "").unwrap(), 0);
    }

    #[test]
    fn test_count_ascii() {
        let tokens = TiktokenProvider::new()
            .count("gpt-4", "Hello, world!")
            .unwrap();
        assert!(tokens > 0 && tokens < 10);
    }

    #[test]
    fn test_count_cjk_and_code() {
        let provider = TiktokenProvider::new();
        assert!(provider.count("gpt-4o", "你好世界").unwrap() > 0);
        assert!(
            provider
                .count("cl100k", r#"fn main() { println!("Hello"); }"#)
                .unwrap()
                > 0
        );
    }

    #[test]
    fn test_count_unknown_model_fails() {
        let err = TiktokenProvider::new().count("gpt-neo", "text").unwrap_err();
        assert_eq!(err.model, "gpt-neo");
    }
}
