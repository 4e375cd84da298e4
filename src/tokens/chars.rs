//! Characters-per-token ratio provider (`chars-4`, `chars-3.5`, ...)

use once_cell::sync::Lazy;
use regex::Regex;

use crate::core::error::ProviderError;
use crate::tokens::TokenProvider;

static CHARS_MODEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^chars-(\d+(?:\.\d+)?)$").expect("Invalid CHARS_MODEL regex"));

/// Parse the ratio out of a `chars-N` model name
pub fn parse_ratio(model: &str) -> Result<f64, String> {
    let caps = CHARS_MODEL
        .captures(model)
        .ok_or_else(|| "expected 'chars-<ratio>', e.g. chars-4 or chars-3.5".to_string())?;
    let ratio: f64 = caps[1]
        .parse()
        .map_err(|e| format!("cannot parse ratio: {}", e))?;
    if ratio <= 0.0 || !ratio.is_finite() {
        return Err(format!("ratio must be positive, got {}", ratio));
    }
    Ok(ratio)
}

/// Estimates tokens as `ceil(characters / ratio)`
#[derive(Debug, Default)]
pub struct CharRatioProvider;

impl CharRatioProvider {
    pub fn new() -> Self {
        Self
    }
}

impl TokenProvider for CharRatioProvider {
    fn name(&self) -> &'static str {
        "chars"
    }

    fn validate(&self, model: &str) -> Result<(), String> {
        parse_ratio(model).map(|_| ())
    }

    fn count(&self, model: &str, text: &str) -> Result<u64, ProviderError> {
        let ratio = parse_ratio(model).map_err(|message| ProviderError::new(model, message))?;
        let chars = text.chars().count() as f64;
        Ok((chars / ratio).ceil() as u64)
    }
}
