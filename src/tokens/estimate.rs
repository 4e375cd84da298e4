//! Fast heuristic token estimate (model name `estimate`)
//!
//! No BPE tables are loaded. The estimate weights character classes:
//! - ASCII text: ~4 characters per token
//! - Code symbols: ~2 characters per token
//! - CJK characters: ~1.5 characters per token
//! - Other Unicode: ~2 characters per token

use crate::core::error::ProviderError;
use crate::tokens::TokenProvider;

/// Model name served by `EstimateProvider`
pub const ESTIMATE_MODEL: &str = "estimate";

/// Estimate tokens using a fast heuristic (no BPE encoding)
pub fn estimate_tokens(text: &str) -> u64 {
    if text.is_empty() {
        return 0;
    }

    let mut ascii_chars = 0u64;
    let mut cjk_chars = 0u64;
    let mut other_unicode = 0u64;
    let mut whitespace = 0u64;
    let mut code_symbols = 0u64;

    for c in text.chars() {
        if c.is_ascii_whitespace() {
            whitespace += 1;
        } else if c.is_ascii() {
            if is_code_symbol(c) {
                code_symbols += 1;
            } else {
                ascii_chars += 1;
            }
        } else if is_cjk_char(c) {
            cjk_chars += 1;
        } else {
            other_unicode += 1;
        }
    }

    let ascii_tokens = (ascii_chars + whitespace).div_ceil(4);
    let symbol_tokens = code_symbols.div_ceil(2);
    let cjk_tokens = (cjk_chars * 2).div_ceil(3);
    let other_tokens = other_unicode.div_ceil(2);

    ascii_tokens + symbol_tokens + cjk_tokens + other_tokens
}

#[inline]
fn is_code_symbol(c: char) -> bool {
    matches!(
        c,
        '(' | ')'
            | '['
            | ']'
            | '{'
            | '}'
            | '<'
            | '>'
            | '='
            | '+'
            | '-'
            | '*'
            | '/'
            | '%'
            | '&'
            | '|'
            | '^'
            | '!'
            | '~'
            | '?'
            | ':'
            | ';'
            | ','
            | '.'
            | '@'
            | '#'
            | '$'
            | '\\'
            | '"'
            | '\''
            | '`'
    )
}

/// Check if a character is CJK (Chinese/Japanese/Korean)
#[inline]
fn is_cjk_char(c: char) -> bool {
    let cp = c as u32;
    (0x4E00..=0x9FFF).contains(&cp)          // CJK Unified Ideographs
        || (0x3400..=0x4DBF).contains(&cp)  // CJK Extension A
        || (0x3000..=0x303F).contains(&cp)  // CJK Symbols and Punctuation
        || (0x3040..=0x309F).contains(&cp)  // Hiragana
        || (0x30A0..=0x30FF).contains(&cp)  // Katakana
        || (0xAC00..=0xD7AF).contains(&cp)  // Hangul Syllables
        || (0xFF00..=0xFFEF).contains(&cp) // Fullwidth Forms
}

/// Provider wrapper around `estimate_tokens`
#[derive(Debug, Default)]
pub struct EstimateProvider;

impl EstimateProvider {
    pub fn new() -> Self {
        Self
    }
}

impl TokenProvider for EstimateProvider {
    fn name(&self) -> &'static str {
        "estimate"
    }

    fn validate(&self, model: &str) -> Result<(), String> {
        if model == ESTIMATE_MODEL {
            Ok(())
        } else {
            Err(format!("the heuristic estimator only serves '{}'", ESTIMATE_MODEL))
        }
    }

    fn count(&self, _model: &str, text: &str) -> Result<u64, ProviderError> {
        Ok(estimate_tokens(text))
    }
}
