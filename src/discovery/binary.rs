//! Binary/text classification
//!
//! Two strategies share the `BinaryClassifier` trait:
//! - `SignatureClassifier` sniffs the sample the way `file(1)` does: a charset
//!   check first, then a magic-number MIME lookup. Needs the `signature`
//!   feature.
//! - `HeuristicClassifier` works from the extension and byte statistics and
//!   leans towards "text" when unsure.
//!
//! `create_classifier` picks one per run.

use std::path::Path;
use std::sync::Once;
use tracing::warn;

use crate::core::config::ClassifierKind;
use crate::core::file_reader::read_sample;
use crate::core::paths::{extension, normalize_path};
use crate::discovery::extensions::is_binary_extension;

/// Minimum share of text-like bytes for legacy-encoded content to count as text
pub const PRINTABLE_RATIO: f64 = 0.70;

/// Decides whether a file should be treated as binary
pub trait BinaryClassifier: Send + Sync {
    /// Strategy name, reported in discovery statistics
    fn name(&self) -> &'static str;

    /// Classify a sample taken from the start of `path`
    fn is_binary_data(&self, data: &[u8], path: &Path) -> bool;

    /// Read up to `sample_size` bytes and classify them.
    ///
    /// Files that cannot be read are treated as binary.
    fn is_binary(&self, path: &Path, sample_size: usize) -> bool {
        match read_sample(path, sample_size) {
            Ok(data) => self.is_binary_data(&data, path),
            Err(_) => true,
        }
    }
}

/// Content-signature classifier
#[derive(Debug)]
pub struct SignatureClassifier {
    _private: (),
}

impl SignatureClassifier {
    /// Fails when the crate was built without signature support
    pub fn new() -> Result<Self, String> {
        if cfg!(feature = "signature") {
            Ok(Self { _private: () })
        } else {
            Err("built without the `signature` feature".to_string())
        }
    }
}

impl BinaryClassifier for SignatureClassifier {
    fn name(&self) -> &'static str {
        "signature"
    }

    fn is_binary_data(&self, data: &[u8], _path: &Path) -> bool {
        if data.is_empty() || has_text_charset(data) {
            return false;
        }
        match sniff_mime(data) {
            Some(mime) => !is_text_mime(mime),
            None => true,
        }
    }
}

#[cfg(feature = "signature")]
fn sniff_mime(data: &[u8]) -> Option<&'static str> {
    infer::get(data).map(|kind| kind.mime_type())
}

#[cfg(not(feature = "signature"))]
fn sniff_mime(_data: &[u8]) -> Option<&'static str> {
    None
}

/// MIME types that carry text even when the charset looked binary
fn is_text_mime(mime: &str) -> bool {
    let low = mime.to_ascii_lowercase();
    low.starts_with("text/") || low.contains("json") || low.contains("xml")
}

/// True when every byte belongs to some text charset.
///
/// ASCII controls other than BEL..CR and ESC, plus DEL, mark binary data.
/// High-bit bytes are accepted (UTF-8 or an 8-bit code page). A UTF-16 byte
/// order mark also counts as text.
fn has_text_charset(data: &[u8]) -> bool {
    if data.starts_with(&[0xFF, 0xFE]) || data.starts_with(&[0xFE, 0xFF]) {
        return true;
    }
    data.iter().all(|&b| is_text_byte(b))
}

fn is_text_byte(b: u8) -> bool {
    matches!(b, 0x07..=0x0D | 0x1B | 0x20..=0x7E | 0x80..=0xFF)
}

/// Single-byte encodings tried when a sample is not UTF-8
#[derive(Debug, Clone, Copy)]
enum LegacyEncoding {
    Latin1,
    Windows1252,
}

impl LegacyEncoding {
    const ALL: [LegacyEncoding; 2] = [LegacyEncoding::Latin1, LegacyEncoding::Windows1252];

    fn decodes(self, data: &[u8]) -> bool {
        match self {
            LegacyEncoding::Latin1 => true,
            // Five code points are unassigned in Windows-1252
            LegacyEncoding::Windows1252 => !data
                .iter()
                .any(|b| matches!(b, 0x81 | 0x8D | 0x8F | 0x90 | 0x9D)),
        }
    }
}

/// Extension and byte-statistics classifier
#[derive(Debug, Default)]
pub struct HeuristicClassifier;

impl HeuristicClassifier {
    pub fn new() -> Self {
        Self
    }
}

impl BinaryClassifier for HeuristicClassifier {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    fn is_binary_data(&self, data: &[u8], path: &Path) -> bool {
        if is_binary_extension(&extension(&normalize_path(path))) {
            return true;
        }
        if data.is_empty() {
            return false;
        }
        if data.contains(&0) {
            return true;
        }
        if std::str::from_utf8(data).is_ok() {
            return false;
        }
        if LegacyEncoding::ALL
            .iter()
            .any(|enc| enc.decodes(data) && looks_like_text(data))
        {
            return false;
        }
        // Undecided: keep it, a missing source file costs more than a noisy one
        false
    }
}

/// Share of printable ASCII, common whitespace and high-bit bytes
pub fn printable_ratio(data: &[u8]) -> f64 {
    if data.is_empty() {
        return 1.0;
    }
    let printable = data
        .iter()
        .filter(|&&b| matches!(b, 32..=126 | 9 | 10 | 13 | 128..=255))
        .count();
    printable as f64 / data.len() as f64
}

fn looks_like_text(data: &[u8]) -> bool {
    printable_ratio(data) >= PRINTABLE_RATIO
}

static FALLBACK_WARNING: Once = Once::new();

/// Build the classifier for a run.
///
/// Signature sniffing falls back to the heuristic when unavailable; the
/// fallback is announced once per process.
pub fn create_classifier(kind: ClassifierKind) -> Box<dyn BinaryClassifier> {
    match kind {
        ClassifierKind::Heuristic => Box::new(HeuristicClassifier::new()),
        ClassifierKind::Auto | ClassifierKind::Signature => match SignatureClassifier::new() {
            Ok(classifier) => Box::new(classifier),
            Err(reason) => {
                FALLBACK_WARNING.call_once(|| {
                    warn!(
                        reason = %reason,
                        "signature-based binary detection unavailable; using heuristic detection"
                    );
                });
                Box::new(HeuristicClassifier::new())
            }
        },
    }
}
