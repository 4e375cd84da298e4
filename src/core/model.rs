//! Shared data model
//!
//! Everything that crosses a component boundary lives here: the per-file
//! record produced by discovery, the ignore decision and its reasons, and the
//! selection mode that filters records.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use crate::core::error::ConfigError;

/// Flag set on records of binary files
pub const FLAG_BINARY: &str = "binary";

/// Flag set on records whose file could not be read
pub const FLAG_UNREADABLE: &str = "unreadable";

/// Flag set when the read policy cut the content short
pub const FLAG_TRUNCATED: &str = "truncated";

/// Flag set when the read policy skipped the content (size or encoding)
pub const FLAG_CONTENT_SKIPPED: &str = "content_skipped";

/// Which layer contributed a pattern. Ordering is precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Built-in default patterns
    Default,
    /// Patterns supplied by the caller
    User,
    /// Patterns read from ignore files found in the tree
    Discovered,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Origin::Default => "default",
            Origin::User => "user",
            Origin::Discovered => "discovered",
        };
        write!(f, "{}", name)
    }
}

/// Why a path was excluded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Reason {
    /// The path itself was decided by an excluding pattern
    Pattern { pattern: String, origin: Origin },
    /// An ancestor directory is excluded, so the path cannot be re-included
    AncestorExcluded {
        directory: String,
        pattern: String,
        origin: Origin,
    },
    /// The file was classified as binary and binary files are excluded
    Binary,
}

/// Full decision for one path
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IgnoreDecision {
    pub is_ignored: bool,
    pub is_binary: bool,
    /// Every pattern (in precedence order) that matched the path itself
    pub matched_patterns: Vec<String>,
    pub reasons: Vec<Reason>,
}

/// Which records discovery keeps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    /// Files that are not ignored
    #[default]
    Included,
    /// Only files that are ignored
    Removed,
    /// Every file, ignored or not
    All,
}

impl SelectionMode {
    /// Apply the filter to an ignore verdict
    pub fn keeps(self, is_ignored: bool) -> bool {
        match self {
            SelectionMode::Included => !is_ignored,
            SelectionMode::Removed => is_ignored,
            SelectionMode::All => true,
        }
    }
}

impl fmt::Display for SelectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SelectionMode::Included => "included",
            SelectionMode::Removed => "removed",
            SelectionMode::All => "all",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for SelectionMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "included" | "effective" => Ok(SelectionMode::Included),
            "removed" | "ignored" => Ok(SelectionMode::Removed),
            "all" => Ok(SelectionMode::All),
            _ => Err(ConfigError::InvalidSelection(s.to_string())),
        }
    }
}

/// Metadata for one discovered file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Path relative to the scan root, using '/' as separator
    pub relative_path: String,

    /// File size in bytes (0 when unreadable)
    pub size: u64,

    pub is_binary: bool,

    #[serde(default)]
    pub flags: BTreeSet<String>,

    /// Token count per model name
    #[serde(default)]
    pub tokens: BTreeMap<String, u64>,

    /// Why the file is ignored (empty for included files)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reasons: Vec<Reason>,

    /// Creation date (YYYY-MM-DD), when dates were requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,

    /// Modification date (YYYY-MM-DD), when dates were requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,
}

impl FileRecord {
    pub fn new(relative_path: impl Into<String>, size: u64) -> Self {
        Self {
            relative_path: relative_path.into(),
            size,
            ..Default::default()
        }
    }

    /// Mark as binary (sets both the field and the flag)
    pub fn with_binary(mut self, is_binary: bool) -> Self {
        self.is_binary = is_binary;
        if is_binary {
            self.flags.insert(FLAG_BINARY.to_string());
        }
        self
    }

    pub fn with_tokens(mut self, tokens: BTreeMap<String, u64>) -> Self {
        self.tokens = tokens;
        self
    }

    pub fn with_flag(mut self, flag: impl Into<String>) -> Self {
        self.flags.insert(flag.into());
        self
    }

    pub fn is_ignored(&self) -> bool {
        !self.reasons.is_empty()
    }
}

/// Discovery output keyed by relative path
pub type FileRecords = BTreeMap<String, FileRecord>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_mode_keeps() {
        assert!(SelectionMode::Included.keeps(false));
        assert!(!SelectionMode::Included.keeps(true));
        assert!(SelectionMode::Removed.keeps(true));
        assert!(!SelectionMode::Removed.keeps(false));
        assert!(SelectionMode::All.keeps(true));
        assert!(SelectionMode::All.keeps(false));
    }

    #[test]
    fn test_selection_mode_from_str() {
        assert_eq!(
            "included".parse::<SelectionMode>().unwrap(),
            SelectionMode::Included
        );
        assert_eq!("ALL".parse::<SelectionMode>().unwrap(), SelectionMode::All);
        assert_eq!(
            "removed".parse::<SelectionMode>().unwrap(),
            SelectionMode::Removed
        );
        assert!("everything".parse::<SelectionMode>().is_err());
    }

    #[test]
    fn test_origin_precedence_order() {
        assert!(Origin::Default < Origin::User);
        assert!(Origin::User < Origin::Discovered);
    }

    #[test]
    fn test_file_record_binary_flag() {
        let record = FileRecord::new("img.png", 10).with_binary(true);
        assert!(record.is_binary);
        assert!(record.flags.contains(FLAG_BINARY));

        let record = FileRecord::new("a.txt", 3).with_binary(false);
        assert!(record.flags.is_empty());
    }

    #[test]
    fn test_reason_serializes_with_kind_tag() {
        let reason = Reason::Pattern {
            pattern: "*.log".to_string(),
            origin: Origin::Default,
        };
        let json = serde_json::to_value(&reason).unwrap();
        assert_eq!(json["kind"], "pattern");
        assert_eq!(json["origin"], "default");
        assert_eq!(
            serde_json::to_value(Reason::Binary).unwrap()["kind"],
            "binary"
        );
    }
}
