//! Discovery configuration
//!
//! Plain data, serde-friendly, with defaults matching the CLI's defaults. The
//! CLI maps its flags onto these structs; library callers build them directly.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::error::ConfigError;
use crate::core::file_reader::FileReadConfig;
use crate::core::model::SelectionMode;

/// Default sample size for binary classification (64 KiB)
pub const DEFAULT_SAMPLE_SIZE: usize = 64 * 1024;

/// Which binary classification strategy to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierKind {
    /// Signature sniffing when available, heuristic otherwise
    #[default]
    Auto,
    Signature,
    Heuristic,
}

impl fmt::Display for ClassifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ClassifierKind::Auto => "auto",
            ClassifierKind::Signature => "signature",
            ClassifierKind::Heuristic => "heuristic",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for ClassifierKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(ClassifierKind::Auto),
            "signature" | "magic" => Ok(ClassifierKind::Signature),
            "heuristic" => Ok(ClassifierKind::Heuristic),
            _ => Err(ConfigError::InvalidClassifier(s.to_string())),
        }
    }
}

/// Where ignore patterns come from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternConfig {
    /// Include the built-in default patterns
    pub use_defaults: bool,

    /// Caller patterns, applied after the defaults
    pub user_patterns: Vec<String>,

    /// Read ignore files found in the tree
    pub read_ignore_files: bool,

    /// File names treated as ignore files
    pub ignore_file_names: Vec<String>,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            use_defaults: true,
            user_patterns: Vec::new(),
            read_ignore_files: true,
            ignore_file_names: crate::discovery::patterns::DEFAULT_IGNORE_FILES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Everything one discovery run needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoverConfig {
    pub patterns: PatternConfig,

    /// Keep binary files instead of excluding them
    pub include_binary: bool,

    pub classifier: ClassifierKind,

    /// Bytes read from the start of a file to classify it
    pub sample_size: usize,

    pub selection: SelectionMode,

    /// Deepest file depth visited (root-level files are depth 0)
    pub max_depth: Option<usize>,

    /// Model names to count tokens for
    pub token_models: Vec<String>,

    /// Fill in creation and modification dates
    pub include_dates: bool,

    /// How file content is read for token counting and the content sink
    pub read: FileReadConfig,
}

impl Default for DiscoverConfig {
    fn default() -> Self {
        Self {
            patterns: PatternConfig::default(),
            include_binary: false,
            classifier: ClassifierKind::Auto,
            sample_size: DEFAULT_SAMPLE_SIZE,
            selection: SelectionMode::Included,
            max_depth: None,
            token_models: Vec::new(),
            include_dates: false,
            read: FileReadConfig::default(),
        }
    }
}

impl DiscoverConfig {
    pub fn with_selection(mut self, selection: SelectionMode) -> Self {
        self.selection = selection;
        self
    }

    pub fn with_models<I, S>(mut self, models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.token_models = models.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_user_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.patterns.user_patterns = patterns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_ignore_file_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.patterns.ignore_file_names = names.into_iter().map(Into::into).collect();
        self
    }
}
