//! Statistics collected during one discovery run

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::core::model::Origin;
use crate::discovery::patterns::{PatternHits, PatternResolver};

/// What discovery saw and decided, for reporting
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiscoveryStats {
    /// Name of the binary classifier used for the run
    pub classifier: String,

    /// Regular files visited by the traversal
    pub files_visited: usize,

    /// Files that passed the selection filter
    pub files_kept: usize,

    /// Active patterns grouped by origin, in precedence order
    pub patterns_by_origin: BTreeMap<Origin, Vec<String>>,

    /// How many checked paths each pattern decided
    pub pattern_hits: Vec<PatternHits>,

    /// Extensions of every file classified as binary
    pub binary_extensions_seen: BTreeSet<String>,

    /// Extensions of binary files excluded because binary files are excluded
    pub binary_extensions_blocked: BTreeSet<String>,

    /// Provider failures per model
    pub token_failures: BTreeMap<String, usize>,

    /// Kept files whose content the read policy skipped
    pub content_skipped: usize,

    /// Kept files whose content the read policy truncated
    pub content_truncated: usize,
}

impl DiscoveryStats {
    pub fn new(classifier: &str) -> Self {
        Self {
            classifier: classifier.to_string(),
            ..Default::default()
        }
    }

    /// Copy the pattern surface out of a resolver after traversal
    pub fn capture_patterns(&mut self, resolver: &PatternResolver) {
        self.patterns_by_origin = resolver.patterns_by_origin();
        self.pattern_hits = resolver.hit_counts();
    }

    /// Note a file classified as binary
    pub fn note_binary(&mut self, extension: &str, blocked: bool) {
        if extension.is_empty() {
            return;
        }
        self.binary_extensions_seen.insert(extension.to_string());
        if blocked {
            self.binary_extensions_blocked.insert(extension.to_string());
        }
    }

    pub fn note_token_failure(&mut self, model: &str) {
        *self.token_failures.entry(model.to_string()).or_default() += 1;
    }

    /// Patterns that decided at least one path, most hits first
    pub fn top_patterns(&self, limit: usize) -> Vec<&PatternHits> {
        let mut hit: Vec<&PatternHits> = self.pattern_hits.iter().filter(|p| p.hits > 0).collect();
        hit.sort_by(|a, b| b.hits.cmp(&a.hits));
        hit.truncate(limit);
        hit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_binary() {
        let mut stats = DiscoveryStats::new("heuristic");
        stats.note_binary("png", true);
        stats.note_binary("dat", false);
        stats.note_binary("", true);
        assert_eq!(stats.binary_extensions_seen.len(), 2);
        assert_eq!(
            stats.binary_extensions_blocked.iter().collect::<Vec<_>>(),
            vec!["png"]
        );
    }

    #[test]
    fn test_note_token_failure() {
        let mut stats = DiscoveryStats::default();
        stats.note_token_failure("remote-x");
        stats.note_token_failure("remote-x");
        assert_eq!(stats.token_failures["remote-x"], 2);
    }

    #[test]
    fn test_top_patterns() {
        let stats = DiscoveryStats {
            pattern_hits: vec![
                PatternHits {
                    origin: Origin::Default,
                    pattern: "*.log".to_string(),
                    hits: 2,
                },
                PatternHits {
                    origin: Origin::User,
                    pattern: "*.tmp".to_string(),
                    hits: 0,
                },
                PatternHits {
                    origin: Origin::User,
                    pattern: "build/".to_string(),
                    hits: 5,
                },
            ],
            ..Default::default()
        };
        let top = stats.top_patterns(5);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].pattern, "build/");
    }
}
