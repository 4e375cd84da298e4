//! Per-extension statistics over discovery records

use serde::Serialize;
use std::collections::BTreeMap;

use crate::core::model::FileRecords;
use crate::core::paths::extension;

/// Totals for one extension
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtensionStats {
    pub count: usize,
    pub size: u64,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub tokens: BTreeMap<String, u64>,
}

/// Count, size and token totals per lowercase extension.
///
/// Files without an extension are grouped under "".
pub fn extension_stats(records: &FileRecords) -> BTreeMap<String, ExtensionStats> {
    let mut stats: BTreeMap<String, ExtensionStats> = BTreeMap::new();
    for (path, record) in records {
        let bucket = stats.entry(extension(path)).or_default();
        bucket.count += 1;
        bucket.size += record.size;
        for (model, count) in &record.tokens {
            *bucket.tokens.entry(model.clone()).or_default() += count;
        }
    }
    stats
}

/// Split full-tree extension stats into those still present after
/// filtering and those that disappeared entirely
pub fn classify_extensions(
    all: &BTreeMap<String, ExtensionStats>,
    effective: &BTreeMap<String, ExtensionStats>,
) -> (
    BTreeMap<String, ExtensionStats>,
    BTreeMap<String, ExtensionStats>,
) {
    let removed = all
        .iter()
        .filter(|(ext, _)| !effective.contains_key(*ext))
        .map(|(ext, stats)| (ext.clone(), stats.clone()))
        .collect();
    (effective.clone(), removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::FileRecord;

    fn records(entries: &[(&str, u64)]) -> FileRecords {
        entries
            .iter()
            .map(|(path, size)| (path.to_string(), FileRecord::new(*path, *size)))
            .collect()
    }

    #[test]
    fn test_extension_stats() {
        let mut input = records(&[("a.rs", 10), ("b/c.RS", 5), (".gitignore", 2), ("Makefile", 1)]);
        input.insert(
            "a.rs".to_string(),
            FileRecord::new("a.rs", 10).with_tokens(BTreeMap::from([("chars-4".to_string(), 3)])),
        );

        let stats = extension_stats(&input);
        assert_eq!(stats["rs"].count, 2);
        assert_eq!(stats["rs"].size, 15);
        assert_eq!(stats["rs"].tokens["chars-4"], 3);
        assert_eq!(stats["gitignore"].count, 1);
        assert_eq!(stats[""].size, 1);
    }

    #[test]
    fn test_classify_extensions() {
        let all = extension_stats(&records(&[("a.rs", 1), ("b.log", 2)]));
        let effective = extension_stats(&records(&[("a.rs", 1)]));
        let (kept, removed) = classify_extensions(&all, &effective);
        assert_eq!(kept.keys().collect::<Vec<_>>(), vec!["rs"]);
        assert_eq!(removed.keys().collect::<Vec<_>>(), vec!["log"]);
    }
}
