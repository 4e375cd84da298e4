//! Command handlers behind the CLI
//!
//! Each handler runs discovery, shapes the result and prints it to stdout.

use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use tracing::info;

use crate::core::config::DiscoverConfig;
use crate::core::error::TreeError;
use crate::core::model::{FileRecord, FileRecords, SelectionMode};
use crate::core::paths::make_relative;
use crate::core::render::{RenderConfig, Renderer};
use crate::discovery::{discover, Discovery, DiscoveryStats};
use crate::tree::analysis::{classify_extensions, extension_stats, ExtensionStats};
use crate::tree::{Aggregate, FileTree, NodeId};

fn run_discovery(root: &Path, config: &DiscoverConfig) -> Result<Discovery> {
    discover(root, config, None).with_context(|| format!("discovery failed for {}", root.display()))
}

/// Run the discover command
pub fn run_discover(root: &Path, config: &DiscoverConfig, render: RenderConfig) -> Result<()> {
    let discovery = run_discovery(root, config)?;
    let records: Vec<&FileRecord> = discovery.files.values().collect();

    let stdout = std::io::stdout();
    Renderer::with_config(render).render_to(&records, stdout.lock())
}

/// Everything the stats command reports
#[derive(Debug, Serialize)]
pub struct StatsReport {
    pub root: String,
    pub selection: SelectionMode,
    pub discovery: DiscoveryStats,
    pub totals: Aggregate,
    /// Extensions of the selected files
    pub extensions: BTreeMap<String, ExtensionStats>,
    /// Extensions present in the tree but absent from the selection
    pub removed_extensions: BTreeMap<String, ExtensionStats>,
}

impl StatsReport {
    /// Build the report from a discovery run in `all` mode, narrowed to
    /// `selection`
    pub fn new(root: &Path, selection: SelectionMode, discovery: Discovery) -> Self {
        let all = extension_stats(&discovery.files);
        let selected: FileRecords = discovery
            .files
            .into_iter()
            .filter(|(_, record)| selection.keeps(record.is_ignored()))
            .collect();
        let (extensions, removed_extensions) =
            classify_extensions(&all, &extension_stats(&selected));

        let tree = FileTree::build(&selected);
        let mut stats = discovery.stats;
        stats.files_kept = selected.len();
        Self {
            root: root.display().to_string(),
            selection,
            totals: tree.stats(tree.root()),
            extensions,
            removed_extensions,
            discovery: stats,
        }
    }
}

/// Run the stats command.
///
/// Discovery runs once over every file so removed extensions can be
/// reported; the selection is applied afterwards.
pub fn run_stats(root: &Path, config: &DiscoverConfig, render: RenderConfig) -> Result<()> {
    let all = config.clone().with_selection(SelectionMode::All);
    let discovery = run_discovery(root, &all)?;
    let report = StatsReport::new(root, config.selection, discovery);

    let output = Renderer::with_config(render).render_value(&report)?;
    let stdout = std::io::stdout();
    writeln!(stdout.lock(), "{}", output)?;
    Ok(())
}

/// One node of the aggregate tree, flattened for output
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct TreeRow {
    pub path: String,
    pub kind: &'static str,
    pub depth: usize,
    pub size: u64,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub tokens: BTreeMap<String, u64>,
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub flags: BTreeSet<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub extension: String,
}

/// Flatten a tree in pre-order; directory depth counts from the root (0)
pub fn tree_rows(tree: &FileTree) -> Result<Vec<TreeRow>, TreeError> {
    tree.preorder()
        .into_iter()
        .map(|id| tree_row(tree, id))
        .collect()
}

fn tree_row(tree: &FileTree, id: NodeId) -> Result<TreeRow, TreeError> {
    let mut depth = 0;
    let mut current = tree.parent(id);
    while let Some(parent) = current {
        depth += 1;
        current = tree.parent(parent);
    }

    let node = tree.node(id)?;
    let stats = tree.stats(id);
    Ok(TreeRow {
        path: node.relative_path.clone(),
        kind: if node.is_directory() { "directory" } else { "file" },
        depth,
        size: stats.size,
        tokens: stats.tokens,
        flags: node.flags.clone(),
        extension: node.extension.clone(),
    })
}

/// Run the tree command
pub fn run_tree(root: &Path, config: &DiscoverConfig, render: RenderConfig) -> Result<()> {
    let discovery = run_discovery(root, config)?;
    let tree = FileTree::build_eager(&discovery.files);
    let rows = tree_rows(&tree)?;

    let stdout = std::io::stdout();
    Renderer::with_config(render).render_to(&rows, stdout.lock())
}

/// Delimiter fencing each file's content in a summary
pub const DEFAULT_DELIMITER: &str = "```";

/// Streams `path:` headers and fenced content to a writer.
///
/// The sink cannot fail, so the first write error is kept and later files
/// are dropped; `finish` reports it.
pub struct ContentWriter<W: Write> {
    out: W,
    delimiter: String,
    files_written: usize,
    error: Option<io::Error>,
}

impl<W: Write> ContentWriter<W> {
    pub fn new(out: W, delimiter: impl Into<String>) -> Self {
        Self {
            out,
            delimiter: delimiter.into(),
            files_written: 0,
            error: None,
        }
    }

    /// Append one file; empty content is skipped
    pub fn write_content(&mut self, path: &str, content: &str) {
        if content.is_empty() || self.error.is_some() {
            return;
        }
        let delimiter = &self.delimiter;
        match write!(self.out, "{path}:\n{delimiter}\n{content}\n{delimiter}\n\n") {
            Ok(()) => self.files_written += 1,
            Err(e) => self.error = Some(e),
        }
    }

    /// Flush and return how many files were written
    pub fn finish(mut self) -> io::Result<usize> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }
        self.out.flush()?;
        Ok(self.files_written)
    }
}

/// Escape glob metacharacters so a path matches only itself
fn literal_pattern(relative: &str) -> String {
    let mut pattern = String::from("/");
    for c in relative.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '{' | '}' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern
}

/// Run the summarize command: stream every kept text file to `output`
/// (stdout when `None`) in one discovery pass
pub fn run_summarize(
    root: &Path,
    config: &DiscoverConfig,
    output: Option<&Path>,
    delimiter: &str,
) -> Result<()> {
    let mut config = config.clone();
    let out: Box<dyn Write> = match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("cannot create output file {}", path.display()))?;
            // Keep the summary out of its own input
            let absolute = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
            if let Some(rel) = make_relative(&absolute, root) {
                config.patterns.user_patterns.push(literal_pattern(&rel));
            }
            Box::new(BufWriter::new(file))
        }
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    let mut writer = ContentWriter::new(out, delimiter);
    let mut sink = |path: &str, content: &str| writer.write_content(path, content);
    let discovery = discover(root, &config, Some(&mut sink))
        .with_context(|| format!("discovery failed for {}", root.display()))?;
    let written = writer.finish().context("failed to write summary")?;

    info!(
        files = written,
        kept = discovery.stats.files_kept,
        "summary written"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::FileRecords;

    #[test]
    fn test_tree_rows_preorder_with_depth() {
        let records: FileRecords = [("a.txt", 2u64), ("d/b.rs", 3)]
            .into_iter()
            .map(|(p, s)| (p.to_string(), FileRecord::new(p, s)))
            .collect();
        let tree = FileTree::build(&records);
        let rows = tree_rows(&tree).unwrap();

        let summary: Vec<(&str, &str, usize, u64)> = rows
            .iter()
            .map(|r| (r.path.as_str(), r.kind, r.depth, r.size))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("", "directory", 0, 5),
                ("a.txt", "file", 1, 2),
                ("d", "directory", 1, 3),
                ("d/b.rs", "file", 2, 3),
            ]
        );
        assert_eq!(rows[3].extension, "rs");
    }

    #[test]
    fn test_content_writer_layout() {
        let mut writer = ContentWriter::new(Vec::new(), DEFAULT_DELIMITER);
        writer.write_content("a.txt", "alpha");
        writer.write_content("empty.txt", "");
        writer.write_content("d/b.rs", "fn b() {}");
        let mut out = Vec::new();
        std::mem::swap(&mut out, &mut writer.out);
        assert_eq!(writer.finish().unwrap(), 2);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "a.txt:\n```\nalpha\n```\n\nd/b.rs:\n```\nfn b() {}\n```\n\n"
        );
    }

    #[test]
    fn test_literal_pattern_escapes_globs() {
        assert_eq!(literal_pattern("out/summary.txt"), "/out/summary.txt");
        assert_eq!(literal_pattern("a[1]*.md"), "/a\\[1\\]\\*.md");
    }

    #[test]
    fn test_stats_report_splits_removed_extensions() {
        use crate::core::model::{Origin, Reason};

        let ignored = Reason::Pattern {
            pattern: "*.log".to_string(),
            origin: Origin::Default,
        };
        let mut log = FileRecord::new("app.log", 7);
        log.reasons.push(ignored);
        let files: FileRecords = [
            FileRecord::new("a.rs", 2),
            FileRecord::new("d/b.rs", 3),
            log,
        ]
        .into_iter()
        .map(|r| (r.relative_path.clone(), r))
        .collect();
        let discovery = Discovery {
            files,
            stats: DiscoveryStats::new("heuristic"),
        };

        let report = StatsReport::new(Path::new("/r"), SelectionMode::Included, discovery);
        assert_eq!(report.totals.size, 5);
        assert_eq!(report.discovery.files_kept, 2);
        assert_eq!(report.extensions.keys().collect::<Vec<_>>(), vec!["rs"]);
        assert_eq!(report.removed_extensions["log"].size, 7);
    }
}
