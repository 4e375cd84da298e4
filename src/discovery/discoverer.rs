//! One-pass discovery
//!
//! Walks the tree once, decides each regular file against the ignore rules
//! and the binary classifier, filters by selection mode, and produces a flat
//! map of `FileRecord`s. Content of kept text files is read once, counted and
//! handed to the optional sink before the next file is touched.
//!
//! Pattern rules are evaluated before classification and both reasons are
//! recorded when both apply.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::core::config::DiscoverConfig;
use crate::core::error::{DiscoveryError, ProviderError};
use crate::core::file_reader::read_file_with_config;
use crate::core::model::{
    FileRecord, FileRecords, IgnoreDecision, Reason, SelectionMode, FLAG_CONTENT_SKIPPED,
    FLAG_TRUNCATED, FLAG_UNREADABLE,
};
use crate::core::paths::{extension, make_relative};
use crate::core::util::file_dates;
use crate::discovery::binary::{create_classifier, BinaryClassifier};
use crate::discovery::patterns::PatternResolver;
use crate::discovery::stats::DiscoveryStats;
use crate::tokens::registry::ModelSet;
use crate::tokens::TokenRegistry;

/// Receives `(relative_path, content)` for each kept text file
pub type ContentSink<'a> = &'a mut dyn FnMut(&str, &str);

/// Shared flag checked between file visits
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Result of a discovery run
#[derive(Debug, Clone, Default)]
pub struct Discovery {
    pub files: FileRecords,
    pub stats: DiscoveryStats,
}

/// Discovery with the built-in token providers
pub fn discover(
    root: &Path,
    config: &DiscoverConfig,
    sink: Option<ContentSink<'_>>,
) -> Result<Discovery, DiscoveryError> {
    Discoverer::new(config.clone()).run(root, sink)
}

/// Configured discovery runner
#[derive(Debug, Clone)]
pub struct Discoverer {
    config: DiscoverConfig,
    registry: TokenRegistry,
    cancel: Option<CancelFlag>,
}

impl Discoverer {
    pub fn new(config: DiscoverConfig) -> Self {
        Self {
            config,
            registry: TokenRegistry::with_builtin(),
            cancel: None,
        }
    }

    /// Use a custom token registry instead of the built-in one
    pub fn with_registry(mut self, registry: TokenRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_cancel(mut self, flag: CancelFlag) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn config(&self) -> &DiscoverConfig {
        &self.config
    }

    /// Run one traversal of `root`.
    ///
    /// Configuration (token models) is validated before the filesystem is
    /// touched. Per-file problems never fail the run.
    pub fn run(
        &self,
        root: &Path,
        mut sink: Option<ContentSink<'_>>,
    ) -> Result<Discovery, DiscoveryError> {
        let models = self.registry.resolve_all(&self.config.token_models)?;

        let meta = std::fs::metadata(root).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                DiscoveryError::RootNotFound(root.to_path_buf())
            } else {
                DiscoveryError::Io {
                    path: root.to_path_buf(),
                    source,
                }
            }
        })?;
        if !meta.is_dir() {
            return Err(DiscoveryError::RootNotFound(root.to_path_buf()));
        }

        let resolver = PatternResolver::from_root(root, &self.config.patterns);
        let classifier = create_classifier(self.config.classifier);
        debug!(
            root = %root.display(),
            patterns = resolver.len(),
            classifier = classifier.name(),
            selection = %self.config.selection,
            "starting discovery"
        );

        let run = Run {
            config: &self.config,
            resolver: &resolver,
            classifier: classifier.as_ref(),
            models: &models,
            cancel: self.cancel.as_ref(),
        };

        let mut stats = DiscoveryStats::new(classifier.name());
        let mut files = FileRecords::new();
        let mut pending: Vec<(String, PathBuf)> = Vec::new();
        let mut visited = 0usize;

        for (rel, path) in walk(root, &self.config, &resolver) {
            if run.cancelled() {
                return Err(DiscoveryError::Cancelled { visited });
            }
            visited += 1;
            match sink.as_deref_mut() {
                Some(sink) => {
                    let outcome = run.process(&rel, &path, Some(sink));
                    merge(outcome, &mut files, &mut stats);
                }
                None => pending.push((rel, path)),
            }
        }

        for outcome in run.process_batch(&pending) {
            match outcome {
                Some(outcome) => merge(outcome, &mut files, &mut stats),
                None => return Err(DiscoveryError::Cancelled { visited }),
            }
        }

        stats.files_visited = visited;
        stats.files_kept = files.len();
        stats.capture_patterns(&resolver);

        info!(
            visited = stats.files_visited,
            kept = stats.files_kept,
            selection = %self.config.selection,
            "discovery finished"
        );
        Ok(Discovery { files, stats })
    }
}

/// Everything produced for one visited file
#[derive(Debug, Default)]
struct FileOutcome {
    record: Option<FileRecord>,
    binary_extension: Option<String>,
    binary_blocked: bool,
    token_failures: Vec<ProviderError>,
    content_skipped: bool,
    content_truncated: bool,
}

fn merge(outcome: FileOutcome, files: &mut FileRecords, stats: &mut DiscoveryStats) {
    if let Some(ext) = &outcome.binary_extension {
        stats.note_binary(ext, outcome.binary_blocked);
    }
    for failure in &outcome.token_failures {
        stats.note_token_failure(&failure.model);
    }
    if outcome.content_skipped {
        stats.content_skipped += 1;
    }
    if outcome.content_truncated {
        stats.content_truncated += 1;
    }
    if let Some(record) = outcome.record {
        files.insert(record.relative_path.clone(), record);
    }
}

/// Regular files under `root`, sorted by name, as (relative, absolute).
///
/// In `included` mode excluded directories are not descended into.
fn walk<'r>(
    root: &'r Path,
    config: &'r DiscoverConfig,
    resolver: &'r PatternResolver,
) -> impl Iterator<Item = (String, PathBuf)> + 'r {
    let prune = config.selection == SelectionMode::Included;
    let mut walker = WalkDir::new(root).follow_links(false).sort_by_file_name();
    if let Some(max_depth) = config.max_depth {
        // walkdir counts the root as 0 and root-level files as 1
        walker = walker.max_depth(max_depth + 1);
    }

    let mut entries = walker.into_iter();
    std::iter::from_fn(move || loop {
        let entry = match entries.next()? {
            Ok(entry) => entry,
            Err(e) => {
                debug!(error = %e, "skipping unreadable entry");
                continue;
            }
        };
        if entry.depth() == 0 {
            continue;
        }
        let Some(rel) = make_relative(entry.path(), root) else {
            continue;
        };

        let file_type = entry.file_type();
        if file_type.is_dir() {
            if prune && resolver.is_ignored(&rel, true) {
                debug!(path = %rel, "pruning excluded directory");
                entries.skip_current_dir();
            }
            continue;
        }
        let is_file = file_type.is_file() || (file_type.is_symlink() && entry.path().is_file());
        if !is_file {
            continue;
        }
        return Some((rel, entry.into_path()));
    })
}

/// Borrowed state of one run
struct Run<'a> {
    config: &'a DiscoverConfig,
    resolver: &'a PatternResolver,
    classifier: &'a dyn BinaryClassifier,
    models: &'a ModelSet,
    cancel: Option<&'a CancelFlag>,
}

impl Run<'_> {
    fn cancelled(&self) -> bool {
        self.cancel.map(CancelFlag::is_cancelled).unwrap_or(false)
    }

    /// Process collected files, on the rayon pool when available.
    ///
    /// A `None` entry means the run was cancelled.
    fn process_batch(&self, batch: &[(String, PathBuf)]) -> Vec<Option<FileOutcome>> {
        let step = |(rel, path): &(String, PathBuf)| {
            if self.cancelled() {
                None
            } else {
                Some(self.process(rel, path, None))
            }
        };

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            batch.par_iter().map(step).collect()
        }

        #[cfg(not(feature = "parallel"))]
        {
            batch.iter().map(step).collect()
        }
    }

    /// Decide, filter and measure one file
    fn process(&self, rel: &str, path: &Path, sink: Option<ContentSink<'_>>) -> FileOutcome {
        let decision = self.decide(rel, path);
        let binary_blocked = decision.is_binary && !self.config.include_binary;
        let mut outcome = FileOutcome {
            binary_extension: decision.is_binary.then(|| extension(rel)),
            binary_blocked,
            ..Default::default()
        };

        if !self.config.selection.keeps(decision.is_ignored) {
            return outcome;
        }

        let mut record = FileRecord::new(rel, 0).with_binary(decision.is_binary);
        record.reasons = decision.reasons;

        match std::fs::metadata(path) {
            Ok(meta) => {
                record.size = meta.len();
                if !decision.is_binary {
                    self.consume_content(rel, path, &mut record, &mut outcome, sink);
                }
            }
            Err(e) => {
                debug!(path = %rel, error = %e, "cannot stat file");
                record.flags.insert(FLAG_UNREADABLE.to_string());
            }
        }

        if self.config.include_dates {
            let (created, modified) = file_dates(path);
            record.created = created;
            record.modified = modified;
        }

        outcome.record = Some(record);
        outcome
    }

    /// Combine pattern rules and binary classification
    fn decide(&self, rel: &str, path: &Path) -> IgnoreDecision {
        let pattern = self.resolver.check(rel, false);
        let is_binary = self.classifier.is_binary(path, self.config.sample_size);

        let mut reasons = pattern.reasons;
        if is_binary && !self.config.include_binary {
            reasons.push(Reason::Binary);
        }
        IgnoreDecision {
            is_ignored: !reasons.is_empty(),
            is_binary,
            matched_patterns: pattern.matched_patterns,
            reasons,
        }
    }

    /// Read a kept text file once for token counting and the sink
    fn consume_content(
        &self,
        rel: &str,
        path: &Path,
        record: &mut FileRecord,
        outcome: &mut FileOutcome,
        sink: Option<ContentSink<'_>>,
    ) {
        if self.models.is_empty() && sink.is_none() {
            return;
        }

        let read = read_file_with_config(path, &self.config.read);
        if read.io_error {
            debug!(path = %rel, reason = ?read.skip_reason, "cannot read file");
            record.size = 0;
            record.flags.insert(FLAG_UNREADABLE.to_string());
            return;
        }
        let Some(content) = read.content else {
            warn!(path = %rel, reason = ?read.skip_reason, "content skipped by read policy");
            record.flags.insert(FLAG_CONTENT_SKIPPED.to_string());
            outcome.content_skipped = true;
            return;
        };
        if read.truncated {
            debug!(path = %rel, "content truncated by read policy");
            record.flags.insert(FLAG_TRUNCATED.to_string());
            outcome.content_truncated = true;
        }

        let (tokens, failures) = self.models.count_all(&content);
        for failure in &failures {
            warn!(path = %rel, model = %failure.model, error = %failure.message, "token count failed");
        }
        record.tokens = tokens;
        outcome.token_failures = failures;

        if let Some(sink) = sink {
            sink(rel, &content);
        }
    }
}
