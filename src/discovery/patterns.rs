//! Layered ignore patterns
//!
//! Rules come in three groups, combined in precedence order: built-in
//! defaults, caller patterns, then patterns read from ignore files found in
//! the tree (root first, deeper directories next). Among all rules matching a
//! path the last one wins. A negated rule can re-include a path, but never one
//! whose ancestor directory is itself excluded.
//!
//! Matching is done with a single `GlobSet` so one pass over the set yields
//! every matching rule, which is what provenance and hit counting need.

use globset::{Candidate, GlobBuilder, GlobSet, GlobSetBuilder};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::core::config::PatternConfig;
use crate::core::model::{Origin, Reason};
use crate::core::paths::{ancestors, make_relative};

/// Patterns that are always ignored unless defaults are disabled
pub const DEFAULT_IGNORE_PATTERNS: &[&str] = &[
    ".git",
    ".env",
    ".env.local",
    ".env.*.local",
    "node_modules",
    "__pycache__",
    "*.pyc",
    "*.pyo",
    ".pytest_cache",
    ".coverage",
    "*.log",
    ".DS_Store",
    "Thumbs.db",
    ".vscode",
    ".idea",
    "*.swp",
    "*.swo",
    "*~",
];

/// Ignore file names read from the tree by default
pub const DEFAULT_IGNORE_FILES: &[&str] = &[".gitignore"];

/// One ignore rule as written, with its provenance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternRule {
    pub origin: Origin,
    /// Pattern body without the leading '!'; discovered rules carry their
    /// directory prefix already applied
    pub text: String,
    pub negated: bool,
    /// Relative directory of the ignore file a discovered rule came from
    pub base: String,
}

impl PatternRule {
    /// Parse one ignore-file line.
    ///
    /// Returns `None` for blank lines and comments.
    pub fn parse(origin: Origin, line: &str) -> Option<Self> {
        let line = trim_line(line);
        if line.is_empty() || line.starts_with('#') {
            return None;
        }
        let (negated, body) = match line.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, line),
        };
        Some(Self {
            origin,
            text: body.to_string(),
            negated,
            base: String::new(),
        })
    }

    /// Parse a line from an ignore file located in `base`.
    ///
    /// The pattern is scoped to that directory: `foo` in `sub/` becomes
    /// `sub/foo`. Root-level files (`base` empty) add no prefix.
    pub fn discovered(base: &str, line: &str) -> Option<Self> {
        let mut rule = Self::parse(Origin::Discovered, line)?;
        if !base.is_empty() {
            rule.text = format!("{}/{}", base, rule.text.trim_start_matches('/'));
            rule.base = base.to_string();
        }
        Some(rule)
    }

    /// The rule as it would be written in an ignore file
    pub fn display(&self) -> String {
        if self.negated {
            format!("!{}", self.text)
        } else {
            self.text.clone()
        }
    }
}

/// Strip line endings and unescaped trailing whitespace
fn trim_line(line: &str) -> &str {
    let line = line.trim_start().trim_end_matches(['\r', '\n']);
    let trimmed = line.trim_end();
    if trimmed.ends_with('\\') && trimmed.len() < line.len() {
        &line[..trimmed.len() + 1]
    } else {
        trimmed
    }
}

/// Rule groups in precedence order
#[derive(Debug, Clone, Default)]
pub struct RuleGroups {
    pub defaults: Vec<PatternRule>,
    pub user: Vec<PatternRule>,
    pub discovered: Vec<PatternRule>,
}

impl RuleGroups {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the built-in default patterns
    pub fn with_defaults(mut self) -> Self {
        self.defaults = DEFAULT_IGNORE_PATTERNS
            .iter()
            .filter_map(|p| PatternRule::parse(Origin::Default, p))
            .collect();
        self
    }

    /// Add caller-supplied patterns
    pub fn with_user<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.user.extend(
            patterns
                .into_iter()
                .filter_map(|p| PatternRule::parse(Origin::User, p.as_ref())),
        );
        self
    }

    /// Add the lines of one ignore file found in directory `base`
    pub fn with_ignore_file(mut self, base: &str, content: &str) -> Self {
        self.push_ignore_file(base, content);
        self
    }

    fn push_ignore_file(&mut self, base: &str, content: &str) {
        self.discovered.extend(
            content
                .lines()
                .filter_map(|line| PatternRule::discovered(base, line)),
        );
    }

    /// Read every ignore file under `root`, root first then deeper directories
    pub fn with_ignore_files_from(mut self, root: &Path, names: &[String]) -> Self {
        for (base, path) in find_ignore_files(root, names) {
            match fs::read_to_string(&path) {
                Ok(content) => self.push_ignore_file(&base, &content),
                Err(e) => debug!(path = %path.display(), error = %e, "skipping unreadable ignore file"),
            }
        }
        self
    }

    /// Build the groups described by a pattern configuration
    pub fn from_config(root: &Path, config: &PatternConfig) -> Self {
        let mut groups = Self::new();
        if config.use_defaults {
            groups = groups.with_defaults();
        }
        groups = groups.with_user(&config.user_patterns);
        if config.read_ignore_files {
            groups = groups.with_ignore_files_from(root, &config.ignore_file_names);
        }
        groups
    }

    /// All rules in precedence order
    pub fn ordered(&self) -> impl Iterator<Item = &PatternRule> {
        self.defaults
            .iter()
            .chain(self.user.iter())
            .chain(self.discovered.iter())
    }
}

/// Locate ignore files, ordered by directory depth then path
fn find_ignore_files(root: &Path, names: &[String]) -> Vec<(String, std::path::PathBuf)> {
    let mut found: Vec<(usize, String, std::path::PathBuf)> = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .file_name()
                .to_str()
                .map(|name| names.iter().any(|n| n == name))
                .unwrap_or(false)
        })
        .filter_map(|entry| {
            let dir = entry.path().parent()?;
            let base = make_relative(dir, root)?;
            Some((entry.depth(), base, entry.into_path()))
        })
        .collect();
    found.sort();
    found.into_iter().map(|(_, base, path)| (base, path)).collect()
}

struct CompiledPattern {
    rule: PatternRule,
    dir_only: bool,
    hits: AtomicUsize,
}

/// Hit statistics for one compiled pattern
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct PatternHits {
    pub origin: Origin,
    pub pattern: String,
    pub hits: usize,
}

/// Outcome of checking one path against the rule set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatternMatch {
    pub is_ignored: bool,
    /// Every rule matching the path itself, in precedence order
    pub matched_patterns: Vec<String>,
    pub reasons: Vec<Reason>,
    /// Index of the rule that decided the outcome, if any matched
    pub decided_by: Option<usize>,
}

/// Compiled, layered ignore rules
pub struct PatternResolver {
    patterns: Vec<CompiledPattern>,
    set: GlobSet,
}

impl PatternResolver {
    /// Compile rule groups in precedence order.
    ///
    /// Rules that do not compile as globs are dropped with a warning.
    pub fn compile(groups: &RuleGroups) -> Self {
        let mut builder = GlobSetBuilder::new();
        let mut patterns = Vec::new();

        for rule in groups.ordered() {
            let Some((glob, dir_only)) = translate(&rule.text) else {
                warn!(pattern = %rule.display(), origin = %rule.origin, "dropping empty ignore pattern");
                continue;
            };
            match GlobBuilder::new(&glob)
                .literal_separator(true)
                .backslash_escape(true)
                .build()
            {
                Ok(compiled) => {
                    builder.add(compiled);
                    patterns.push(CompiledPattern {
                        rule: rule.clone(),
                        dir_only,
                        hits: AtomicUsize::new(0),
                    });
                }
                Err(e) => {
                    warn!(pattern = %rule.display(), origin = %rule.origin, error = %e, "dropping malformed ignore pattern");
                }
            }
        }

        let set = builder.build().unwrap_or_else(|e| {
            warn!(error = %e, "ignore patterns could not be combined; matching nothing");
            GlobSet::empty()
        });

        Self { patterns, set }
    }

    /// Collect and compile every rule a configuration asks for
    pub fn from_root(root: &Path, config: &PatternConfig) -> Self {
        Self::compile(&RuleGroups::from_config(root, config))
    }

    /// Number of active (compiled) patterns
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Active rules in precedence order
    pub fn rules(&self) -> impl Iterator<Item = &PatternRule> {
        self.patterns.iter().map(|p| &p.rule)
    }

    /// Indices of rules matching `path`, ascending
    fn matching(&self, path: &str, is_dir: bool) -> Vec<usize> {
        let candidate = Candidate::new(path);
        let mut indices: Vec<usize> = self
            .set
            .matches_candidate(&candidate)
            .into_iter()
            .filter(|&i| is_dir || !self.patterns[i].dir_only)
            .collect();
        indices.sort_unstable();
        indices
    }

    /// Decide whether a relative path is ignored.
    ///
    /// Ancestor directories are resolved first, outermost first; the first
    /// excluded ancestor decides. Otherwise the last rule matching the path
    /// itself decides. The root (`""`) is never ignored.
    pub fn check(&self, path: &str, is_dir: bool) -> PatternMatch {
        if path.is_empty() {
            return PatternMatch::default();
        }

        let own = self.matching(path, is_dir);
        let matched_patterns: Vec<String> = own
            .iter()
            .map(|&i| self.patterns[i].rule.display())
            .collect();

        for dir in ancestors(path) {
            if let Some(&last) = self.matching(dir, true).last() {
                let rule = &self.patterns[last].rule;
                if !rule.negated {
                    self.patterns[last].hits.fetch_add(1, Ordering::Relaxed);
                    return PatternMatch {
                        is_ignored: true,
                        matched_patterns,
                        reasons: vec![Reason::AncestorExcluded {
                            directory: dir.to_string(),
                            pattern: rule.display(),
                            origin: rule.origin,
                        }],
                        decided_by: Some(last),
                    };
                }
            }
        }

        match own.last() {
            Some(&last) => {
                self.patterns[last].hits.fetch_add(1, Ordering::Relaxed);
                let rule = &self.patterns[last].rule;
                let reasons = if rule.negated {
                    Vec::new()
                } else {
                    vec![Reason::Pattern {
                        pattern: rule.display(),
                        origin: rule.origin,
                    }]
                };
                PatternMatch {
                    is_ignored: !rule.negated,
                    matched_patterns,
                    reasons,
                    decided_by: Some(last),
                }
            }
            None => PatternMatch {
                matched_patterns,
                ..Default::default()
            },
        }
    }

    /// Shorthand for `check(path, is_dir).is_ignored`
    pub fn is_ignored(&self, path: &str, is_dir: bool) -> bool {
        self.check(path, is_dir).is_ignored
    }

    /// Active patterns grouped by origin, each group in precedence order
    pub fn patterns_by_origin(&self) -> BTreeMap<Origin, Vec<String>> {
        let mut grouped: BTreeMap<Origin, Vec<String>> = BTreeMap::new();
        for pattern in &self.patterns {
            grouped
                .entry(pattern.rule.origin)
                .or_default()
                .push(pattern.rule.display());
        }
        grouped
    }

    /// Per-pattern hit counts, in precedence order
    pub fn hit_counts(&self) -> Vec<PatternHits> {
        self.patterns
            .iter()
            .map(|p| PatternHits {
                origin: p.rule.origin,
                pattern: p.rule.display(),
                hits: p.hits.load(Ordering::Relaxed),
            })
            .collect()
    }
}

/// Turn a pattern body into a glob plus its directory-only flag.
///
/// A body without an interior slash matches at any depth; a leading slash
/// anchors it to the root and is removed; a trailing slash restricts the rule
/// to directories.
fn translate(body: &str) -> Option<(String, bool)> {
    let dir_only = body.ends_with('/') && !body.ends_with("\\/");
    let body = if dir_only { body.trim_end_matches('/') } else { body };
    let anchored = body.contains('/');
    let body = body.trim_start_matches('/');
    if body.is_empty() {
        return None;
    }
    let glob = if anchored || body.starts_with("**") {
        body.to_string()
    } else {
        format!("**/{}", body)
    };
    Some((glob, dir_only))
}
