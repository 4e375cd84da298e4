//! CLI module - Command-line interface definitions and handlers

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::core::config::{ClassifierKind, DiscoverConfig, PatternConfig};
use crate::core::logging::{init_tracing, Verbosity};
use crate::core::model::SelectionMode;
use crate::core::render::{OutputFormat, RenderConfig};

/// siftree - decide which files of a tree matter, and measure them.
#[derive(Parser, Debug)]
#[command(name = "siftree")]
#[command(
    author,
    version,
    about,
    long_about = r#"siftree walks a directory once, applies layered ignore rules
(built-in defaults, --ignore patterns, .gitignore files found in the tree) and
binary detection, and reports what is left as machine-readable JSON.

Output formats:
- jsonl: one JSON object per line (best for piping into tools/LLMs)
- json: a single JSON array (or object, for `stats`)

Examples:
    siftree discover --model gpt-4o
    siftree discover --select removed
    siftree stats --model chars-4
    siftree tree --max-depth 2
    siftree summarize --output summary.txt
"#
)]
pub struct Cli {
    /// Root directory to scan.
    #[arg(
        long,
        global = true,
        default_value = ".",
        value_name = "ROOT",
        long_help = "Root directory to scan (defaults to the current directory).\n\n\
All paths emitted in results are relative to this root and use '/' separators."
    )]
    pub root: PathBuf,

    /// Output format (jsonl/json).
    #[arg(
        long,
        global = true,
        default_value = "jsonl",
        value_name = "FORMAT",
        value_parser = ["jsonl", "json"]
    )]
    pub format: String,

    /// Quiet mode (errors only on stderr).
    #[arg(
        short,
        long,
        global = true,
        long_help = "Only log errors. Results are still printed to stdout.\n\n\
SIFTREE_LOG, when set, overrides this."
    )]
    pub quiet: bool,

    /// Verbose mode (debug logging on stderr).
    #[arg(
        short,
        long,
        global = true,
        long_help = "Log debug diagnostics to stderr: pruned directories, skipped files,\n\
unreadable ignore files. SIFTREE_LOG, when set, overrides this."
    )]
    pub verbose: bool,

    /// Pretty-print JSON/JSONL output with indentation.
    #[arg(long, global = true)]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Emit one record per selected file.
    #[command(
        long_about = "Walk ROOT once and emit one record per selected file: relative path,\n\
size, binary flag, flags, token counts per --model, and, for ignored files,\n\
the reasons they were excluded.\n\n\
Examples:\n\
  siftree discover\n\
  siftree discover --select all --include-binary\n\
  siftree discover --ignore 'docs/**' --model gpt-4o --model chars-4\n"
    )]
    Discover {
        #[command(flatten)]
        args: DiscoverArgs,
    },

    /// Report discovery statistics and aggregate totals.
    #[command(
        long_about = "Run discovery and print a single JSON object with the active patterns by\n\
origin, per-pattern hit counts, binary extensions seen and blocked, the\n\
classifier used, aggregate size/tokens of the root, and per-extension totals.\n\n\
Example:\n\
  siftree stats --model chars-4 --pretty\n"
    )]
    Stats {
        #[command(flatten)]
        args: DiscoverArgs,
    },

    /// Emit one line per tree node with aggregated size and tokens.
    #[command(
        long_about = "Run discovery, build the aggregate tree, and emit one record per node\n\
(directories included) in pre-order with aggregated size and token counts.\n\n\
Example:\n\
  siftree tree --model estimate\n"
    )]
    Tree {
        #[command(flatten)]
        args: DiscoverArgs,
    },

    /// Stream the content of every selected text file.
    #[command(
        long_about = "Run discovery once and stream each selected text file as a `path:`\n\
header followed by its content between delimiter lines. Binary files and\n\
empty files are skipped. The output file, when inside ROOT, is never part\n\
of its own input.\n\n\
Examples:\n\
  siftree summarize > summary.txt\n\
  siftree summarize --output summary.txt --delimiter '~~~'\n"
    )]
    Summarize {
        #[command(flatten)]
        args: DiscoverArgs,

        /// Write to this file instead of stdout.
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Line fencing each file's content.
        #[arg(long, default_value = crate::commands::DEFAULT_DELIMITER, value_name = "TEXT")]
        delimiter: String,
    },
}

/// Flags shared by every command that runs discovery
#[derive(Args, Debug, Clone)]
pub struct DiscoverArgs {
    /// Which files to keep (included/removed/all).
    #[arg(
        long,
        default_value = "included",
        value_name = "MODE",
        value_parser = ["included", "removed", "all"],
        long_help = "Which files to keep:\n\
- included (default): files that are not ignored\n\
- removed: only files that are ignored (shows why)\n\
- all: every file, ignored or not"
    )]
    pub select: String,

    /// Extra ignore pattern (repeatable, gitignore syntax).
    #[arg(long = "ignore", value_name = "PATTERN")]
    pub ignore: Vec<String>,

    /// Do not apply the built-in default patterns.
    #[arg(long)]
    pub no_defaults: bool,

    /// Do not read ignore files found in the tree.
    #[arg(long)]
    pub no_ignore_files: bool,

    /// Ignore file name to read (repeatable, default: .gitignore).
    #[arg(long = "ignore-file", value_name = "NAME")]
    pub ignore_files: Vec<String>,

    /// Keep binary files instead of excluding them.
    #[arg(long)]
    pub include_binary: bool,

    /// Binary detection strategy (auto/signature/heuristic).
    #[arg(
        long,
        default_value = "auto",
        value_name = "KIND",
        value_parser = ["auto", "signature", "heuristic"]
    )]
    pub classifier: String,

    /// Deepest file depth to visit (root-level files are depth 0).
    #[arg(long, value_name = "N")]
    pub max_depth: Option<usize>,

    /// Model to count tokens for (repeatable).
    #[arg(
        long = "model",
        value_name = "NAME",
        env = "SIFTREE_MODELS",
        value_delimiter = ',',
        long_help = "Model to count tokens for. Repeatable; SIFTREE_MODELS takes a comma\n\
separated list.\n\n\
Built-in prefixes:\n\
- gpt-*, o1*, o3*, o4*, cl100k*, o200k*: tiktoken (local)\n\
- chars-N: N characters per token, rounded up\n\
- estimate: fast heuristic\n\n\
An unknown model name is an error."
    )]
    pub models: Vec<String>,

    /// Include creation/modification dates.
    #[arg(long)]
    pub dates: bool,
}

impl DiscoverArgs {
    /// Map the flags onto a discovery configuration
    pub fn to_config(&self) -> Result<DiscoverConfig> {
        let selection: SelectionMode = self.select.parse()?;
        let classifier: ClassifierKind = self.classifier.parse()?;

        let mut patterns = PatternConfig {
            use_defaults: !self.no_defaults,
            user_patterns: self.ignore.clone(),
            read_ignore_files: !self.no_ignore_files,
            ..Default::default()
        };
        if !self.ignore_files.is_empty() {
            patterns.ignore_file_names = self.ignore_files.clone();
        }

        Ok(DiscoverConfig {
            patterns,
            include_binary: self.include_binary,
            classifier,
            selection,
            max_depth: self.max_depth,
            token_models: self.models.clone(),
            include_dates: self.dates,
            ..Default::default()
        })
    }
}

pub fn run(cli: Cli) -> Result<()> {
    init_tracing(Verbosity::from_flags(cli.verbose, cli.quiet));

    let format: OutputFormat = cli.format.parse().unwrap_or_default();
    let render_config = RenderConfig::with_pretty(format, cli.pretty);

    // Get absolute root path
    let root = cli.root.canonicalize().unwrap_or(cli.root);

    match cli.command {
        Commands::Discover { args } => {
            let config = args.to_config().context("invalid discovery options")?;
            crate::commands::run_discover(&root, &config, render_config)
        }
        Commands::Stats { args } => {
            let config = args.to_config().context("invalid discovery options")?;
            crate::commands::run_stats(&root, &config, render_config)
        }
        Commands::Tree { args } => {
            let config = args.to_config().context("invalid discovery options")?;
            crate::commands::run_tree(&root, &config, render_config)
        }
        Commands::Summarize {
            args,
            output,
            delimiter,
        } => {
            let config = args.to_config().context("invalid discovery options")?;
            crate::commands::run_summarize(&root, &config, output.as_deref(), &delimiter)
        }
    }
}
