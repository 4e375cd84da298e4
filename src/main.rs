//! siftree - decide which files of a tree matter, and measure them
//!
//! siftree provides:
//! - Layered ignore rules (defaults, caller patterns, .gitignore files)
//! - Binary detection by content signature or heuristics
//! - Per-model token counts and aggregated directory totals
//! - Machine-readable output (jsonl/json)

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = siftree::cli::Cli::parse();
    siftree::cli::run(cli)
}
