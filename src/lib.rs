//! siftree - ignore resolution and aggregated file trees
//!
//! siftree decides which files of a directory tree a downstream consumer
//! (summarizer, statistics reporter, tree renderer) should see, and keeps
//! size and per-model token totals over that decision.
//!
//! ```no_run
//! use siftree::core::config::DiscoverConfig;
//! use siftree::discovery::discover;
//! use siftree::tree::FileTree;
//!
//! let config = DiscoverConfig::default().with_models(["chars-4"]);
//! let discovery = discover(std::path::Path::new("."), &config, None)?;
//! let tree = FileTree::build(&discovery.files);
//! println!("{} bytes", tree.size(tree.root()));
//! # Ok::<(), siftree::core::error::DiscoveryError>(())
//! ```

pub mod cli;
pub mod commands;
pub mod core;
pub mod discovery;
pub mod tokens;
pub mod tree;
