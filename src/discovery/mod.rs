//! Discovery module - decides which files of a tree are visible
//!
//! - `patterns`: layered gitignore-style rules with provenance
//! - `binary`: binary/text classification strategies
//! - `discoverer`: the single traversal producing `FileRecord`s
//! - `stats`: what the traversal saw, for reporting

pub mod binary;
pub mod discoverer;
pub mod extensions;
pub mod patterns;
pub mod stats;

pub use discoverer::{discover, CancelFlag, ContentSink, Discoverer, Discovery};
pub use patterns::{PatternResolver, RuleGroups};
pub use stats::DiscoveryStats;
