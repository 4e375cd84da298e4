//! Core module - Contains the fundamental data structures and utilities
//!
//! This module provides:
//! - Shared data model (FileRecord, IgnoreDecision, SelectionMode)
//! - Error types and configuration
//! - Rendering functions for JSON output
//! - Path normalization utilities
//! - File reading strategies

pub mod config;
pub mod error;
pub mod file_reader;
pub mod logging;
pub mod model;
pub mod paths;
pub mod render;
pub mod util;
