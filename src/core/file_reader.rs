//! Unified file reading strategies
//!
//! Provides consistent handling for:
//! - Non-UTF-8 files
//! - Oversized files
//!
//! Discovery reads each kept text file through here exactly once; the
//! returned content feeds the token counters and the content sink.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Read;
use std::path::Path;

/// Default maximum file size in bytes (5 MB)
pub const DEFAULT_MAX_FILE_SIZE: u64 = 5 * 1024 * 1024;

/// Default truncation size in bytes (64 KB)
pub const DEFAULT_TRUNCATE_SIZE: usize = 64 * 1024;

/// Strategy for handling non-UTF-8 content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodingStrategy {
    /// Skip non-UTF-8 files entirely
    Skip,
    /// Use lossy conversion (replace invalid bytes with U+FFFD)
    #[default]
    Lossy,
}

/// Strategy for handling oversized files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeStrategy {
    /// Skip files exceeding size limit
    Skip,
    /// Truncate content and mark as truncated
    Truncate,
    /// Read entire file regardless of size
    #[default]
    Full,
}

/// Configuration for file reading
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileReadConfig {
    /// Maximum file size to process (bytes)
    pub max_file_size: u64,

    /// Size at which to truncate content (bytes)
    pub truncate_size: usize,

    /// How to handle non-UTF-8 content
    pub encoding_strategy: EncodingStrategy,

    /// How to handle oversized files
    pub size_strategy: SizeStrategy,
}

impl Default for FileReadConfig {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            truncate_size: DEFAULT_TRUNCATE_SIZE,
            encoding_strategy: EncodingStrategy::Lossy,
            size_strategy: SizeStrategy::Full,
        }
    }
}

/// Result of reading a file
#[derive(Debug, Clone, Default)]
pub struct FileReadResult {
    /// The file content (if successfully read)
    pub content: Option<String>,

    /// Whether the content was truncated
    pub truncated: bool,

    /// Whether lossy conversion was used
    pub lossy_conversion: bool,

    /// Whether reading failed at the I/O level (as opposed to a policy skip)
    pub io_error: bool,

    /// Reason for skipping (if skipped)
    pub skip_reason: Option<String>,
}

impl FileReadResult {
    /// Create a successful read result
    pub fn success(content: String) -> Self {
        Self {
            content: Some(content),
            ..Default::default()
        }
    }

    /// Create a result skipped by policy (size, encoding)
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self {
            skip_reason: Some(reason.into()),
            ..Default::default()
        }
    }

    /// Create a result for an I/O failure
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            io_error: true,
            skip_reason: Some(reason.into()),
            ..Default::default()
        }
    }

    /// Mark as truncated
    pub fn with_truncated(mut self) -> Self {
        self.truncated = true;
        self
    }

    /// Mark as lossy conversion
    pub fn with_lossy(mut self) -> Self {
        self.lossy_conversion = true;
        self
    }

    pub fn is_skipped(&self) -> bool {
        self.content.is_none()
    }
}

/// Read a file with the given configuration
pub fn read_file_with_config(path: &Path, config: &FileReadConfig) -> FileReadResult {
    let metadata = match fs::metadata(path) {
        Ok(m) => m,
        Err(e) => return FileReadResult::failed(format!("Cannot read metadata: {}", e)),
    };

    let file_size = metadata.len();
    if config.size_strategy == SizeStrategy::Skip && file_size > config.max_file_size {
        return FileReadResult::skipped(format!(
            "File size {} exceeds limit {}",
            file_size, config.max_file_size
        ));
    }

    let bytes = match read_file_bytes(path, config) {
        Ok(b) => b,
        Err(e) => return FileReadResult::failed(format!("Cannot read file: {}", e)),
    };

    let (content, lossy) = match String::from_utf8(bytes) {
        Ok(content) => (content, false),
        Err(err) => match config.encoding_strategy {
            EncodingStrategy::Skip => return FileReadResult::skipped("Invalid UTF-8"),
            EncodingStrategy::Lossy => (
                String::from_utf8_lossy(err.as_bytes()).into_owned(),
                true,
            ),
        },
    };

    let truncate =
        config.size_strategy == SizeStrategy::Truncate && content.len() > config.truncate_size;
    let mut result = if truncate {
        FileReadResult::success(truncate_at_char_boundary(&content, config.truncate_size))
            .with_truncated()
    } else {
        FileReadResult::success(content)
    };
    if lossy {
        result = result.with_lossy();
    }
    result
}

/// Read file bytes with size handling
fn read_file_bytes(path: &Path, config: &FileReadConfig) -> std::io::Result<Vec<u8>> {
    let file = fs::File::open(path)?;
    let file_size = file.metadata()?.len() as usize;

    let read_size = match config.size_strategy {
        SizeStrategy::Truncate => std::cmp::min(file_size, config.truncate_size + 1024),
        SizeStrategy::Skip | SizeStrategy::Full => file_size,
    };

    let mut reader = std::io::BufReader::new(file);
    let mut buffer = Vec::with_capacity(read_size);

    if read_size < file_size {
        reader.take(read_size as u64).read_to_end(&mut buffer)?;
    } else {
        reader.read_to_end(&mut buffer)?;
    }

    Ok(buffer)
}

/// Truncate string at a valid UTF-8 character boundary
fn truncate_at_char_boundary(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }

    let mut end = max_len;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }

    s[..end].to_string()
}

/// Read a sample of at most `limit` bytes from the start of a file
pub fn read_sample(path: &Path, limit: usize) -> std::io::Result<Vec<u8>> {
    let file = fs::File::open(path)?;
    let mut buffer = Vec::with_capacity(limit.min(8192));
    file.take(limit as u64).read_to_end(&mut buffer)?;
    Ok(buffer)
}
