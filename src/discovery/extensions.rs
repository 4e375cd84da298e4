//! Well-known binary file extensions

use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Lowercase extensions, without the dot, of formats that are never text
pub static BINARY_EXTENSIONS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        // Images
        "png", "jpg", "jpeg", "gif", "bmp", "ico", "tiff", "tif", "webp", "svg", "psd", "ai",
        "raw", "cr2", "nef", "orf", "sr2",
        // Video
        "mp4", "avi", "mkv", "mov", "wmv", "flv", "webm", "m4v", "mpg", "mpeg",
        // Audio
        "mp3", "wav", "flac", "aac", "ogg", "wma", "m4a", "opus",
        // Archives
        "zip", "tar", "gz", "bz2", "xz", "7z", "rar", "jar", "war", "ear",
        // Executables and libraries
        "exe", "dll", "so", "dylib", "bin", "o", "a", "lib", "pyc", "pyo", "pyd",
        // Office documents
        "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "odt", "ods", "odp",
        // Fonts
        "ttf", "otf", "woff", "woff2", "eot",
        // Databases
        "db", "sqlite", "sqlite3", "mdb",
        // Everything else
        "class", "dex", "apk", "ipa", "dmg", "iso", "img", "pickle", "pkl", "npy", "npz", "h5",
        "hdf5", "parquet", "avro", "orc", "wasm", "bc",
    ]
    .into_iter()
    .collect()
});

/// Whether a lowercase extension (no dot) names a known binary format
pub fn is_binary_extension(ext: &str) -> bool {
    BINARY_EXTENSIONS.contains(ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_extensions() {
        assert!(is_binary_extension("png"));
        assert!(is_binary_extension("wasm"));
        assert!(!is_binary_extension("rs"));
        assert!(!is_binary_extension(""));
    }
}
