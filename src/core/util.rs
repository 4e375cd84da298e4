//! Common utilities

use chrono::{DateTime, Local};
use std::path::Path;
use std::time::SystemTime;

/// Get file size in bytes
pub fn get_file_size(path: &Path) -> std::io::Result<u64> {
    let metadata = std::fs::metadata(path)?;
    Ok(metadata.len())
}

/// Format a filesystem timestamp as YYYY-MM-DD in local time
pub fn format_date(time: SystemTime) -> String {
    let datetime: DateTime<Local> = time.into();
    datetime.format("%Y-%m-%d").to_string()
}

/// Creation and modification dates of a file, when the platform reports them
pub fn file_dates(path: &Path) -> (Option<String>, Option<String>) {
    match std::fs::metadata(path) {
        Ok(metadata) => (
            metadata.created().ok().map(format_date),
            metadata.modified().ok().map(format_date),
        ),
        Err(_) => (None, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};

    #[test]
    fn test_get_file_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ten.txt");
        std::fs::write(&path, "0123456789").unwrap();
        assert_eq!(get_file_size(&path).unwrap(), 10);
        assert!(get_file_size(&dir.path().join("missing")).is_err());
    }

    #[test]
    fn test_format_date_shape() {
        let date = format_date(UNIX_EPOCH + Duration::from_secs(86_400 * 365));
        assert_eq!(date.len(), 10);
        assert_eq!(&date[4..5], "-");
        assert_eq!(&date[7..8], "-");
    }

    #[test]
    fn test_file_dates_modified_present() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        std::fs::write(&path, "a").unwrap();
        let (_, modified) = file_dates(&path);
        assert!(modified.is_some());
        assert_eq!(file_dates(&dir.path().join("missing")), (None, None));
    }
}
