use crate::error::{FileprobeError, Result};
use filetime::FileTime;
use std::fs::OpenOptions;
use std::path::Path;
use tracing::debug;

/// Sets the access and modification times of `path` to now, creating an
/// empty file if nothing exists there yet.
///
/// # Errors
///
/// Returns `InvalidInput` for an empty path and `Io` if the file cannot be
/// created or its times cannot be changed.
pub fn touch(path: &Path) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Err(FileprobeError::InvalidInput(
            "path cannot be empty".to_string(),
        ));
    }

    if path.exists() {
        let now = FileTime::now();
        filetime::set_file_times(path, now, now)?;
        debug!(path = %path.display(), "updated timestamps");
    } else {
        OpenOptions::new().write(true).create(true).open(path)?;
        debug!(path = %path.display(), "created empty file");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_touch_creates_empty_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("delete.this");

        touch(&path).unwrap();
        assert!(path.exists());
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 0);
    }

    #[test]
    fn test_touch_advances_mtime_keeps_size() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test_file_touch.txt");
        std::fs::write(&path, "line 0\nline 1\n").unwrap();

        // Backdate so "now" is strictly later regardless of timestamp resolution
        let past = FileTime::from_unix_time(1_000_000_000, 0);
        filetime::set_file_times(&path, past, past).unwrap();
        let before = std::fs::metadata(&path).unwrap();

        touch(&path).unwrap();
        let after = std::fs::metadata(&path).unwrap();

        assert_eq!(after.len(), before.len());
        assert!(FileTime::from_last_modification_time(&after) > FileTime::from_last_modification_time(&before));
        assert!(FileTime::from_last_access_time(&after) > past);
    }

    #[test]
    fn test_touch_empty_path() {
        assert!(matches!(
            touch(Path::new("")),
            Err(FileprobeError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_touch_missing_parent() {
        let dir = TempDir::new().unwrap();
        let result = touch(&dir.path().join("no/such/dir/file"));
        assert!(matches!(result, Err(FileprobeError::Io(_))));
    }
}
