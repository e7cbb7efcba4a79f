use crate::errors::PathError;
use std::path::{Path, PathBuf};

/// Creates `path` if missing and returns its canonical form.
pub fn ensure_dir(path: &Path) -> Result<PathBuf, PathError> {
    match std::fs::metadata(path) {
        Ok(metadata) if !metadata.is_dir() => {
            return Err(PathError::NotADirectory(path.display().to_string()));
        }
        Ok(_) => {}
        Err(_e) => std::fs::create_dir_all(path)?,
    }

    Ok(std::fs::canonicalize(path)?)
}

/// Writes `bytes` to a new file; existing files are left alone.
pub fn write_new_file(path: &Path, bytes: &[u8]) -> Result<(), PathError> {
    if path.exists() {
        return Err(PathError::Exists(path.display().to_string()));
    }
    Ok(std::fs::write(path, bytes)?)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_ensure_dir_creates_missing() {
        let root = tempfile::tempdir().unwrap();
        let nested = root.path().join("a/b");
        let resolved = ensure_dir(&nested).unwrap();
        assert!(resolved.is_dir());
    }

    #[test]
    fn test_ensure_dir_rejects_files() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(matches!(
            ensure_dir(file.path()),
            Err(PathError::NotADirectory(_))
        ));
    }

    #[test]
    fn test_write_new_file_refuses_overwrite() {
        let root = tempfile::tempdir().unwrap();
        let target = root.path().join("leaf.jpg");
        write_new_file(&target, b"one").unwrap();
        assert!(matches!(
            write_new_file(&target, b"two"),
            Err(PathError::Exists(_))
        ));
        assert_eq!(std::fs::read(&target).unwrap(), b"one");
    }
}
