//! Destination directory lifecycle.

use std::path::Path;

use tracing::info;

use crate::error::{ExtractError, Result};

/// Create `dir` if needed and remove everything inside it.
pub fn prepare_output_dir(dir: &Path) -> Result<()> {
    let context = || dir.display().to_string();

    std::fs::create_dir_all(dir).map_err(|e| ExtractError::io(context(), e))?;
    info!(path = %dir.display(), "Created directory");

    for entry in std::fs::read_dir(dir).map_err(|e| ExtractError::io(context(), e))? {
        let entry = entry.map_err(|e| ExtractError::io(context(), e))?;
        let path = entry.path();
        let file_type = entry
            .file_type()
            .map_err(|e| ExtractError::io(path.display().to_string(), e))?;
        let removed = if file_type.is_dir() {
            std::fs::remove_dir_all(&path)
        } else {
            std::fs::remove_file(&path)
        };
        removed.map_err(|e| ExtractError::io(path.display().to_string(), e))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_creates_missing_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("a").join("b");
        prepare_output_dir(&out).unwrap();
        assert!(out.is_dir());
    }

    #[test]
    fn test_empties_existing_directory() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("test1.eml"), b"old").unwrap();
        std::fs::create_dir(tmp.path().join("nested")).unwrap();
        std::fs::write(tmp.path().join("nested").join("x"), b"old").unwrap();

        prepare_output_dir(tmp.path()).unwrap();

        assert!(tmp.path().is_dir());
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
    }
}
