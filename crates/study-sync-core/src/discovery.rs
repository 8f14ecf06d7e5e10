use log::debug;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::Config;
use crate::error::{Error, Result};

/// Fail with `NotADirectory` unless `path` is an existing directory
pub fn ensure_directory(path: &Path) -> Result<()> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(Error::NotADirectory(path.to_path_buf()))
    }
}

/// Every regular file below `root`, depth-first in file-name order
pub fn walk_files(root: &Path) -> Result<Vec<PathBuf>> {
    ensure_directory(root)?;

    let files = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!("Skipping unreadable entry under {}: {}", root.display(), e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .collect();

    Ok(files)
}

/// Files below `root` that may be DICOM, i.e. not on the skip list.
///
/// The list is fully collected before returning, so callers can move or
/// rewrite files without disturbing the walk.
pub fn discover_containers(root: &Path, config: &Config) -> Result<Vec<PathBuf>> {
    let files = walk_files(root)?
        .into_iter()
        .filter(|path| {
            let skipped = config.is_skipped(path);
            if skipped {
                debug!("Skipping non-DICOM file: {}", path.display());
            }
            !skipped
        })
        .collect();

    Ok(files)
}

// -- Tests --

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::io::Write;
    use tempfile::tempdir;

    fn create_test_file(dir: &Path, name: &str) -> PathBuf {
        let file_path = dir.join(name);
        let mut file = File::create(&file_path).unwrap();
        file.write_all(b"DUMMY DATA").unwrap();
        file_path
    }

    fn setup_test_directory() -> (tempfile::TempDir, Vec<PathBuf>) {
        let dir = tempdir().unwrap();

        let subdir_path = dir.path().join("subdir");
        fs::create_dir(&subdir_path).unwrap();

        let containers = vec![
            create_test_file(dir.path(), "IM0001"),
            create_test_file(dir.path(), "IM0002.dcm"),
            create_test_file(&subdir_path, "IM0003"),
        ];

        create_test_file(dir.path(), "studies.csv");
        create_test_file(dir.path(), "report.PDF");
        create_test_file(&subdir_path, "preview.jpg");

        (dir, containers)
    }

    #[test]
    fn test_walk_files_finds_everything() {
        let (dir, _) = setup_test_directory();
        let files = walk_files(dir.path()).unwrap();
        assert_eq!(files.len(), 6);
    }

    #[test]
    fn test_walk_files_is_sorted() {
        let (dir, _) = setup_test_directory();
        let first = walk_files(dir.path()).unwrap();
        let second = walk_files(dir.path()).unwrap();
        assert_eq!(first, second);
        assert_eq!(first[0], dir.path().join("IM0001"));
    }

    #[test]
    fn test_discover_containers_skips_denylist() {
        let (dir, containers) = setup_test_directory();
        let config = Config::default();

        let discovered = discover_containers(dir.path(), &config).unwrap();
        assert_eq!(discovered.len(), 3);
        for path in &containers {
            assert!(discovered.contains(path));
        }
        assert!(!discovered.contains(&dir.path().join("studies.csv")));
    }

    #[test]
    fn test_nonexistent_directory() {
        let result = walk_files(Path::new("/path/that/does/not/exist"));
        assert!(matches!(result, Err(Error::NotADirectory(_))));
    }

    #[test]
    fn test_file_is_not_a_directory() {
        let (dir, containers) = setup_test_directory();
        let result = discover_containers(&containers[0], &Config::default());
        assert!(matches!(result, Err(Error::NotADirectory(_))));
        drop(dir);
    }
}
