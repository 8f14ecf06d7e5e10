use log::{debug, info};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::discovery::ensure_directory;
use crate::error::{Error, Result};
use crate::logging::{log_file_error, log_fs_modification};
use crate::types::RunSummary;

/// Remove every empty directory below `root`, deepest first, until a pass
/// removes nothing. `root` itself is never removed.
pub fn collect_empty_dirs(root: &Path) -> Result<RunSummary> {
    ensure_directory(root)?;

    let mut seen: HashSet<PathBuf> = HashSet::new();
    let mut failed: HashSet<PathBuf> = HashSet::new();
    let mut removed = 0usize;
    let mut passes = 0usize;

    loop {
        passes += 1;
        let mut removed_this_pass = 0usize;

        let dirs = WalkDir::new(root)
            .min_depth(1)
            .contents_first(true)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    debug!("Skipping unreadable entry under {}: {}", root.display(), e);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_dir());

        for entry in dirs {
            let dir = entry.path();
            seen.insert(dir.to_path_buf());

            // The walk's listing may be stale, so look at the directory again
            match is_empty_dir(dir) {
                Ok(true) => {}
                Ok(false) => continue,
                Err(e) => {
                    debug!("Cannot list {}: {}", dir.display(), e);
                    continue;
                }
            }

            match fs::remove_dir(dir) {
                Ok(()) => {
                    log_fs_modification("remove_dir", dir, None);
                    removed_this_pass += 1;
                }
                Err(source) => {
                    let err = Error::DirectoryRemoval {
                        path: dir.to_path_buf(),
                        source,
                    };
                    log_file_error(dir, "remove_dir", &err);
                    failed.insert(dir.to_path_buf());
                }
            }
        }

        removed += removed_this_pass;
        if removed_this_pass == 0 {
            break;
        }
    }

    let failed = failed.len();
    let summary = RunSummary {
        processed: seen.len(),
        updated: removed,
        skipped: seen.len().saturating_sub(removed + failed),
        failed,
    };
    info!(
        "Removed {} empty directories under {} in {} passes",
        removed,
        root.display(),
        passes
    );
    Ok(summary)
}

fn is_empty_dir(dir: &Path) -> std::io::Result<bool> {
    Ok(fs::read_dir(dir)?.next().is_none())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_nested_empty_dirs_collapse() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("a/b/c/d")).unwrap();
        fs::create_dir_all(dir.path().join("x/y")).unwrap();

        let summary = collect_empty_dirs(dir.path()).unwrap();

        assert_eq!(summary.updated, 6);
        assert_eq!(summary.failed, 0);
        assert!(dir.path().exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_non_empty_dirs_are_kept() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("keep/inner")).unwrap();
        fs::write(dir.path().join("keep/inner/IM0001"), b"data").unwrap();
        fs::create_dir_all(dir.path().join("keep/empty")).unwrap();

        let summary = collect_empty_dirs(dir.path()).unwrap();

        assert_eq!(summary.updated, 1);
        assert!(dir.path().join("keep/inner/IM0001").exists());
        assert!(!dir.path().join("keep/empty").exists());
    }

    #[test]
    fn test_empty_root_is_kept() {
        let dir = tempdir().unwrap();
        let summary = collect_empty_dirs(dir.path()).unwrap();
        assert_eq!(summary.updated, 0);
        assert!(dir.path().exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_removal_failure_does_not_stop_the_sweep() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let locked = dir.path().join("locked");
        fs::create_dir_all(locked.join("inner")).unwrap();
        fs::create_dir_all(dir.path().join("free/empty")).unwrap();

        fs::set_permissions(&locked, fs::Permissions::from_mode(0o555)).unwrap();
        if fs::write(locked.join("check"), b"").is_ok() {
            // Permissions are not enforced for this user
            return;
        }
        let summary = collect_empty_dirs(dir.path());
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        let summary = summary.unwrap();

        assert_eq!(summary.updated, 2);
        assert_eq!(summary.failed, 1);
        assert!(locked.join("inner").is_dir());
        assert!(!dir.path().join("free").exists());
    }

    #[test]
    fn test_missing_root() {
        let result = collect_empty_dirs(Path::new("/path/that/does/not/exist"));
        assert!(matches!(result, Err(Error::NotADirectory(_))));
    }
}
