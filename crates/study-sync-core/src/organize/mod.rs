//! Moving DICOM files into the `Patient-/Study-/Series-` folder layout.

mod cleanup;
mod path;

pub use cleanup::collect_empty_dirs;
pub use path::{derive_destination, derive_path, sanitize, truncate, INVALID_CHARS, UNKNOWN};

use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::discovery::discover_containers;
use crate::error::{Error, Result};
use crate::logging::{log_file_error, log_fs_modification};
use crate::progress::ProgressTracker;
use crate::types::RunSummary;

/// Move every DICOM file under `root` into its derived folder under `root`.
///
/// Files already in place are left alone, so a second run performs no moves.
pub fn reorganize(root: &Path, config: &Config) -> Result<RunSummary> {
    let files = discover_containers(root, config)?;
    let mut progress = ProgressTracker::new("Reorganizing", files.len(), config.show_progress);

    for file in &files {
        let destination = match derive_destination(file, root, config.max_descriptor_len) {
            Ok(destination) => destination,
            Err(failure) => {
                debug!("Skipping file: {}", Error::from(failure));
                progress.skipped();
                continue;
            }
        };

        if is_in_place(file, &destination) {
            progress.skipped();
            continue;
        }

        match move_into(file, &destination) {
            Ok(new_path) => {
                log_fs_modification("move", file, Some(&new_path.display().to_string()));
                progress.updated();
            }
            Err(e) => {
                log_file_error(file, "move", &e);
                progress.failed();
            }
        }
    }

    Ok(progress.finish())
}

/// Whether `file` already sits directly in `destination`
pub fn is_in_place(file: &Path, destination: &Path) -> bool {
    let Some(current) = file.parent() else {
        return false;
    };

    // A destination that does not exist yet cannot be the current folder
    match (fs::canonicalize(current), fs::canonicalize(destination)) {
        (Ok(current), Ok(destination)) => current == destination,
        _ => false,
    }
}

/// Move `file` into `destination`, creating the folder as needed.
/// Returns the new path of the file.
pub fn move_into(file: &Path, destination: &Path) -> Result<PathBuf> {
    let Some(file_name) = file.file_name() else {
        return Err(Error::Move {
            from: file.to_path_buf(),
            to: destination.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no file name"),
        });
    };
    let target = destination.join(file_name);

    let move_error = |source: std::io::Error| Error::Move {
        from: file.to_path_buf(),
        to: target.clone(),
        source,
    };

    fs::create_dir_all(destination).map_err(move_error)?;

    // Never overwrite a different file that already has this name
    if target.exists() {
        return Err(move_error(std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            "destination file already exists",
        )));
    }

    if let Err(e) = fs::rename(file, &target) {
        // Rename fails across filesystems; fall back to copy and delete
        warn!(
            "Rename of {} failed ({}), copying instead",
            file.display(),
            e
        );
        fs::copy(file, &target).map_err(move_error)?;
        fs::remove_file(file).map_err(move_error)?;
    }

    Ok(target)
}
