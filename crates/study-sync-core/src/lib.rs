//! Core functionality for keeping a DICOM study tree and its registry in sync.
//!
//! This library provides the building blocks for managing study files:
//! - Study attribute extraction from DICOM files
//! - A deduplicated study registry and its CSV form
//! - Writing registry edits back into the files
//! - Reorganising files into a folder layout derived from their tags

// -- External Dependencies --
use log::{info, warn};
use std::path::{Path, PathBuf};

// -- Internal Modules --
mod error;

// -- Public Re-exports --
pub use config::*;
pub use error::{Error, Result};
pub use registry::Registry;
pub use types::*;

// -- Public Modules --
pub mod config;
pub mod discovery;
pub mod extract;
pub mod logging;
pub mod organize;
pub mod persistence;
pub mod progress;
pub mod reconcile;
pub mod registry;
pub mod types;

/// Main entry point for registry, update and reorganisation runs
pub struct StudySync {
    config: Config,
}

impl StudySync {
    /// Create a new StudySync with the provided configuration
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Scan the configured tree and build the study registry
    pub fn build_registry(&self) -> Result<Registry> {
        let scan_root = self.config.scan_root();
        info!("Collecting DICOM study data from {}", scan_root.display());
        registry::scan(&scan_root, &self.config)
    }

    /// Scan the tree and write the registry file into the root directory
    pub fn export_registry(&self) -> Result<PathBuf> {
        discovery::ensure_directory(&self.config.root_dir)?;
        let registry = self.build_registry()?;
        let path = self.config.registry_path();
        persistence::write_registry(&registry, &path)?;
        Ok(path)
    }

    /// Apply the registry file to the DICOM files.
    ///
    /// `registry_file` defaults to the configured registry path. When any file
    /// changed the registry is rebuilt and written again; otherwise it is left
    /// untouched.
    pub fn update_from_registry(&self, registry_file: Option<&Path>) -> Result<RunSummary> {
        discovery::ensure_directory(&self.config.root_dir)?;

        let registry_file = registry_file
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.config.registry_path());
        let rows = persistence::read_registry(&registry_file)?;

        info!("Updating DICOM files under {}", self.config.root_dir.display());
        let summary = reconcile::reconcile(&self.config.root_dir, &rows, &self.config)?;

        if summary.updated > 0 {
            info!("At least one file was updated; regenerating the registry");
            self.export_registry()?;
        } else {
            info!("No updates were made; registry left unchanged");
        }

        Ok(summary)
    }

    /// Move files into the derived folder layout, then remove emptied folders
    pub fn reorganize(&self) -> Result<ReorganizeSummary> {
        discovery::ensure_directory(&self.config.root_dir)?;

        let mut summary = ReorganizeSummary::default();
        for root in self.config.reorganize_roots() {
            if !root.is_dir() {
                warn!("Skipping missing folder {}", root.display());
                continue;
            }
            info!("Reorganizing DICOM files under {}", root.display());
            summary
                .files
                .merge(organize::reorganize(&root, &self.config)?);
        }

        if self.config.delete_empty_dirs {
            info!("Deleting empty directories under {}", self.config.root_dir.display());
            summary.directories = Some(organize::collect_empty_dirs(&self.config.root_dir)?);
        }

        Ok(summary)
    }
}
