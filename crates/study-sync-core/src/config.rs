use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// File name of the study registry written next to the DICOM tree
pub const DEFAULT_REGISTRY_FILE_NAME: &str = "studies.csv";

/// Study and series descriptions longer than this are cut in folder names
pub const DEFAULT_MAX_DESCRIPTOR_LEN: usize = 24;

/// Extensions of files that are never treated as DICOM containers
pub const DEFAULT_SKIP_EXTENSIONS: &[&str] = &[
    ".csv", ".log", ".py", ".txt", ".docx", ".jpeg", ".jpg", ".png", ".pdf", ".zip", ".tar",
    ".gz", ".tgz", ".bz2", ".7z",
];

/// Log level for the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Configuration for registry, update and reorganisation runs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root of the DICOM tree
    pub root_dir: PathBuf,

    /// Subfolder of `root_dir` scanned when building the registry
    pub scan_subdir: Option<PathBuf>,

    /// Name of the registry file, written into `root_dir`
    pub registry_file_name: String,

    /// Subfolders of `root_dir` reorganised independently (empty = `root_dir` itself)
    pub reorganize_subdirs: Vec<PathBuf>,

    /// Whether to remove emptied directories after reorganising
    pub delete_empty_dirs: bool,

    /// Maximum length of study/series descriptions in folder names
    pub max_descriptor_len: usize,

    /// Extensions (with leading dot) skipped by the updater and reorganiser
    pub skip_extensions: Vec<String>,

    /// Warn when a later file disagrees with the first-seen study record
    pub report_duplicate_conflicts: bool,

    /// Whether to draw a progress bar
    pub show_progress: bool,

    /// Log level
    pub log_level: LogLevel,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("DICOM"),
            scan_subdir: None,
            registry_file_name: DEFAULT_REGISTRY_FILE_NAME.to_string(),
            reorganize_subdirs: Vec::new(),
            delete_empty_dirs: true,
            max_descriptor_len: DEFAULT_MAX_DESCRIPTOR_LEN,
            skip_extensions: DEFAULT_SKIP_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            report_duplicate_conflicts: false,
            show_progress: false,
            log_level: LogLevel::Info,
        }
    }
}

impl Config {
    /// Create a default configuration rooted at `root_dir`
    pub fn with_root(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            ..Default::default()
        }
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)
            .map_err(|e| Error::Configuration(format!("Failed to open config file: {}", e)))?;

        let config: Config = serde_json::from_reader(file)
            .map_err(|e| Error::Configuration(format!("Failed to parse config file: {}", e)))?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)
            .map_err(|e| Error::Configuration(format!("Failed to create config file: {}", e)))?;

        serde_json::to_writer_pretty(file, self)
            .map_err(|e| Error::Configuration(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.registry_file_name.trim().is_empty() {
            return Err(Error::Configuration(
                "Registry file name must not be empty".to_string(),
            ));
        }

        if self.registry_file_name.contains(['/', '\\']) {
            return Err(Error::Configuration(format!(
                "Registry file name must not contain a path separator: {}",
                self.registry_file_name
            )));
        }

        if self.max_descriptor_len == 0 {
            return Err(Error::Configuration(
                "Maximum descriptor length must be at least 1".to_string(),
            ));
        }

        if let Some(ext) = self.skip_extensions.iter().find(|ext| !ext.starts_with('.')) {
            return Err(Error::Configuration(format!(
                "Skip extension must start with a dot: {}",
                ext
            )));
        }

        Ok(())
    }

    /// Directory walked when building the registry
    pub fn scan_root(&self) -> PathBuf {
        match &self.scan_subdir {
            Some(subdir) => self.root_dir.join(subdir),
            None => self.root_dir.clone(),
        }
    }

    /// Default location of the registry file
    pub fn registry_path(&self) -> PathBuf {
        self.root_dir.join(&self.registry_file_name)
    }

    /// Layout roots handed to the reorganiser
    pub fn reorganize_roots(&self) -> Vec<PathBuf> {
        if self.reorganize_subdirs.is_empty() {
            vec![self.root_dir.clone()]
        } else {
            self.reorganize_subdirs
                .iter()
                .map(|subdir| self.root_dir.join(subdir))
                .collect()
        }
    }

    /// Returns true if the file extension is on the skip list
    pub fn is_skipped(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
            return false;
        };
        let ext = format!(".{}", ext.to_lowercase());
        self.skip_extensions
            .iter()
            .any(|skip| skip.to_lowercase() == ext)
    }
}
