use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

/// Custom error types for the study-sync library
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A required root path is missing or not a directory
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// File could not be read as a DICOM container
    #[error("Failed to parse {path} as DICOM: {reason}")]
    ContainerParse { path: PathBuf, reason: String },

    /// File parsed but carries no StudyInstanceUID
    #[error("Missing StudyInstanceUID: {0}")]
    MissingStudyIdentifier(PathBuf),

    /// Writing an updated file back to disk failed
    #[error("Failed to save {path}: {reason}")]
    Save { path: PathBuf, reason: String },

    /// Moving a file into its derived folder failed
    #[error("Failed to move {from} to {to}: {source}")]
    Move {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },

    /// Removing an empty directory failed
    #[error("Failed to remove directory {path}: {source}")]
    DirectoryRemoval {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The registry file does not exist
    #[error("Registry file not found: {0}")]
    RegistryFileMissing(PathBuf),

    /// The registry file holds no usable rows
    #[error("No studies found in registry file: {0}")]
    EmptyRegistry(PathBuf),

    /// Registry file could not be read or written
    #[error("Registry error: {0}")]
    Registry(String),

    /// Invalid configuration error
    #[error("Invalid configuration: {0}")]
    Configuration(String),
}

impl Error {
    /// Whether this error must abort the whole operation rather than a single file
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::NotADirectory(_)
                | Self::RegistryFileMissing(_)
                | Self::EmptyRegistry(_)
                | Self::Configuration(_)
        )
    }
}
