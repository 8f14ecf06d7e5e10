use std::path::PathBuf;

/// Result type for persistence operations
pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Persistence-specific errors
#[derive(Debug)]
pub enum PersistenceError {
    /// CSV encoding or decoding errors
    Csv(csv::Error),

    /// I/O errors on the registry file
    Io(PathBuf, std::io::Error),

    /// Registry file does not exist
    NotFound(PathBuf),

    /// Registry file holds no usable rows
    Empty(PathBuf),
}

impl From<csv::Error> for PersistenceError {
    fn from(err: csv::Error) -> Self {
        PersistenceError::Csv(err)
    }
}

impl std::fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Csv(err) => write!(f, "CSV error: {}", err),
            Self::Io(path, err) => write!(f, "I/O error for {}: {}", path.display(), err),
            Self::NotFound(path) => write!(f, "Registry file not found: {}", path.display()),
            Self::Empty(path) => write!(f, "No studies in registry file: {}", path.display()),
        }
    }
}

impl std::error::Error for PersistenceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Csv(err) => Some(err),
            Self::Io(_, err) => Some(err),
            _ => None,
        }
    }
}

// Implement conversion from PersistenceError to the main Error type
impl From<PersistenceError> for crate::Error {
    fn from(err: PersistenceError) -> Self {
        match err {
            PersistenceError::NotFound(path) => crate::Error::RegistryFileMissing(path),
            PersistenceError::Empty(path) => crate::Error::EmptyRegistry(path),
            PersistenceError::Io(_, e) => crate::Error::Io(e),
            PersistenceError::Csv(e) => crate::Error::Registry(e.to_string()),
        }
    }
}
