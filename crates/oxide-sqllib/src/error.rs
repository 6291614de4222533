//! Error types for SQL libraries.

use std::path::PathBuf;

use crate::connection::DriverError;

/// Errors that can occur while loading or invoking a library.
#[derive(Debug, thiserror::Error)]
pub enum LibraryError {
    /// An operation was invoked before a connection was attached.
    #[error("Library is not connected to a database")]
    NotConnected,

    /// No operation with the given name exists in the library.
    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    /// Reading the library source file failed.
    #[error("Failed to read library '{path}': {source}")]
    Io {
        /// Path of the library file.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Error raised by the connection collaborator, passed through untouched.
    #[error(transparent)]
    Driver(DriverError),
}

impl LibraryError {
    /// Wraps an IO error together with the file it concerns.
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns whether this is a [`LibraryError::NotConnected`] error.
    #[must_use]
    pub const fn is_not_connected(&self) -> bool {
        matches!(self, Self::NotConnected)
    }

    /// Returns the driver error if this error came from the connection.
    #[must_use]
    pub fn as_driver(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            Self::Driver(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<DriverError> for LibraryError {
    fn from(err: DriverError) -> Self {
        Self::Driver(err)
    }
}

/// Result type for library operations.
pub type Result<T> = std::result::Result<T, LibraryError>;
