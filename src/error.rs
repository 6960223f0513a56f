//! Error types for the lifecycle crate.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for lifecycle operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for lifecycle operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The allocator refused the request, or the requested size overflowed.
    #[error("allocation of {bytes} bytes failed")]
    AllocationFailure {
        /// Size of the refused request, saturated at `usize::MAX`.
        bytes: usize,
    },

    /// A scoped resource could not be acquired.
    #[error("failed to open {}: {source}", path.display())]
    OpenFailure {
        /// Path that was being opened.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The guard never acquired its resource, or has already released it.
    #[error("resource not open")]
    NotOpen,

    /// The handle holds no resource (transferred away, reset, or never filled).
    #[error("handle is empty")]
    EmptyHandle,

    /// I/O error while acting on an open resource.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Check if this is an allocation failure.
    pub fn is_allocation_failure(&self) -> bool {
        matches!(self, Error::AllocationFailure { .. })
    }

    /// Check if this is an open failure.
    pub fn is_open_failure(&self) -> bool {
        matches!(self, Error::OpenFailure { .. })
    }

    /// Check if this error reports caller misuse rather than an
    /// environmental failure.
    pub fn is_misuse(&self) -> bool {
        matches!(self, Error::NotOpen | Error::EmptyHandle)
    }
}
