//! Error types for reconciliation operations.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for reconciliation operations.
///
/// Only [`SyncError::Containment`] is fatal. Every other variant describes a
/// per-item failure which is reported through the error or stale callbacks
/// while the run carries on with the remaining packages.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A package manifest (`RECORD`) could not be opened or read.
    #[error("Failed to read manifest {path}: {source}")]
    ManifestRead {
        /// Path of the manifest file
        path: PathBuf,
        /// Underlying I/O error
        source: io::Error,
    },

    /// The installation directory could not be listed.
    #[error("Failed to scan {path}: {source}")]
    Scan {
        /// Directory being scanned
        path: PathBuf,
        /// Underlying I/O error
        source: io::Error,
    },

    /// An archive could not be opened as a zip container.
    #[error("Failed to open archive {path}: {source}")]
    ArchiveOpen {
        /// Path of the archive
        path: PathBuf,
        /// Underlying zip error
        source: zip::result::ZipError,
    },

    /// An archive member could not be read from the container.
    #[error("Failed to read member #{index} of archive: {source}")]
    ArchiveRead {
        /// Index of the member within the archive
        index: usize,
        /// Underlying zip error
        source: zip::result::ZipError,
    },

    /// A single archive member failed to extract.
    #[error("Failed to extract {member} to {path}: {source}")]
    Extract {
        /// Member name as stored in the archive
        member: String,
        /// Destination on disk
        path: PathBuf,
        /// Underlying I/O error
        source: io::Error,
    },

    /// A path owned by a package could not be removed.
    #[error("Failed to remove {path}: {source}")]
    Remove {
        /// Path that could not be removed
        path: PathBuf,
        /// Underlying I/O error
        source: io::Error,
    },

    /// A path constructed by the engine lies outside the containment boundary.
    ///
    /// This is an internal defect and aborts the run.
    #[error("Path {path} escapes the containment boundary {boundary}")]
    Containment {
        /// Offending path
        path: PathBuf,
        /// Boundary it was expected to stay within
        boundary: PathBuf,
    },

    /// A sources file could not be parsed.
    #[error("Invalid sources file {path}: {source}")]
    Sources {
        /// Path of the sources file
        path: PathBuf,
        /// Underlying JSON error
        source: serde_json::Error,
    },

    /// An I/O error occurred outside of any more specific operation.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl SyncError {
    /// Whether this error must abort the run rather than be reported.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SyncError::Containment { .. })
    }
}

/// Convenience alias used throughout the crate.
pub type SyncResult<T> = Result<T, SyncError>;
