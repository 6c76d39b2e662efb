//! Fatal errors for a cleanup run.
//!
//! Anything returned as [`CleanError`] aborts the run before (or instead of)
//! touching the filesystem. Problems scoped to a single file never surface
//! here; they are recorded as [`crate::report::Skipped`] entries instead.

use crate::config::ConfigError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a run.
#[derive(Debug, Error)]
pub enum CleanError {
    /// The target path does not exist or is not a directory.
    #[error("Directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    /// The directory exists but its entries could not be listed.
    #[error("Could not read directory {}: {source}", path.display())]
    ScanFailed {
        /// Directory that failed to list.
        path: PathBuf,
        /// Underlying I/O error (usually permission denied).
        #[source]
        source: io::Error,
    },

    /// A command-line argument failed validation.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The configuration file could not be loaded or compiled.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result alias used by every operation in the crate.
pub type CleanResult<T> = Result<T, CleanError>;
