use std::{io, path::PathBuf};

use thiserror::Error;

/// Failures reported by a remote store.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The store could not be reached.
    #[error("remote store unavailable: {0}")]
    Unavailable(String),
    /// The store refused the request.
    #[error("remote store rejected the request: {0}")]
    Rejected(String),
    /// Reading or writing the backing file failed.
    #[error("remote store I/O failed: {0}")]
    Io(#[from] io::Error),
    /// The backing document could not be encoded or decoded.
    #[error("remote store document is malformed: {0}")]
    Format(#[from] serde_json::Error),
}

/// Failures reported by the local layout cache.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Reading or writing the cache file failed.
    #[error("cache file {} could not be accessed: {source}", .path.display())]
    Io {
        /// Cache file involved.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The cache file is not a valid envelope.
    #[error("cache file is malformed: {0}")]
    Format(#[from] serde_json::Error),
    /// The envelope was written by an incompatible version.
    #[error("cache envelope version {found} is not supported; expected {expected}")]
    UnsupportedVersion {
        /// Version found in the file.
        found: u32,
        /// Version written by this build.
        expected: u32,
    },
    /// The save timestamp could not be formatted.
    #[error("cache timestamp could not be formatted: {0}")]
    Timestamp(#[from] time::error::Format),
}
