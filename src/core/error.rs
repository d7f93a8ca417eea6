//! Error taxonomy for store, index and sync operations.

use crate::core::crypto::CryptoError;
use crate::core::vcs::VcsError;
use std::fmt;
use std::path::{Path, PathBuf};

/// The sync step that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStep {
    Status,
    Pull,
    Commit,
    AddAll,
    Push,
}

impl fmt::Display for SyncStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SyncStep::Status => "status",
            SyncStep::Pull => "pull",
            SyncStep::Commit => "commit",
            SyncStep::AddAll => "add",
            SyncStep::Push => "push",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("invalid entry '{name}': {reason}")]
    Validation { name: String, reason: String },

    #[error("entry already exists: {}", .path.display())]
    Conflict { path: PathBuf },

    #[error("not found: {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("cannot decrypt {}: {source}", .path.display())]
    Decryption {
        path: PathBuf,
        #[source]
        source: CryptoError,
    },

    #[error("cannot encrypt '{name}': {source}")]
    Encryption {
        name: String,
        #[source]
        source: CryptoError,
    },

    #[error("sync {step} failed: {source}")]
    Sync {
        step: SyncStep,
        #[source]
        source: VcsError,
    },

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("store worker has stopped")]
    WorkerGone,
}

pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    pub fn validation(name: &str, reason: impl Into<String>) -> Self {
        StoreError::Validation {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    /// Map an I/O error on `path`, turning a missing file into `NotFound`.
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            StoreError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            StoreError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_not_found_maps_to_not_found() {
        let err = StoreError::io(
            Path::new("/s/x.gpg"),
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "not found: /s/x.gpg");
    }

    #[test]
    fn test_io_other_stays_io() {
        let err = StoreError::io(
            Path::new("/s/x.gpg"),
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(matches!(err, StoreError::Io { .. }));
    }

    #[test]
    fn test_sync_error_names_step() {
        let err = StoreError::Sync {
            step: SyncStep::Push,
            source: VcsError::Rejected("remote hung up".into()),
        };
        assert_eq!(err.to_string(), "sync push failed: remote hung up");
    }
}
