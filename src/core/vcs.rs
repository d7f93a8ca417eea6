//! Version-control service consumed by the sync coordinator.

use crate::util::command::CommandError;

#[derive(Debug, thiserror::Error)]
pub enum VcsError {
    #[error(transparent)]
    Tool(#[from] CommandError),
    #[error("{0}")]
    Rejected(String),
}

/// Working-tree state as reported by [`VersionControl::status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkTreeStatus {
    pub clean: bool,
}

/// The operations sync needs from a repository rooted at the store root.
/// The repository is treated as one opaque unit; no call names an entry.
pub trait VersionControl {
    fn status(&self) -> Result<WorkTreeStatus, VcsError>;
    fn pull(&self) -> Result<(), VcsError>;
    fn push(&self) -> Result<(), VcsError>;
    /// Record every pending change with `message`.
    fn commit(&self, message: &str) -> Result<(), VcsError>;
    fn add_all(&self) -> Result<(), VcsError>;
}

impl<T: VersionControl + ?Sized> VersionControl for Box<T> {
    fn status(&self) -> Result<WorkTreeStatus, VcsError> {
        (**self).status()
    }

    fn pull(&self) -> Result<(), VcsError> {
        (**self).pull()
    }

    fn push(&self) -> Result<(), VcsError> {
        (**self).push()
    }

    fn commit(&self, message: &str) -> Result<(), VcsError> {
        (**self).commit(message)
    }

    fn add_all(&self) -> Result<(), VcsError> {
        (**self).add_all()
    }
}
