//! `git` command-line adapter for [`VersionControl`].

use crate::core::vcs::{VcsError, VersionControl, WorkTreeStatus};
use crate::util::command;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct GitCli {
    root: PathBuf,
    program: PathBuf,
}

impl GitCli {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            program: PathBuf::from("git"),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn git(&self, args: &[&str]) -> Result<Vec<u8>, VcsError> {
        debug!(?args, root = %self.root.display(), "git");
        let mut cmd = Command::new(&self.program);
        cmd.arg("-C").arg(&self.root).args(args);
        Ok(command::run(cmd)?)
    }

    /// Whether the store root is inside a git work tree.
    pub fn is_work_tree(&self) -> bool {
        self.git(&["rev-parse", "--is-inside-work-tree"])
            .map(|out| out.starts_with(b"true"))
            .unwrap_or(false)
    }

    /// Clone `remote` into the (empty or missing) store root.
    pub fn clone_from(&self, remote: &str) -> Result<(), VcsError> {
        debug!(remote, root = %self.root.display(), "git clone");
        let mut cmd = Command::new(&self.program);
        cmd.arg("clone").arg(remote).arg(&self.root);
        command::run(cmd)?;
        Ok(())
    }
}

impl VersionControl for GitCli {
    fn status(&self) -> Result<WorkTreeStatus, VcsError> {
        let out = self.git(&["status", "--porcelain"])?;
        Ok(WorkTreeStatus {
            clean: out.iter().all(u8::is_ascii_whitespace),
        })
    }

    fn pull(&self) -> Result<(), VcsError> {
        self.git(&["pull", "--ff-only", "--quiet"]).map(drop)
    }

    fn push(&self) -> Result<(), VcsError> {
        self.git(&["push", "--quiet"]).map(drop)
    }

    /// Stages first so new and deleted entries are part of the commit.
    fn commit(&self, message: &str) -> Result<(), VcsError> {
        self.add_all()?;
        self.git(&["commit", "--quiet", "-m", message]).map(drop)
    }

    fn add_all(&self) -> Result<(), VcsError> {
        self.git(&["add", "--all"]).map(drop)
    }
}
