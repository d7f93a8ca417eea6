//! Reconcile the store's work tree with its remote.
//!
//! Clean tree: pull. Dirty tree: commit, stage, push. Either way the index
//! is rebuilt afterwards. The first failing step aborts the rest; nothing is
//! rolled back.

use crate::core::error::{StoreError, StoreResult, SyncStep};
use crate::core::index::DirectoryIndex;
use crate::core::vcs::{VcsError, VersionControl};
use crate::models::config::StoreConfig;
use chrono::Local;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// What one `synchronize` call observed and did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncSession {
    pub offline: bool,
    /// Work-tree cleanliness; `None` when offline.
    pub clean: Option<bool>,
    /// Remote-facing steps taken, in order.
    pub steps: Vec<SyncStep>,
}

#[derive(Debug)]
pub struct SyncOutcome {
    pub session: SyncSession,
    pub index: DirectoryIndex,
}

pub struct SyncCoordinator {
    vcs: Box<dyn VersionControl + Send>,
    root: PathBuf,
    suffix: String,
    offline: bool,
}

impl SyncCoordinator {
    pub fn new(config: &StoreConfig, vcs: impl VersionControl + Send + 'static) -> Self {
        Self {
            vcs: Box::new(vcs),
            root: config.store_root.clone(),
            suffix: config.suffix.clone(),
            offline: config.offline,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_offline(&self) -> bool {
        self.offline
    }

    pub fn synchronize(&self) -> StoreResult<SyncOutcome> {
        let mut session = SyncSession {
            offline: self.offline,
            ..Default::default()
        };

        if self.offline {
            info!("offline, skipping remote sync");
        } else {
            let status = step(SyncStep::Status, self.vcs.status())?;
            session.clean = Some(status.clean);
            debug!(clean = status.clean, "work tree status");

            if status.clean {
                step(SyncStep::Pull, self.vcs.pull())?;
                session.steps.push(SyncStep::Pull);
                info!("pulled from remote");
            } else {
                let message = commit_message();
                step(SyncStep::Commit, self.vcs.commit(&message))?;
                session.steps.push(SyncStep::Commit);
                step(SyncStep::AddAll, self.vcs.add_all())?;
                session.steps.push(SyncStep::AddAll);
                step(SyncStep::Push, self.vcs.push())?;
                session.steps.push(SyncStep::Push);
                info!(%message, "pushed local changes");
            }
        }

        let index = DirectoryIndex::build(&self.root, &self.suffix)?;
        Ok(SyncOutcome { session, index })
    }
}

fn step<T>(step: SyncStep, result: Result<T, VcsError>) -> StoreResult<T> {
    result.map_err(|source| StoreError::Sync { step, source })
}

fn commit_message() -> String {
    format!("Updated at {}", Local::now().format("%Y-%m-%d %H:%M:%S"))
}
