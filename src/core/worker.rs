//! Background thread that runs store and sync operations one at a time.
//!
//! Each request returns a [`Ticket`] that resolves when the operation has
//! finished. Jobs run in submission order, so a caller that waits on one
//! ticket before acting on the next never observes interleaved mutations.

use crate::core::error::{StoreError, StoreResult};
use crate::core::index::DirectoryIndex;
use crate::core::store::SecretStore;
use crate::core::sync::{SyncCoordinator, SyncSession};
use crate::models::entry::CredentialEntry;
use crate::models::node::Leaf;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

struct WorkerState {
    store: SecretStore,
    sync: SyncCoordinator,
    /// `None` after a create or update; rebuilt on the next request.
    index: Option<DirectoryIndex>,
}

impl WorkerState {
    fn index(&mut self) -> StoreResult<&DirectoryIndex> {
        let index = match self.index.take() {
            Some(index) => index,
            None => DirectoryIndex::build(self.store.root(), &self.store.config().suffix)?,
        };
        Ok(self.index.insert(index))
    }
}

type Job = Box<dyn FnOnce(&mut WorkerState) + Send>;

/// Completion handle for one queued operation.
#[derive(Debug)]
pub struct Ticket<T> {
    rx: Receiver<StoreResult<T>>,
}

impl<T> Ticket<T> {
    /// Block until the operation completes.
    pub fn wait(self) -> StoreResult<T> {
        self.rx.recv().unwrap_or(Err(StoreError::WorkerGone))
    }

    /// The result if the operation has completed, without blocking.
    pub fn try_wait(&self) -> Option<StoreResult<T>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(StoreError::WorkerGone)),
        }
    }
}

pub struct StoreWorker {
    tx: Option<Sender<Job>>,
    handle: Option<JoinHandle<()>>,
}

impl StoreWorker {
    pub fn spawn(store: SecretStore, sync: SyncCoordinator) -> StoreResult<Self> {
        let root = store.root().to_path_buf();
        let (tx, rx) = mpsc::channel::<Job>();
        let mut state = WorkerState {
            store,
            sync,
            index: None,
        };
        let handle = thread::Builder::new()
            .name("passbook-store".into())
            .spawn(move || {
                for job in rx {
                    job(&mut state);
                }
                debug!("store worker stopped");
            })
            .map_err(|e| StoreError::io(&root, e))?;
        Ok(Self {
            tx: Some(tx),
            handle: Some(handle),
        })
    }

    fn submit<T, F>(&self, op: F) -> Ticket<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut WorkerState) -> StoreResult<T> + Send + 'static,
    {
        let (reply, rx) = mpsc::channel();
        let job: Job = Box::new(move |state| {
            // The caller may have dropped its ticket; the work still counts.
            let _ = reply.send(op(state));
        });
        if let Some(tx) = &self.tx {
            if tx.send(job).is_err() {
                warn!("store worker is gone, request dropped");
            }
        }
        Ticket { rx }
    }

    pub fn read(&self, leaf: Leaf) -> Ticket<CredentialEntry> {
        self.submit(move |s| s.store.read(&leaf))
    }

    pub fn create(&self, parent: String, entry: CredentialEntry) -> Ticket<Leaf> {
        self.submit(move |s| {
            let leaf = s.store.create(&parent, &entry)?;
            s.index = None;
            Ok(leaf)
        })
    }

    pub fn update(&self, leaf: Leaf, entry: CredentialEntry) -> Ticket<Leaf> {
        self.submit(move |s| {
            let updated = s.store.update(&leaf, &entry)?;
            s.index = None;
            Ok(updated)
        })
    }

    pub fn delete(&self, leaf: Leaf) -> Ticket<()> {
        self.submit(move |s| {
            s.store.delete(&leaf)?;
            if let Some(index) = s.index.as_mut() {
                index.remove_leaf(&leaf.path);
            }
            Ok(())
        })
    }

    /// Run a sync; the rebuilt index replaces the worker's snapshot.
    pub fn sync(&self) -> Ticket<SyncSession> {
        self.submit(|s| {
            let outcome = s.sync.synchronize()?;
            s.index = Some(outcome.index);
            Ok(outcome.session)
        })
    }

    /// Current snapshot of the store contents.
    pub fn index(&self) -> Ticket<DirectoryIndex> {
        self.submit(|s| s.index().cloned())
    }

    pub fn search(&self, term: String) -> Ticket<Option<Vec<Leaf>>> {
        self.submit(move |s| Ok(s.index()?.search(&term)))
    }
}

impl Drop for StoreWorker {
    fn drop(&mut self) {
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("store worker panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fakes::{MemoryCrypto, RecordingVcs, VcsCall};
    use crate::models::config::StoreConfig;
    use tempfile::TempDir;

    fn spawn(dir: &TempDir, vcs: RecordingVcs) -> StoreWorker {
        let config = StoreConfig::for_root(dir.path());
        let sync = SyncCoordinator::new(&config, vcs);
        let store = SecretStore::new(config, MemoryCrypto::new());
        StoreWorker::spawn(store, sync).unwrap()
    }

    #[test]
    fn test_operations_resolve_in_order() {
        let dir = TempDir::new().unwrap();
        let worker = spawn(&dir, RecordingVcs::new(true));

        let created = worker.create("web".into(), CredentialEntry::new("site", "pw"));
        let listed = worker.index();
        let leaf = created.wait().unwrap();
        assert_eq!(listed.wait().unwrap().flat, vec![leaf.clone()]);

        let entry = worker.read(leaf.clone()).wait().unwrap();
        assert_eq!(entry.password, "pw");
    }

    #[test]
    fn test_delete_updates_index_in_place() {
        let dir = TempDir::new().unwrap();
        let worker = spawn(&dir, RecordingVcs::new(true));
        let a = worker
            .create(String::new(), CredentialEntry::new("a", "1"))
            .wait()
            .unwrap();
        worker
            .create(String::new(), CredentialEntry::new("b", "2"))
            .wait()
            .unwrap();
        assert_eq!(worker.index().wait().unwrap().len(), 2);
        worker.delete(a.clone()).wait().unwrap();
        let index = worker.index().wait().unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index.flat[0].name, "b");
        assert!(worker.read(a).wait().unwrap_err().is_not_found());
    }

    #[test]
    fn test_sync_through_worker() {
        let dir = TempDir::new().unwrap();
        let vcs = RecordingVcs::new(false);
        let worker = spawn(&dir, vcs.clone());
        let session = worker.sync().wait().unwrap();
        assert_eq!(session.clean, Some(false));
        assert_eq!(vcs.calls().last(), Some(&VcsCall::Push));
    }

    #[test]
    fn test_try_wait_eventually_resolves() {
        let dir = TempDir::new().unwrap();
        let worker = spawn(&dir, RecordingVcs::new(true));
        let ticket = worker.search("zzz".into());
        let result = loop {
            if let Some(result) = ticket.try_wait() {
                break result;
            }
            thread::yield_now();
        };
        assert_eq!(result.unwrap(), Some(Vec::new()));
        assert!(worker.search("zz".into()).wait().unwrap().is_none());
    }

    #[test]
    fn test_errors_travel_back() {
        let dir = TempDir::new().unwrap();
        let worker = spawn(&dir, RecordingVcs::new(true));
        let err = worker
            .create(String::new(), CredentialEntry::new("bad name", "x"))
            .wait()
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation { .. }));
    }
}
