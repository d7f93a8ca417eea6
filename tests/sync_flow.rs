//! Sync branching and the background worker, with recorded version control.

use passbook::core::error::{StoreError, SyncStep};
use passbook::core::fakes::{MemoryCrypto, RecordingVcs, VcsCall};
use passbook::core::store::SecretStore;
use passbook::core::sync::SyncCoordinator;
use passbook::core::worker::StoreWorker;
use passbook::models::config::StoreConfig;
use passbook::models::entry::CredentialEntry;
use tempfile::TempDir;

fn worker(dir: &TempDir, vcs: RecordingVcs, offline: bool) -> StoreWorker {
    let mut config = StoreConfig::for_root(dir.path());
    config.offline = offline;
    let sync = SyncCoordinator::new(&config, vcs);
    let store = SecretStore::new(config, MemoryCrypto::new());
    StoreWorker::spawn(store, sync).unwrap()
}

#[test]
fn test_clean_tree_pulls_and_sees_remote_entries() {
    let dir = TempDir::new().unwrap();
    let vcs = RecordingVcs::new(true).with_pull_file(dir.path().join("shared/wifi.gpg"), b"x");
    let worker = worker(&dir, vcs.clone(), false);

    assert_eq!(worker.index().wait().unwrap().len(), 0);
    let session = worker.sync().wait().unwrap();
    assert_eq!(session.steps, vec![SyncStep::Pull]);
    assert_eq!(vcs.calls(), vec![VcsCall::Status, VcsCall::Pull]);

    let index = worker.index().wait().unwrap();
    assert_eq!(index.flat[0].name, "shared/wifi");
}

#[test]
fn test_local_change_is_committed_then_pushed() {
    let dir = TempDir::new().unwrap();
    let vcs = RecordingVcs::new(false);
    let worker = worker(&dir, vcs.clone(), false);

    worker
        .create("mail".into(), CredentialEntry::new("work", "pw"))
        .wait()
        .unwrap();
    worker.sync().wait().unwrap();

    let calls = vcs.calls();
    let order: Vec<&str> = calls
        .iter()
        .map(|c| match c {
            VcsCall::Status => "status",
            VcsCall::Pull => "pull",
            VcsCall::Commit(_) => "commit",
            VcsCall::AddAll => "add",
            VcsCall::Push => "push",
        })
        .collect();
    assert_eq!(order, vec!["status", "commit", "add", "push"]);
}

#[test]
fn test_failed_pull_surfaces_step_and_keeps_worker_usable() {
    let dir = TempDir::new().unwrap();
    let vcs = RecordingVcs::new(true).failing_on(SyncStep::Pull);
    let worker = worker(&dir, vcs, false);

    let err = worker.sync().wait().unwrap_err();
    assert!(matches!(
        err,
        StoreError::Sync {
            step: SyncStep::Pull,
            ..
        }
    ));

    let leaf = worker
        .create(String::new(), CredentialEntry::new("after", "pw"))
        .wait()
        .unwrap();
    assert_eq!(worker.read(leaf).wait().unwrap().password, "pw");
}

#[test]
fn test_offline_sync_touches_nothing_remote() {
    let dir = TempDir::new().unwrap();
    let vcs = RecordingVcs::new(false);
    let worker = worker(&dir, vcs.clone(), true);
    worker
        .create(String::new(), CredentialEntry::new("a", "1"))
        .wait()
        .unwrap();

    let session = worker.sync().wait().unwrap();
    assert!(session.offline);
    assert!(vcs.calls().is_empty());
    assert_eq!(worker.index().wait().unwrap().len(), 1);
}
