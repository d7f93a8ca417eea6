//! End-to-end store behaviour against a temp directory and the in-memory cipher.

use passbook::core::codec;
use passbook::core::error::StoreError;
use passbook::core::fakes::MemoryCrypto;
use passbook::core::index::DirectoryIndex;
use passbook::core::otp;
use passbook::core::store::SecretStore;
use passbook::models::config::StoreConfig;
use passbook::models::entry::CredentialEntry;
use passbook::models::node::NodeKind;
use std::fs;
use tempfile::TempDir;

const SECRET: &str = "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ";

fn open(dir: &TempDir) -> SecretStore {
    SecretStore::new(StoreConfig::for_root(dir.path()), MemoryCrypto::new())
}

fn child_names(store: &SecretStore, dir: &str) -> Vec<String> {
    let mut names: Vec<String> = store
        .list(dir)
        .unwrap()
        .iter()
        .unwrap()
        .map(|c| c.unwrap().name)
        .collect();
    names.sort();
    names
}

#[test]
fn test_full_entry_survives_store_roundtrip() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir);

    let mut entry = CredentialEntry::new("example.com", "p@ss:word");
    entry.username = Some("alice".into());
    entry.url = Some("https://example.com:8443/login".into());
    entry.otp_secret = Some(SECRET.into());
    entry.notes = Some("recovery codes in the safe".into());
    let leaf = store.create("web", &entry).unwrap();

    let loaded = store.read(&leaf).unwrap();
    assert_eq!(loaded.name, "web/example.com");
    assert_eq!(loaded.password, "p@ss:word");
    assert_eq!(loaded.username, entry.username);
    assert_eq!(loaded.url, entry.url);
    assert_eq!(loaded.otp_secret, entry.otp_secret);
    assert_eq!(loaded.notes, entry.notes);
    let state = loaded.otp.expect("otp derived on read");
    assert_eq!(state.code.len(), 6);
    assert!(state.remaining_secs < 30);
    assert_eq!(loaded.raw, codec::serialize(&entry));
}

#[test]
fn test_delete_then_list_and_read() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir);
    let leaf = store
        .create("team", &CredentialEntry::new("vpn", "x"))
        .unwrap();
    store
        .create("team", &CredentialEntry::new("wiki", "y"))
        .unwrap();
    assert_eq!(child_names(&store, "team"), vec!["team/vpn", "team/wiki"]);

    store.delete(&leaf).unwrap();
    assert_eq!(child_names(&store, "team"), vec!["team/wiki"]);
    assert!(matches!(store.read(&leaf), Err(StoreError::NotFound { .. })));
}

#[test]
fn test_foreign_files_are_tolerated() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir);
    // A body written by another tool: unknown lines degrade to notes.
    let body = "pw\ncustom_field_without_colon\nlogin: bob\n";
    let crypto = MemoryCrypto::new();
    let ciphertext =
        passbook::core::crypto::CryptoProvider::encrypt(&crypto, dir.path(), body.as_bytes())
            .unwrap();
    fs::write(dir.path().join("legacy.gpg"), ciphertext).unwrap();
    fs::write(dir.path().join(".gpg-id"), b"ABCDEF").unwrap();

    let leaf = store.leaf("legacy").unwrap();
    let entry = store.read(&leaf).unwrap();
    assert_eq!(entry.password, "pw");
    assert_eq!(
        entry.notes.as_deref(),
        Some("custom_field_without_colon\nlogin: bob")
    );

    let children: Vec<_> = store
        .list("")
        .unwrap()
        .iter()
        .unwrap()
        .map(Result::unwrap)
        .collect();
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].kind, NodeKind::Leaf);
}

#[test]
fn test_index_tracks_mutations() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir);
    store
        .create("work/aws", &CredentialEntry::new("console", "1"))
        .unwrap();
    let github = store
        .create("", &CredentialEntry::new("github", "2"))
        .unwrap();

    let mut index = DirectoryIndex::build(store.root(), ".gpg").unwrap();
    assert_eq!(index.len(), 2);
    let hits = index.search("aws").unwrap();
    assert_eq!(hits[0].name, "work/aws/console");

    store.delete(&github).unwrap();
    assert!(index.remove_leaf(&github.path));
    assert_eq!(index, DirectoryIndex::build(store.root(), ".gpg").unwrap());
}

#[test]
fn test_rename_keeps_content_and_frees_old_name() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir);
    let mut entry = CredentialEntry::new("old", "pw");
    entry.otp_secret = Some(SECRET.into());
    let leaf = store.create("", &entry).unwrap();

    let mut edited = store.read(&leaf).unwrap();
    edited.name = "archive/old".into();
    let moved = store.update(&leaf, &edited).unwrap();

    assert!(store.read(&leaf).unwrap_err().is_not_found());
    let loaded = store.read(&moved).unwrap();
    assert_eq!(loaded.otp_secret.as_deref(), Some(SECRET));
    store.create("", &CredentialEntry::new("old", "new")).unwrap();
}

#[test]
fn test_otp_window_regenerates_near_full() {
    let uri = otp::provisioning_uri(SECRET);
    for t in [0u64, 1, 29, 30, 59, 1_700_000_000] {
        let state = otp::derive_at(&uri, t).unwrap().unwrap();
        assert!(state.remaining_secs < 30);
        if state.remaining_secs == 0 {
            let next = otp::derive_at(&uri, t + 1).unwrap().unwrap();
            assert_eq!(next.remaining_secs, 29);
        }
    }
}
