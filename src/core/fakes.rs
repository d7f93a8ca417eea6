//! In-memory stand-ins for the crypto and version-control services.
//!
//! They let store, sync and worker behaviour be exercised without `gpg` or
//! `git` installed.

use crate::core::crypto::{CryptoError, CryptoProvider};
use crate::core::error::SyncStep;
use crate::core::vcs::{VcsError, VersionControl, WorkTreeStatus};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use zeroize::Zeroizing;

const MAGIC: &[u8] = b"memcrypt:";

/// Reversible fake cipher. Output never contains the plaintext verbatim.
#[derive(Debug, Clone, Default)]
pub struct MemoryCrypto {
    passphrase: Option<String>,
    fail_encrypt: bool,
}

impl MemoryCrypto {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only decrypt when given exactly this passphrase.
    pub fn with_passphrase(mut self, passphrase: &str) -> Self {
        self.passphrase = Some(passphrase.to_string());
        self
    }

    pub fn failing_encrypt(mut self) -> Self {
        self.fail_encrypt = true;
        self
    }
}

impl CryptoProvider for MemoryCrypto {
    fn encrypt(&self, _public_key: &Path, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        if self.fail_encrypt {
            return Err(CryptoError::Rejected("encryption disabled".into()));
        }
        let mut out = MAGIC.to_vec();
        out.extend(plaintext.iter().map(|b| b ^ 0x5a));
        Ok(out)
    }

    fn decrypt(
        &self,
        ciphertext: &[u8],
        _private_key: &Path,
        passphrase: &str,
        _public_key: &Path,
    ) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
        if let Some(expected) = &self.passphrase {
            if expected != passphrase {
                return Err(CryptoError::Rejected("bad passphrase".into()));
            }
        }
        let body = ciphertext
            .strip_prefix(MAGIC)
            .ok_or_else(|| CryptoError::Rejected("corrupted ciphertext".into()))?;
        Ok(Zeroizing::new(body.iter().map(|b| b ^ 0x5a).collect()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VcsCall {
    Status,
    Pull,
    Commit(String),
    AddAll,
    Push,
}

/// Records every call in order. Clones share the same log.
#[derive(Debug, Clone)]
pub struct RecordingVcs {
    calls: Arc<Mutex<Vec<VcsCall>>>,
    clean: bool,
    fail_on: Option<SyncStep>,
    pull_writes: Option<(PathBuf, Vec<u8>)>,
}

impl RecordingVcs {
    pub fn new(clean: bool) -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            clean,
            fail_on: None,
            pull_writes: None,
        }
    }

    pub fn failing_on(mut self, step: SyncStep) -> Self {
        self.fail_on = Some(step);
        self
    }

    /// Make `pull` drop a file into the work tree, as a remote change would.
    pub fn with_pull_file(mut self, path: impl Into<PathBuf>, contents: &[u8]) -> Self {
        self.pull_writes = Some((path.into(), contents.to_vec()));
        self
    }

    pub fn calls(&self) -> Vec<VcsCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, call: VcsCall, step: SyncStep) -> Result<(), VcsError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
        if self.fail_on == Some(step) {
            return Err(VcsError::Rejected(format!("{} rejected", step)));
        }
        Ok(())
    }
}

impl VersionControl for RecordingVcs {
    fn status(&self) -> Result<WorkTreeStatus, VcsError> {
        self.record(VcsCall::Status, SyncStep::Status)?;
        Ok(WorkTreeStatus { clean: self.clean })
    }

    fn pull(&self) -> Result<(), VcsError> {
        self.record(VcsCall::Pull, SyncStep::Pull)?;
        if let Some((path, contents)) = &self.pull_writes {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)
                    .map_err(|e| VcsError::Rejected(e.to_string()))?;
            }
            fs::write(path, contents).map_err(|e| VcsError::Rejected(e.to_string()))?;
        }
        Ok(())
    }

    fn push(&self) -> Result<(), VcsError> {
        self.record(VcsCall::Push, SyncStep::Push)
    }

    fn commit(&self, message: &str) -> Result<(), VcsError> {
        self.record(VcsCall::Commit(message.to_string()), SyncStep::Commit)
    }

    fn add_all(&self) -> Result<(), VcsError> {
        self.record(VcsCall::AddAll, SyncStep::AddAll)
    }
}
