//! The directory tree of encrypted entries.
//!
//! One file per entry, `<root>/<name><suffix>`, holding the ciphertext of the
//! codec body. The store owns those files; nothing else writes them.
//!
//! There is no internal locking. Callers issue one mutating operation at a
//! time per store and never race a mutation against sync.

use crate::constants;
use crate::core::codec;
use crate::core::crypto::{CryptoError, CryptoProvider};
use crate::core::error::{StoreError, StoreResult};
use crate::models::config::StoreConfig;
use crate::models::entry::CredentialEntry;
use crate::models::node::{Leaf, NodeKind};
use crate::util::{fs as store_fs, path as store_path};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use zeroize::Zeroizing;

/// Check an entry identifier: `[A-Za-z0-9_\-./]+`, relative, not ending in
/// `/` or `.`, with no empty, `.`/`..` or hidden components.
pub fn validate_name(name: &str) -> StoreResult<()> {
    if name.is_empty() {
        return Err(StoreError::validation(name, "name cannot be empty"));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '/'))
    {
        return Err(StoreError::validation(name, "only [A-Za-z0-9_-./] allowed"));
    }
    if name.ends_with('/') || name.ends_with('.') {
        return Err(StoreError::validation(name, "must not end in '/' or '.'"));
    }
    if name.starts_with('/') {
        return Err(StoreError::validation(name, "must be relative to the store root"));
    }
    for part in name.split('/') {
        if part.is_empty() {
            return Err(StoreError::validation(name, "empty path component"));
        }
        if part == "." || part == ".." {
            return Err(StoreError::validation(name, "path traversal not allowed"));
        }
        if part.starts_with('.') {
            return Err(StoreError::validation(name, "hidden components are not allowed"));
        }
    }
    Ok(())
}

/// Reject field values the line-oriented body cannot carry.
pub fn validate_fields(entry: &CredentialEntry) -> StoreResult<()> {
    let single_line = [
        ("password", Some(entry.password.as_str())),
        ("username", entry.username.as_deref()),
        ("url", entry.url.as_deref()),
        ("otp_secret", entry.otp_secret.as_deref()),
    ];
    for (field, value) in single_line {
        if value.is_some_and(|v| v.contains(['\n', '\r'])) {
            return Err(StoreError::validation(
                &entry.name,
                format!("{} must be a single line", field),
            ));
        }
    }
    let optional = [
        ("username", entry.username.as_deref()),
        ("url", entry.url.as_deref()),
        ("otp_secret", entry.otp_secret.as_deref()),
        ("notes", entry.notes.as_deref()),
    ];
    for (field, value) in optional {
        if value == Some("") {
            return Err(StoreError::validation(
                &entry.name,
                format!("{} is empty; leave it unset instead", field),
            ));
        }
    }
    for (field, value) in [("username", &entry.username), ("url", &entry.url)] {
        if value.as_deref().is_some_and(|v| v.trim() != v) {
            return Err(StoreError::validation(
                &entry.name,
                format!("{} must not start or end with whitespace", field),
            ));
        }
    }
    if entry.notes.as_deref().is_some_and(|v| v.contains('\r')) {
        return Err(StoreError::validation(
            &entry.name,
            "notes must not contain carriage returns",
        ));
    }
    if let Some(secret) = &entry.otp_secret {
        if !secret.chars().all(|c| c.is_ascii_alphanumeric() || c == '=') {
            return Err(StoreError::validation(
                &entry.name,
                "otp secret must be base32 text",
            ));
        }
    }
    for (key, value) in &entry.extra {
        if key.is_empty() || key.contains([':', '\n', '\r']) || key.starts_with(' ') {
            return Err(StoreError::validation(
                &entry.name,
                format!("invalid field key '{}'", key),
            ));
        }
        if codec::RESERVED_FIELDS.contains(&key.as_str()) || codec::is_recognized_key(key) {
            return Err(StoreError::validation(
                &entry.name,
                format!("'{}' is a built-in field", key),
            ));
        }
        if value.contains(['\n', '\r']) {
            return Err(StoreError::validation(
                &entry.name,
                format!("field '{}' must be a single line", key),
            ));
        }
    }
    Ok(())
}

/// An immediate child reported by [`SecretStore::list`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedChild {
    pub kind: NodeKind,
    /// Identifier relative to the store root.
    pub name: String,
    pub path: PathBuf,
}

/// Immediate children of one directory. Each call to [`Children::iter`]
/// re-reads the directory, so the listing can be restarted at will.
#[derive(Debug, Clone)]
pub struct Children {
    root: PathBuf,
    dir: PathBuf,
    suffix: String,
}

impl Children {
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn iter(&self) -> StoreResult<ChildIter> {
        let inner = fs::read_dir(&self.dir).map_err(|e| StoreError::io(&self.dir, e))?;
        Ok(ChildIter {
            inner,
            root: self.root.clone(),
            dir: self.dir.clone(),
            suffix: self.suffix.clone(),
        })
    }
}

/// Lazy walk over one directory: hidden names and non-entry files are skipped.
#[derive(Debug)]
pub struct ChildIter {
    inner: fs::ReadDir,
    root: PathBuf,
    dir: PathBuf,
    suffix: String,
}

impl Iterator for ChildIter {
    type Item = StoreResult<ListedChild>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let dirent = match self.inner.next()? {
                Ok(d) => d,
                Err(e) => return Some(Err(StoreError::io(&self.dir, e))),
            };
            let file_name = dirent.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };
            if file_name.starts_with('.') {
                continue;
            }
            let path = dirent.path();
            if path.is_dir() {
                let Some(name) = path
                    .strip_prefix(&self.root)
                    .ok()
                    .and_then(store_path::relative_name)
                else {
                    continue;
                };
                return Some(Ok(ListedChild {
                    kind: NodeKind::Branch,
                    name,
                    path,
                }));
            }
            if path.is_file() {
                match store_path::entry_name(&self.root, &path, &self.suffix) {
                    Some(name) => {
                        return Some(Ok(ListedChild {
                            kind: NodeKind::Leaf,
                            name,
                            path,
                        }))
                    }
                    None => debug!(path = %path.display(), "skipping non-entry file"),
                }
            }
        }
    }
}

pub struct SecretStore {
    config: StoreConfig,
    crypto: Box<dyn CryptoProvider + Send>,
}

impl SecretStore {
    pub fn new(config: StoreConfig, crypto: impl CryptoProvider + Send + 'static) -> Self {
        Self {
            config,
            crypto: Box::new(crypto),
        }
    }

    pub fn root(&self) -> &Path {
        &self.config.store_root
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Resolve an identifier to its leaf. Does not check that the file exists.
    pub fn leaf(&self, name: &str) -> StoreResult<Leaf> {
        validate_name(name)?;
        let path = store_path::entry_path(self.root(), name, &self.config.suffix);
        if !store_path::is_within(&path, self.root()) {
            return Err(StoreError::validation(name, "resolves outside the store root"));
        }
        Ok(Leaf::new(name, path))
    }

    /// Immediate children of the directory `dir` (relative; empty for the root).
    pub fn list(&self, dir: &str) -> StoreResult<Children> {
        let dir = dir.trim_end_matches('/');
        let path = if dir.is_empty() {
            self.root().to_path_buf()
        } else {
            validate_name(dir)?;
            self.root().join(dir)
        };
        if !path.is_dir() {
            return Err(StoreError::NotFound { path });
        }
        debug!(dir = %path.display(), "listing directory");
        Ok(Children {
            root: self.root().to_path_buf(),
            dir: path,
            suffix: self.config.suffix.clone(),
        })
    }

    pub fn read(&self, leaf: &Leaf) -> StoreResult<CredentialEntry> {
        debug!(entry = %leaf.name, "reading entry");
        let ciphertext = fs::read(&leaf.path).map_err(|e| StoreError::io(&leaf.path, e))?;
        let plaintext = self
            .crypto
            .decrypt(
                &ciphertext,
                &self.config.private_key_path,
                &self.config.passphrase,
                &self.config.public_key_path,
            )
            .map_err(|source| StoreError::Decryption {
                path: leaf.path.clone(),
                source,
            })?;
        let text = std::str::from_utf8(&plaintext).map_err(|_| StoreError::Decryption {
            path: leaf.path.clone(),
            source: CryptoError::Rejected("plaintext is not UTF-8".into()),
        })?;
        let mut entry = codec::parse(text);
        entry.name = leaf.name.clone();
        Ok(entry)
    }

    /// Write a new entry at `<parent>/<entry.name>`. Never overwrites.
    pub fn create(&self, parent: &str, entry: &CredentialEntry) -> StoreResult<Leaf> {
        validate_name(&entry.name)?;
        let parent = parent.trim_end_matches('/');
        let name = if parent.is_empty() {
            entry.name.clone()
        } else {
            format!("{}/{}", parent, entry.name)
        };
        let leaf = self.leaf(&name)?;
        validate_fields(entry)?;
        if leaf.path.exists() {
            return Err(StoreError::Conflict { path: leaf.path });
        }
        let ciphertext = self.seal(&name, entry)?;
        self.write(&leaf.path, &ciphertext, false)?;
        info!(entry = %name, "created entry");
        Ok(leaf)
    }

    /// Replace the entry behind `leaf`. A different `entry.name` renames it:
    /// the new file is written first, then the old one removed.
    pub fn update(&self, leaf: &Leaf, entry: &CredentialEntry) -> StoreResult<Leaf> {
        if !leaf.path.is_file() {
            return Err(StoreError::NotFound {
                path: leaf.path.clone(),
            });
        }
        let name = if entry.name.is_empty() {
            leaf.name.as_str()
        } else {
            entry.name.as_str()
        };
        let target = self.leaf(name)?;
        validate_fields(entry)?;

        if target.path == leaf.path {
            let ciphertext = self.seal(name, entry)?;
            self.write(&target.path, &ciphertext, true)?;
            info!(entry = %name, "updated entry");
            return Ok(target);
        }

        if target.path.exists() {
            return Err(StoreError::Conflict { path: target.path });
        }
        let ciphertext = self.seal(name, entry)?;
        self.write(&target.path, &ciphertext, false)?;
        fs::remove_file(&leaf.path).map_err(|e| StoreError::io(&leaf.path, e))?;
        info!(from = %leaf.name, to = %name, "renamed entry");
        Ok(target)
    }

    /// Remove the entry file. No decryption is involved.
    pub fn delete(&self, leaf: &Leaf) -> StoreResult<()> {
        fs::remove_file(&leaf.path).map_err(|e| StoreError::io(&leaf.path, e))?;
        info!(entry = %leaf.name, "deleted entry");
        Ok(())
    }

    fn seal(&self, name: &str, entry: &CredentialEntry) -> StoreResult<Vec<u8>> {
        let body = Zeroizing::new(codec::serialize(entry));
        if body.len() > constants::MAX_ENTRY_SIZE {
            return Err(StoreError::validation(
                name,
                format!("body exceeds {} bytes", constants::MAX_ENTRY_SIZE),
            ));
        }
        self.crypto
            .encrypt(&self.config.public_key_path, body.as_bytes())
            .map_err(|source| StoreError::Encryption {
                name: name.to_string(),
                source,
            })
    }

    /// Write through a hidden temp file in the target directory, then move it
    /// into place so readers never see a partial entry.
    fn write(&self, path: &Path, data: &[u8], overwrite: bool) -> StoreResult<()> {
        let dir = path.parent().unwrap_or_else(|| self.root());
        store_fs::create_dirs_within(self.root(), dir, constants::STORE_DIR_MODE)
            .map_err(|e| StoreError::io(dir, e))?;

        let mut tmp = tempfile::Builder::new()
            .prefix(".entry-")
            .tempfile_in(dir)
            .map_err(|e| StoreError::io(dir, e))?;
        tmp.write_all(data).map_err(|e| StoreError::io(path, e))?;
        tmp.as_file()
            .sync_all()
            .map_err(|e| StoreError::io(path, e))?;
        store_fs::set_permissions(tmp.path(), constants::ENTRY_FILE_MODE)
            .map_err(|e| StoreError::io(path, e))?;

        let persisted = if overwrite {
            tmp.persist(path)
        } else {
            tmp.persist_noclobber(path)
        };
        persisted.map_err(|e| {
            if e.error.kind() == ErrorKind::AlreadyExists {
                StoreError::Conflict {
                    path: path.to_path_buf(),
                }
            } else {
                StoreError::io(path, e.error)
            }
        })?;
        Ok(())
    }
}
