//! Cross-process lock serializing mutating commands and sync on one store.

use crate::constants;
use crate::util::fs::ensure_dir;
use anyhow::{bail, Context, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::path::Path;
use tracing::info;

/// Exclusive flock on the store lock file. Released on drop.
#[derive(Debug)]
pub struct StoreLock {
    _file: File,
}

impl StoreLock {
    /// Take the lock. When another process holds it, either wait for it or
    /// fail straight away.
    pub fn acquire(path: &Path, wait: bool) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty() && !p.exists()) {
            ensure_dir(parent, constants::CONFIG_DIR_MODE)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)
            .with_context(|| format!("open lock file {}", path.display()))?;

        match file.try_lock_exclusive() {
            Ok(()) => return Ok(Self { _file: file }),
            Err(e) if !is_contended(&e) => {
                return Err(e).with_context(|| format!("lock {}", path.display()))
            }
            Err(_) => {}
        }
        if !wait {
            bail!(
                "store is busy: another passbook process holds {}",
                path.display()
            );
        }
        info!(lock = %path.display(), "waiting for another passbook process");
        file.lock_exclusive()
            .with_context(|| format!("acquire lock {}", path.display()))?;
        Ok(Self { _file: file })
    }
}

fn is_contended(e: &std::io::Error) -> bool {
    // fs2 on Linux may report EAGAIN as Other
    e.kind() == ErrorKind::WouldBlock || e.raw_os_error() == Some(11)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_acquire_creates_lock_file() {
        let dir = TempDir::new().unwrap();
        let lock_path = dir.path().join("sub").join("store.lock");
        let _lock = StoreLock::acquire(&lock_path, false).unwrap();
        assert!(lock_path.exists());
    }

    #[test]
    fn test_second_acquire_without_wait_fails() {
        let dir = TempDir::new().unwrap();
        let lock_path = dir.path().join("store.lock");
        let _lock = StoreLock::acquire(&lock_path, false).unwrap();
        let err = StoreLock::acquire(&lock_path, false).unwrap_err();
        assert!(err.to_string().contains("busy"));
    }

    #[test]
    fn test_released_on_drop() {
        let dir = TempDir::new().unwrap();
        let lock_path = dir.path().join("store.lock");
        {
            let _lock = StoreLock::acquire(&lock_path, false).unwrap();
        }
        assert!(StoreLock::acquire(&lock_path, false).is_ok());
    }
}
