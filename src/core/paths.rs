//! Location of the configuration directory and the files inside it.

use crate::constants;
use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

pub const CONFIG_ENV: &str = "PASSBOOK_CONFIG";

#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub dir: PathBuf,
    pub config_file: PathBuf,
    pub lock_file: PathBuf,
}

impl ConfigPaths {
    /// Resolve from an explicit config file, `PASSBOOK_CONFIG`, or `~/.passbook`.
    pub fn resolve(config_arg: Option<PathBuf>) -> Result<Self> {
        if let Some(file) = config_arg {
            return Ok(Self::from_file(file));
        }
        if let Ok(file) = env::var(CONFIG_ENV) {
            if !file.is_empty() {
                return Ok(Self::from_file(PathBuf::from(file)));
            }
        }
        let home = dirs::home_dir().context("cannot determine home directory")?;
        Ok(Self::from_dir(home.join(constants::CONFIG_DIR_NAME)))
    }

    pub fn from_dir(dir: PathBuf) -> Self {
        let config_file = dir.join(constants::CONFIG_FILE_NAME);
        let lock_file = dir.join(constants::LOCK_FILE_NAME);
        Self {
            dir,
            config_file,
            lock_file,
        }
    }

    /// The lock lives beside an explicitly chosen config file.
    pub fn from_file(config_file: PathBuf) -> Self {
        let dir = config_file
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        let lock_file = dir.join(constants::LOCK_FILE_NAME);
        Self {
            dir,
            config_file,
            lock_file,
        }
    }
}

impl std::fmt::Display for ConfigPaths {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.config_file.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_dir() {
        let paths = ConfigPaths::from_dir(PathBuf::from("/home/u/.passbook"));
        assert_eq!(paths.config_file, PathBuf::from("/home/u/.passbook/config.toml"));
        assert_eq!(paths.lock_file, PathBuf::from("/home/u/.passbook/store.lock"));
    }

    #[test]
    fn test_from_file_puts_lock_beside_it() {
        let paths = ConfigPaths::from_file(PathBuf::from("/etc/pb/custom.toml"));
        assert_eq!(paths.dir, PathBuf::from("/etc/pb"));
        assert_eq!(paths.lock_file, PathBuf::from("/etc/pb/store.lock"));
        let bare = ConfigPaths::from_file(PathBuf::from("custom.toml"));
        assert_eq!(bare.lock_file, PathBuf::from("./store.lock"));
    }

    #[test]
    fn test_explicit_arg_wins() {
        let paths = ConfigPaths::resolve(Some(PathBuf::from("/x/c.toml"))).unwrap();
        assert_eq!(paths.config_file, PathBuf::from("/x/c.toml"));
    }
}
