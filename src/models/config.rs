//! Configuration file model.

use crate::constants;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use zeroize::Zeroizing;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub store: StoreSection,
    #[serde(default)]
    pub keys: KeySection,
    #[serde(default)]
    pub sync: SyncSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSection {
    #[serde(default = "default_root")]
    pub root: PathBuf,
    #[serde(default = "default_suffix")]
    pub suffix: String,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            root: default_root(),
            suffix: default_suffix(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeySection {
    #[serde(default)]
    pub public_key: PathBuf,
    #[serde(default)]
    pub private_key: PathBuf,
    /// Key passphrase. Prompted for at use time when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passphrase: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncSection {
    /// Skip every version-control call during sync.
    #[serde(default)]
    pub offline: bool,
    /// Remote cloned by `init --clone`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote: Option<String>,
}

fn default_root() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(constants::DEFAULT_STORE_DIR)
}

fn default_suffix() -> String {
    constants::ENTRY_SUFFIX.to_string()
}

/// Runtime configuration, built once and handed to the store and sync constructors.
#[derive(Clone)]
pub struct StoreConfig {
    pub public_key_path: PathBuf,
    pub private_key_path: PathBuf,
    pub passphrase: Zeroizing<String>,
    pub store_root: PathBuf,
    pub suffix: String,
    pub offline: bool,
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("public_key_path", &self.public_key_path)
            .field("private_key_path", &self.private_key_path)
            .field("passphrase", &"<redacted>")
            .field("store_root", &self.store_root)
            .field("suffix", &self.suffix)
            .field("offline", &self.offline)
            .finish()
    }
}

impl StoreConfig {
    /// Resolve the runtime view of a config file. An explicit passphrase wins
    /// over the one stored in the file.
    pub fn from_file(file: &ConfigFile, passphrase: Option<Zeroizing<String>>) -> Self {
        let passphrase = passphrase
            .or_else(|| file.keys.passphrase.clone().map(Zeroizing::new))
            .unwrap_or_else(|| Zeroizing::new(String::new()));
        Self {
            public_key_path: file.keys.public_key.clone(),
            private_key_path: file.keys.private_key.clone(),
            passphrase,
            store_root: file.store.root.clone(),
            suffix: file.store.suffix.clone(),
            offline: file.sync.offline,
        }
    }

    /// Minimal config for a store rooted at `root`, mostly for tests.
    pub fn for_root(root: impl Into<PathBuf>) -> Self {
        Self {
            public_key_path: PathBuf::new(),
            private_key_path: PathBuf::new(),
            passphrase: Zeroizing::new(String::new()),
            store_root: root.into(),
            suffix: default_suffix(),
            offline: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let file: ConfigFile = toml::from_str("").unwrap();
        assert_eq!(file.store.suffix, ".gpg");
        assert!(!file.sync.offline);
        assert!(file.keys.passphrase.is_none());
    }

    #[test]
    fn test_explicit_passphrase_overrides_file() {
        let mut file = ConfigFile::default();
        file.keys.passphrase = Some("from-file".into());
        let cfg = StoreConfig::from_file(&file, Some(Zeroizing::new("from-cli".into())));
        assert_eq!(cfg.passphrase.as_str(), "from-cli");
        let cfg = StoreConfig::from_file(&file, None);
        assert_eq!(cfg.passphrase.as_str(), "from-file");
    }

    #[test]
    fn test_parse_full_file() {
        let content = r#"
            [store]
            root = "/data/store"

            [keys]
            public_key = "/k/pub.asc"
            private_key = "/k/priv.asc"

            [sync]
            offline = true
            remote = "git@example.com:me/store.git"
        "#;
        let file: ConfigFile = toml::from_str(content).unwrap();
        let cfg = StoreConfig::from_file(&file, None);
        assert_eq!(cfg.store_root, PathBuf::from("/data/store"));
        assert_eq!(cfg.public_key_path, PathBuf::from("/k/pub.asc"));
        assert!(cfg.offline);
        assert!(cfg.passphrase.is_empty());
        assert_eq!(file.sync.remote.as_deref(), Some("git@example.com:me/store.git"));
    }
}
