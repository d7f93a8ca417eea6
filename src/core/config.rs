//! Load and save `config.toml`.

use crate::constants;
use crate::models::config::ConfigFile;
use crate::util::fs::ensure_dir;
use anyhow::{bail, Context, Result};
use std::fs;
use std::io::Write;
use std::path::Path;

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

pub fn load(path: &Path) -> Result<ConfigFile> {
    if !path.exists() {
        bail!(
            "config file {} not found. Run: passbook init",
            path.display()
        );
    }
    let content =
        fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
    let config: ConfigFile =
        toml::from_str(&content).with_context(|| format!("parse config {}", path.display()))?;
    if config.store.suffix.is_empty() {
        bail!("config {}: [store] suffix cannot be empty", path.display());
    }
    Ok(config)
}

/// Write through a temp file in the same directory, mode 0600.
pub fn save(path: &Path, config: &ConfigFile) -> Result<()> {
    let content = toml::to_string_pretty(config).context("serialize config")?;
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    if !parent.exists() {
        ensure_dir(parent, constants::CONFIG_DIR_MODE)?;
    }

    let mut tmp = tempfile::NamedTempFile::new_in(parent).context("create temp config")?;
    tmp.write_all(content.as_bytes()).context("write config")?;
    tmp.flush().ok();

    #[cfg(unix)]
    {
        let perm = fs::Permissions::from_mode(constants::CONFIG_FILE_MODE);
        tmp.as_file()
            .set_permissions(perm)
            .context("set permissions on temp config")?;
    }

    tmp.persist(path)
        .map_err(|err| anyhow::anyhow!("persist config {}: {}", path.display(), err))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_suggests_init() {
        let dir = TempDir::new().unwrap();
        let err = load(&dir.path().join("config.toml")).unwrap_err();
        assert!(err.to_string().contains("passbook init"));
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cfg").join("config.toml");
        let mut config = ConfigFile::default();
        config.store.root = PathBuf::from("/data/store");
        config.keys.public_key = PathBuf::from("/k/pub.asc");
        config.sync.offline = true;
        save(&path, &config).unwrap();

        let loaded = load(&path).unwrap();
        assert_eq!(loaded.store.root, PathBuf::from("/data/store"));
        assert_eq!(loaded.keys.public_key, PathBuf::from("/k/pub.asc"));
        assert!(loaded.sync.offline);
        assert!(loaded.keys.passphrase.is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_saved_config_is_private() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        save(&path, &ConfigFile::default()).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }

    #[test]
    fn test_empty_suffix_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[store]\nsuffix = \"\"\n").unwrap();
        assert!(load(&path).is_err());
    }
}
