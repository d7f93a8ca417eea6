use crate::cli::CliContext;
use crate::constants;
use crate::core::config;
use crate::models::config::ConfigFile;
use crate::util::{fs as store_fs, git::GitCli};
use anyhow::{bail, Context, Result};
use clap::Args;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Store root (default: ~/.password-store)
    #[arg(long, value_name = "PATH")]
    pub store_root: Option<PathBuf>,

    /// Armored public key used to encrypt entries
    #[arg(long, value_name = "PATH")]
    pub public_key: Option<PathBuf>,

    /// Armored private key used to decrypt entries
    #[arg(long, value_name = "PATH")]
    pub private_key: Option<PathBuf>,

    /// Git remote of the store
    #[arg(long, value_name = "URL")]
    pub remote: Option<String>,

    /// Clone the remote into an empty store root
    #[arg(long)]
    pub clone: bool,

    /// Never contact the remote during sync
    #[arg(long)]
    pub offline: bool,
}

pub fn run(ctx: &CliContext, args: InitArgs) -> Result<()> {
    let paths = &ctx.paths;
    if !paths.dir.exists() {
        store_fs::ensure_dir(&paths.dir, constants::CONFIG_DIR_MODE)?;
    }
    let _lock = ctx.lock()?;

    // Re-running init updates the existing file instead of replacing it.
    let mut file = if paths.config_file.exists() {
        config::load(&paths.config_file)?
    } else {
        ConfigFile::default()
    };
    apply(&mut file, &args);

    if args.clone {
        let remote = file
            .sync
            .remote
            .clone()
            .context("--clone needs a remote: pass --remote or set [sync] remote")?;
        if !is_empty_dir(&file.store.root)? {
            bail!(
                "cannot clone into {}: directory is not empty",
                file.store.root.display()
            );
        }
        GitCli::new(&file.store.root)
            .clone_from(&remote)
            .with_context(|| format!("clone {}", remote))?;
        println!("Cloned {} into {}", remote, file.store.root.display());
    }
    store_fs::ensure_dir(&file.store.root, constants::STORE_DIR_MODE)?;

    config::save(&paths.config_file, &file)?;
    println!("Config written to {}", paths.config_file.display());
    println!("Store root: {}", file.store.root.display());

    for (label, key) in [("public", &file.keys.public_key), ("private", &file.keys.private_key)] {
        if key.as_os_str().is_empty() {
            println!("note: no {} key configured (set [keys] {}_key)", label, label);
        } else if !key.is_file() {
            println!("warning: {} key {} does not exist", label, key.display());
        }
    }
    Ok(())
}

fn apply(file: &mut ConfigFile, args: &InitArgs) {
    if let Some(root) = &args.store_root {
        file.store.root = root.clone();
    }
    if let Some(key) = &args.public_key {
        file.keys.public_key = key.clone();
    }
    if let Some(key) = &args.private_key {
        file.keys.private_key = key.clone();
    }
    if let Some(remote) = &args.remote {
        file.sync.remote = Some(remote.clone());
    }
    if args.offline {
        file.sync.offline = true;
    }
}

fn is_empty_dir(path: &Path) -> Result<bool> {
    if !path.exists() {
        return Ok(true);
    }
    let mut entries =
        fs::read_dir(path).with_context(|| format!("read directory {}", path.display()))?;
    Ok(entries.next().is_none())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn args() -> InitArgs {
        InitArgs {
            store_root: None,
            public_key: None,
            private_key: None,
            remote: None,
            clone: false,
            offline: false,
        }
    }

    #[test]
    fn test_apply_only_overrides_given_fields() {
        let mut file = ConfigFile::default();
        file.keys.private_key = PathBuf::from("/k/priv.asc");
        let mut a = args();
        a.store_root = Some(PathBuf::from("/data/store"));
        a.offline = true;
        apply(&mut file, &a);
        assert_eq!(file.store.root, PathBuf::from("/data/store"));
        assert_eq!(file.keys.private_key, PathBuf::from("/k/priv.asc"));
        assert!(file.sync.offline);
    }

    #[test]
    fn test_is_empty_dir() {
        let dir = TempDir::new().unwrap();
        assert!(is_empty_dir(&dir.path().join("missing")).unwrap());
        assert!(is_empty_dir(dir.path()).unwrap());
        fs::write(dir.path().join("x"), b"x").unwrap();
        assert!(!is_empty_dir(dir.path()).unwrap());
    }
}
