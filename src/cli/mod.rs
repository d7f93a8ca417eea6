//! CLI routing and command dispatch.

use crate::core::config;
use crate::core::file_lock::StoreLock;
use crate::core::paths::ConfigPaths;
use crate::core::store::SecretStore;
use crate::core::sync::SyncCoordinator;
use crate::models::config::{ConfigFile, StoreConfig};
use crate::util::{git::GitCli, gpg::GpgCli};
use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use dialoguer::Password;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use zeroize::Zeroizing;

pub mod browse;
pub mod doctor;
pub mod entry;
pub mod generate;
pub mod init;
pub mod list;
pub mod otp;
pub mod sync;

/// Shared context passed to all command handlers.
pub struct CliContext {
    pub paths: ConfigPaths,
    pub non_interactive: bool,
    passphrase: Option<Zeroizing<String>>,
}

impl CliContext {
    pub fn load_config(&self) -> Result<ConfigFile> {
        config::load(&self.paths.config_file)
    }

    /// Runtime config. With `decrypting`, a passphrase missing from both the
    /// command line and the config file is prompted for.
    pub fn store_config(&self, decrypting: bool) -> Result<StoreConfig> {
        let file = self.load_config()?;
        let mut cfg = StoreConfig::from_file(&file, self.passphrase.clone());
        if decrypting && file.keys.passphrase.is_none() && self.passphrase.is_none() {
            if self.non_interactive {
                anyhow::bail!("--non-interactive requires PASSBOOK_PASSPHRASE or [keys] passphrase");
            }
            cfg.passphrase = Zeroizing::new(
                Password::new()
                    .with_prompt("Key passphrase")
                    .allow_empty_password(true)
                    .interact()
                    .context("read passphrase from prompt")?,
            );
        }
        Ok(cfg)
    }

    pub fn open_store(&self, decrypting: bool) -> Result<SecretStore> {
        let cfg = self.store_config(decrypting)?;
        if !cfg.store_root.is_dir() {
            anyhow::bail!(
                "store root {} does not exist. Run: passbook init",
                cfg.store_root.display()
            );
        }
        Ok(SecretStore::new(cfg, GpgCli::new()))
    }

    pub fn sync_coordinator(&self, cfg: &StoreConfig) -> SyncCoordinator {
        SyncCoordinator::new(cfg, GitCli::new(&cfg.store_root))
    }

    /// Exclusive store lock for mutating commands. Interactive runs wait for
    /// it; non-interactive runs fail fast.
    pub fn lock(&self) -> Result<StoreLock> {
        StoreLock::acquire(&self.paths.lock_file, !self.non_interactive)
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "passbook",
    version,
    about = "Encrypted file-per-entry password store with git sync"
)]
pub struct Cli {
    /// Config file (default: ~/.passbook/config.toml, or $PASSBOOK_CONFIG)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Run in non-interactive mode (no prompts, suitable for scripts)
    #[arg(long, global = true, env = "PASSBOOK_NON_INTERACTIVE")]
    pub non_interactive: bool,

    /// Key passphrase; prefer the environment variable over the flag
    #[arg(long, global = true, env = "PASSBOOK_PASSPHRASE", hide_env_values = true)]
    pub passphrase: Option<String>,

    /// More log output on stderr (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        init_tracing(self.verbose);
        let paths = ConfigPaths::resolve(self.config)?;
        let ctx = CliContext {
            paths,
            non_interactive: self.non_interactive,
            passphrase: self.passphrase.map(Zeroizing::new),
        };

        match self.command {
            Commands::Init(args) => init::run(&ctx, args),
            Commands::Ls(args) => list::run_ls(&ctx, args),
            Commands::Tree(args) => list::run_tree(&ctx, args),
            Commands::Find(args) => list::run_find(&ctx, args),
            Commands::Show(args) => entry::run_show(&ctx, args),
            Commands::Add(args) => entry::run_add(&ctx, args),
            Commands::Edit(args) => entry::run_edit(&ctx, args),
            Commands::Rm(args) => entry::run_rm(&ctx, args),
            Commands::Otp(args) => otp::run(&ctx, args),
            Commands::Sync(args) => sync::run(&ctx, args),
            Commands::Generate(args) => generate::run(&ctx, args),
            Commands::Browse(args) => browse::run(&ctx, args),
            Commands::Doctor(args) => doctor::run(&ctx, args),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write the config file and create the store root
    Init(init::InitArgs),
    /// List the entries and folders directly inside a folder
    Ls(list::LsArgs),
    /// Print the whole store as a tree
    Tree(list::TreeArgs),
    /// Fuzzy-search entry names
    Find(list::FindArgs),
    /// Decrypt and display an entry
    Show(entry::ShowArgs),
    /// Create a new entry
    Add(entry::AddArgs),
    /// Change or rename an existing entry
    Edit(entry::EditArgs),
    /// Delete an entry
    Rm(entry::RmArgs),
    /// Print the current one-time code of an entry
    Otp(otp::OtpArgs),
    /// Commit and push local changes, or pull remote ones
    Sync(sync::SyncArgs),
    /// Generate a random password
    Generate(generate::GenerateArgs),
    /// Browse and search the store interactively
    Browse(browse::BrowseArgs),
    /// Diagnose configuration and tooling (safe, read-only)
    Doctor(doctor::DoctorArgs),
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // A second init (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
