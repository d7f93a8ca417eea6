//! Diagnostics for configuration, keys and external tools.

use crate::cli::CliContext;
use crate::constants;
use crate::core::config;
use crate::util::{command, fs as store_fs, git::GitCli};
use anyhow::Result;
use clap::Args;
use std::path::Path;

#[derive(Args, Debug)]
pub struct DoctorArgs {
    /// Skip the git checks even when the config is online
    #[arg(long)]
    pub offline: bool,
}

#[derive(Default)]
struct Tally {
    ok: u32,
    warn: u32,
    fail: u32,
}

impl Tally {
    fn pass(&mut self, msg: impl AsRef<str>) {
        println!("  [PASS] {}", msg.as_ref());
        self.ok += 1;
    }

    fn warn(&mut self, msg: impl AsRef<str>) {
        println!("  [WARN] {}", msg.as_ref());
        self.warn += 1;
    }

    fn fail(&mut self, msg: impl AsRef<str>) {
        println!("  [FAIL] {}", msg.as_ref());
        self.fail += 1;
    }
}

pub fn run(ctx: &CliContext, args: DoctorArgs) -> Result<()> {
    let paths = &ctx.paths;
    let mut t = Tally::default();

    println!("Doctor: {}", paths);

    let file = match config::load(&paths.config_file) {
        Ok(file) => {
            t.pass(format!("config readable: {}", paths.config_file.display()));
            check_mode(&mut t, "config", &paths.config_file, constants::CONFIG_FILE_MODE);
            Some(file)
        }
        Err(e) => {
            t.fail(format!("{:#}", e));
            None
        }
    };

    if let Some(file) = &file {
        let root = &file.store.root;
        if root.is_dir() {
            t.pass(format!("store root exists: {}", root.display()));
            check_mode(&mut t, "store root", root, constants::STORE_DIR_MODE);
        } else {
            t.fail(format!("store root missing: {} (run: passbook init)", root.display()));
        }

        check_key(&mut t, "public", &file.keys.public_key);
        check_key(&mut t, "private", &file.keys.private_key);
        if file.keys.passphrase.is_some() {
            t.warn("passphrase stored in config; PASSBOOK_PASSPHRASE or the prompt keeps it off disk");
        }

        let offline = args.offline || file.sync.offline;
        if offline {
            println!("  [INFO] offline: git checks skipped");
        } else if !command::available("git") {
            t.fail("git not found on PATH");
        } else {
            t.pass("git available");
            if GitCli::new(root).is_work_tree() {
                t.pass("store root is a git work tree");
            } else {
                t.warn("store root is not a git work tree; sync will fail (use init --clone or set offline)");
            }
        }
    }

    if command::available("gpg") {
        t.pass("gpg available");
    } else {
        t.fail("gpg not found on PATH");
    }

    println!();
    println!("Doctor summary: {} pass, {} warn, {} fail", t.ok, t.warn, t.fail);
    if t.fail > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn check_key(t: &mut Tally, label: &str, path: &Path) {
    if path.as_os_str().is_empty() {
        t.fail(format!("no {} key configured ([keys] {}_key)", label, label));
    } else if path.is_file() {
        t.pass(format!("{} key exists: {}", label, path.display()));
    } else {
        t.fail(format!("{} key missing: {}", label, path.display()));
    }
}

fn check_mode(t: &mut Tally, label: &str, path: &Path, expected: u32) {
    if let Some(mode) = store_fs::mode_of(path) {
        if mode == expected {
            t.pass(format!("{} mode ok: {:04o}", label, mode));
        } else {
            t.warn(format!(
                "{} mode: {:04o} (expected {:04o})",
                label, mode, expected
            ));
        }
    }
}
