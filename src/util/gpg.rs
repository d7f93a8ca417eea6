//! `gpg` command-line adapter for [`CryptoProvider`].
//!
//! Every call runs against a throw-away home directory so the user's keyring
//! is never read or modified. Keys come from the configured key files.

use crate::core::crypto::{CryptoError, CryptoProvider};
use crate::util::command::{self, CommandError};
use crate::util::fs::set_permissions;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;
use tracing::debug;
use zeroize::Zeroizing;

#[derive(Debug, Clone)]
pub struct GpgCli {
    program: PathBuf,
}

impl Default for GpgCli {
    fn default() -> Self {
        Self::new()
    }
}

impl GpgCli {
    pub fn new() -> Self {
        Self::with_program("gpg")
    }

    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn command(&self, home: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("--homedir")
            .arg(home)
            .args(["--batch", "--yes", "--quiet", "--no-tty"]);
        cmd
    }

    fn encrypt_command(&self, home: &Path, public_key: &Path) -> Command {
        let mut cmd = self.command(home);
        cmd.args(["--trust-model", "always", "--recipient-file"])
            .arg(public_key)
            .args(["--encrypt", "--output", "-"]);
        cmd
    }

    fn loopback(&self, home: &Path, passphrase_file: &Path) -> Command {
        let mut cmd = self.command(home);
        cmd.args(["--pinentry-mode", "loopback", "--passphrase-file"])
            .arg(passphrase_file);
        cmd
    }
}

fn temp_home() -> Result<TempDir, CryptoError> {
    let home = tempfile::Builder::new()
        .prefix("passbook-gnupg-")
        .tempdir()
        .map_err(CryptoError::Setup)?;
    set_permissions(home.path(), 0o700).map_err(CryptoError::Setup)?;
    Ok(home)
}

/// Passphrase goes to gpg through a private file, never through argv.
fn write_passphrase(home: &Path, passphrase: &str) -> Result<PathBuf, CryptoError> {
    let path = home.join("passphrase");
    let mut file = fs::File::create(&path).map_err(CryptoError::Setup)?;
    set_permissions(&path, 0o600).map_err(CryptoError::Setup)?;
    file.write_all(passphrase.as_bytes())
        .map_err(CryptoError::Setup)?;
    Ok(path)
}

fn require_key(path: &Path) -> Result<(), CryptoError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(CryptoError::Rejected(format!(
            "key file {} not found",
            path.display()
        )))
    }
}

impl CryptoProvider for GpgCli {
    fn encrypt(&self, public_key: &Path, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        require_key(public_key)?;
        let home = temp_home()?;
        debug!(key = %public_key.display(), "gpg encrypt");
        let ciphertext =
            command::run_with_input(self.encrypt_command(home.path(), public_key), plaintext)?;
        Ok(ciphertext)
    }

    fn decrypt(
        &self,
        ciphertext: &[u8],
        private_key: &Path,
        passphrase: &str,
        public_key: &Path,
    ) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
        require_key(private_key)?;
        let home = temp_home()?;
        let pass_file = write_passphrase(home.path(), passphrase)?;

        for key in [public_key, private_key] {
            if key.as_os_str().is_empty() || !key.is_file() {
                continue;
            }
            let mut import = self.loopback(home.path(), &pass_file);
            import.arg("--import").arg(key);
            command::run(import)?;
        }

        debug!(key = %private_key.display(), "gpg decrypt");
        let mut decrypt = self.loopback(home.path(), &pass_file);
        decrypt.args(["--decrypt", "--output", "-"]);
        let plaintext = command::run_with_input(decrypt, ciphertext).map_err(|e| match e {
            CommandError::Failed { stderr, .. } => {
                CryptoError::Rejected(format!("gpg could not decrypt: {}", stderr))
            }
            other => CryptoError::Tool(other),
        })?;
        Ok(Zeroizing::new(plaintext))
    }
}
