//! Centralized constants for permissions, paths, and limits.

/// Name of the per-user configuration directory under `$HOME`.
pub const CONFIG_DIR_NAME: &str = ".passbook";

/// Configuration file name inside the configuration directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Lock file serializing mutating commands across processes.
pub const LOCK_FILE_NAME: &str = "store.lock";

/// Default store root, relative to `$HOME`.
pub const DEFAULT_STORE_DIR: &str = ".password-store";

/// File suffix marking an encrypted entry.
pub const ENTRY_SUFFIX: &str = ".gpg";

/// Permission mode for the store root and the directories created inside it.
pub const STORE_DIR_MODE: u32 = 0o700;

/// Permission mode for individual entry files.
pub const ENTRY_FILE_MODE: u32 = 0o600;

/// Permission mode for config.toml (it may carry the key passphrase).
pub const CONFIG_FILE_MODE: u32 = 0o600;

/// Permission mode for the configuration directory.
pub const CONFIG_DIR_MODE: u32 = 0o700;

/// Maximum decrypted entry size in bytes (1 MiB).
pub const MAX_ENTRY_SIZE: usize = 1_048_576;

/// OTP time step in seconds.
pub const OTP_STEP_SECS: u64 = 30;

/// Search terms shorter than this leave the current view untouched.
pub const MIN_SEARCH_LEN: usize = 3;

/// Placeholder shown instead of a hidden password.
pub const PASSWORD_MASK: &str = "********";

/// Default length for generated passwords.
pub const DEFAULT_PASSWORD_LENGTH: usize = 8;

/// Symbols drawn on by the password generator.
pub const PASSWORD_SYMBOLS: &str = "!@#$%^&*()-_=+[]{}<>?/|:;.,~";

/// Issuer/label used in the canonical otpauth line written for an entry.
pub const OTP_LABEL: &str = "totp-secret";
