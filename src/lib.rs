//! Encrypted password store: one gpg-encrypted file per entry in a directory
//! tree, synchronized through git.
//!
//! ## Modules
//! - `cli`: Command-line handlers
//! - `core`: Entry codec, OTP engine, secret store, directory index, sync
//! - `models`: Data structures
//! - `util`: Filesystem helpers and the gpg/git adapters

pub mod cli;
pub mod constants;
pub mod core;
pub mod models;
pub mod util;
