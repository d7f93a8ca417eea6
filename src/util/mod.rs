//! Filesystem helpers and the command-line adapters for gpg and git.

pub mod command;
pub mod fs;
pub mod git;
pub mod gpg;
pub mod path;
