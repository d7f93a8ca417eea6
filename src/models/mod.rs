//! Plain data carried between the store, the index and the CLI.

pub mod config;
pub mod entry;
pub mod node;
