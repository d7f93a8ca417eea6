//! Store, index, sync and the services they depend on.

pub mod codec;
pub mod config;
pub mod crypto;
pub mod error;
pub mod fakes;
pub mod file_lock;
pub mod index;
pub mod otp;
pub mod passgen;
pub mod paths;
pub mod store;
pub mod sync;
pub mod vcs;
pub mod worker;
