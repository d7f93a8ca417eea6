//! Asymmetric encryption service consumed by the store.

use crate::util::command::CommandError;
use std::path::Path;
use zeroize::Zeroizing;

#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error(transparent)]
    Tool(#[from] CommandError),
    #[error("cannot prepare key material: {0}")]
    Setup(#[source] std::io::Error),
    #[error("{0}")]
    Rejected(String),
}

/// Encrypts entry bodies for a public key and decrypts them with the matching
/// private key. Implementations must not log or persist plaintext.
pub trait CryptoProvider {
    fn encrypt(&self, public_key: &Path, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError>;

    fn decrypt(
        &self,
        ciphertext: &[u8],
        private_key: &Path,
        passphrase: &str,
        public_key: &Path,
    ) -> Result<Zeroizing<Vec<u8>>, CryptoError>;
}

impl<T: CryptoProvider + ?Sized> CryptoProvider for Box<T> {
    fn encrypt(&self, public_key: &Path, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        (**self).encrypt(public_key, plaintext)
    }

    fn decrypt(
        &self,
        ciphertext: &[u8],
        private_key: &Path,
        passphrase: &str,
        public_key: &Path,
    ) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
        (**self).decrypt(ciphertext, private_key, passphrase, public_key)
    }
}
