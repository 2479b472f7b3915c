//! Symmetric encryption seam.

use aes_gcm::{
    Aes256Gcm,
    Key,
    Nonce,
    aead::{Aead, AeadCore, KeyInit, OsRng},
};

use super::{CodecError, TunnelKey};

/// Length of the AES-GCM nonce prefixed to each ciphertext.
pub const NONCE_LEN: usize = 12;

/// Authenticated symmetric encryption used by the
/// [`PayloadCodec`](super::PayloadCodec).
pub trait Cipher: Send + Sync + 'static {
    /// Encrypt `plaintext` under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Encrypt`] if the primitive fails.
    fn encrypt(&self, key: &TunnelKey, plaintext: &[u8]) -> Result<Vec<u8>, CodecError>;

    /// Decrypt and authenticate `ciphertext` under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Decrypt`] if authentication fails or
    /// [`CodecError::TruncatedCiphertext`] if the input is too short.
    fn decrypt(&self, key: &TunnelKey, ciphertext: &[u8]) -> Result<Vec<u8>, CodecError>;
}

/// AES-256-GCM with a random 96-bit nonce prefixed to the ciphertext.
#[derive(Clone, Copy, Debug, Default)]
pub struct AesGcmCipher;

impl AesGcmCipher {
    fn engine(key: &TunnelKey) -> Aes256Gcm {
        Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()))
    }
}

impl Cipher for AesGcmCipher {
    fn encrypt(&self, key: &TunnelKey, plaintext: &[u8]) -> Result<Vec<u8>, CodecError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let sealed = Self::engine(key)
            .encrypt(&nonce, plaintext)
            .map_err(|_| CodecError::Encrypt)?;
        let mut out = Vec::with_capacity(NONCE_LEN + sealed.len());
        out.extend_from_slice(nonce.as_slice());
        out.extend_from_slice(&sealed);
        Ok(out)
    }

    fn decrypt(&self, key: &TunnelKey, ciphertext: &[u8]) -> Result<Vec<u8>, CodecError> {
        if ciphertext.len() <= NONCE_LEN {
            return Err(CodecError::TruncatedCiphertext {
                len: ciphertext.len(),
            });
        }
        let (nonce, sealed) = ciphertext.split_at(NONCE_LEN);
        Self::engine(key)
            .decrypt(Nonce::from_slice(nonce), sealed)
            .map_err(|_| CodecError::Decrypt)
    }
}
