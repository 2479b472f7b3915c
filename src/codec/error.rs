//! Error types for the payload codec.

use std::{io, string::FromUtf8Error};

use thiserror::Error;

/// Errors raised while encoding or decoding tunnel payloads.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Key text is not 64 hexadecimal digits.
    #[error("invalid tunnel key: {reason}")]
    InvalidKey {
        /// Parser diagnostic.
        reason: String,
    },

    /// Armoured text is not valid base64.
    #[error("invalid armour: {0}")]
    Armour(#[from] base64::DecodeError),

    /// The cipher refused to encrypt.
    #[error("encryption failed")]
    Encrypt,

    /// Authentication failed; wrong key or tampered text.
    #[error("decryption failed")]
    Decrypt,

    /// Ciphertext is too short to hold a nonce and tag.
    #[error("ciphertext of {len} bytes is truncated")]
    TruncatedCiphertext {
        /// Length of the rejected input.
        len: usize,
    },

    /// The compression stream is corrupt.
    #[error("compression stream error: {0}")]
    Compression(#[source] io::Error),

    /// The decoded payload is not UTF-8 text.
    #[error("payload is not valid UTF-8: {0}")]
    Utf8(#[from] FromUtf8Error),
}
