//! Symmetric key material shared with the relay.

use std::{fmt, str::FromStr};

use super::CodecError;

/// Key length in bytes.
pub const KEY_LEN: usize = 32;

/// 256-bit key shared between the device and the relay.
///
/// The key never appears in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct TunnelKey([u8; KEY_LEN]);

impl TunnelKey {
    /// Parse a key from 64 hexadecimal digits.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::InvalidKey`] when the text is not exactly
    /// [`KEY_LEN`] bytes of hex.
    pub fn from_hex(text: &str) -> Result<Self, CodecError> {
        let mut bytes = [0u8; KEY_LEN];
        hex::decode_to_slice(text.trim(), &mut bytes).map_err(|err| CodecError::InvalidKey {
            reason: err.to_string(),
        })?;
        Ok(Self(bytes))
    }

    /// Borrow the raw key bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; KEY_LEN] { &self.0 }
}

impl From<[u8; KEY_LEN]> for TunnelKey {
    fn from(bytes: [u8; KEY_LEN]) -> Self { Self(bytes) }
}

impl FromStr for TunnelKey {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> { Self::from_hex(s) }
}

impl fmt::Debug for TunnelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TunnelKey").field(&"<redacted>").finish()
    }
}
