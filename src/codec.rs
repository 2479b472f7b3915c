//! Payload codec for the text tunnel.
//!
//! Requests travel as text, so a payload is compressed, encrypted and then
//! armoured with standard base64 before it reaches the
//! [`Fragmenter`](crate::fragment::Fragmenter). Decoding reverses the three
//! steps. The base64 alphabet never contains `-`, which keeps armoured text
//! clear of the header separator.
//!
//! Both primitives sit behind traits so platform implementations can be
//! substituted:
//!
//! - [`Cipher`]: symmetric authenticated encryption keyed by a [`TunnelKey`].
//!   [`AesGcmCipher`] is the default.
//! - [`Compressor`]: lossless compression. [`GzipCompressor`] is the default.
//!
//! The request identifier is not mixed into the ciphertext; the relay decodes
//! replies without it and it is carried by the fragment header only.

use base64::{Engine as _, engine::general_purpose::STANDARD};

pub mod cipher;
pub mod compress;
pub mod error;
pub mod key;

pub use cipher::{AesGcmCipher, Cipher, NONCE_LEN};
pub use compress::{Compressor, GzipCompressor};
pub use error::CodecError;
pub use key::{KEY_LEN, TunnelKey};

/// Compress, encrypt and armour payloads for the tunnel.
///
/// # Examples
///
/// ```
/// use textframe::codec::{PayloadCodec, TunnelKey};
///
/// let codec = PayloadCodec::new();
/// let key = TunnelKey::from([7u8; 32]);
/// let text = codec.encode(b"{\"hello\":1}", &key).expect("encode");
/// assert!(!text.contains('-'));
/// assert_eq!(
///     codec.decode(&text, &key).expect("decode"),
///     b"{\"hello\":1}".to_vec()
/// );
/// ```
#[derive(Clone, Debug, Default)]
pub struct PayloadCodec<C = AesGcmCipher, Z = GzipCompressor> {
    cipher: C,
    compressor: Z,
}

impl PayloadCodec {
    /// Codec using AES-256-GCM and gzip.
    #[must_use]
    pub fn new() -> Self { Self::default() }
}

impl<C, Z> PayloadCodec<C, Z>
where
    C: Cipher,
    Z: Compressor,
{
    /// Build a codec from explicit primitives.
    #[must_use]
    pub fn with_primitives(cipher: C, compressor: Z) -> Self { Self { cipher, compressor } }

    /// Borrow the configured cipher.
    #[must_use]
    pub fn cipher(&self) -> &C { &self.cipher }

    /// Borrow the configured compressor.
    #[must_use]
    pub fn compressor(&self) -> &Z { &self.compressor }

    /// Encode `payload` into armoured text.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError`] if compression or encryption fails.
    pub fn encode(&self, payload: &[u8], key: &TunnelKey) -> Result<String, CodecError> {
        let compressed = self.compressor.compress(payload)?;
        let sealed = self.cipher.encrypt(key, &compressed)?;
        Ok(STANDARD.encode(sealed))
    }

    /// Decode armoured text back into payload bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Armour`] for text that is not base64,
    /// [`CodecError::Decrypt`] when authentication fails and
    /// [`CodecError::Compression`] when the plaintext is not a valid stream.
    pub fn decode(&self, text: &str, key: &TunnelKey) -> Result<Vec<u8>, CodecError> {
        let sealed = STANDARD.decode(text.trim())?;
        let compressed = self.cipher.decrypt(key, &sealed)?;
        self.compressor.decompress(&compressed)
    }

    /// Decode armoured text into a UTF-8 string.
    ///
    /// # Errors
    ///
    /// As [`decode`](Self::decode); additionally returns
    /// [`CodecError::Utf8`] when the payload is not valid UTF-8.
    pub fn decode_to_string(&self, text: &str, key: &TunnelKey) -> Result<String, CodecError> {
        Ok(String::from_utf8(self.decode(text, key)?)?)
    }
}
