//! Classification of relay errors.
//!
//! The relay reports failures at two levels:
//!
//! - **Outer** errors travel in the reply header as a status code. Most carry
//!   a plaintext body; some, such as a request number mismatch, carry an
//!   encrypted body because it reveals the expected counter.
//! - **Inner** errors come back inside a successfully decrypted response whose
//!   `code` is an error status.
//!
//! [`ErrorClassifier`] extracts a user-facing message from either and, for a
//! mismatch, resynchronizes the [`RequestSequencer`] so a retransmission can
//! use the identifier the relay expects.

use log::{debug, warn};

use crate::{
    codec::{AesGcmCipher, Cipher, Compressor, GzipCompressor, PayloadCodec, TunnelKey},
    fragment::{ReplyKind, RequestId},
    sequencer::{CounterStore, RequestSequencer},
};

pub mod error;
pub mod record;

pub use error::ClassifyError;
pub use record::{DecryptedResponse, ErrorDescription, InnerErrorRecord};

/// Status code the relay uses when the request number is not the one it
/// expected.
pub const REQUEST_NUMBER_MISMATCH: u16 = 425;

/// Outer status codes whose body is always encrypted.
pub const ENCRYPTED_ERROR_CODES: &[u16] = &[REQUEST_NUMBER_MISMATCH];

/// Message used when an inner error carries no description.
pub const UNKNOWN_ERROR: &str = "Unknown Error";

/// Whether `code` denotes a failure.
#[must_use]
pub const fn is_error_code(code: u16) -> bool { code >= 400 }

/// Status code of an outer error and whether its body is encrypted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct OuterStatus {
    code: u16,
    encrypted: bool,
}

impl OuterStatus {
    /// Status for `code`, encrypted when the code is in
    /// [`ENCRYPTED_ERROR_CODES`].
    #[must_use]
    pub fn new(code: u16) -> Self {
        Self {
            code,
            encrypted: ENCRYPTED_ERROR_CODES.contains(&code),
        }
    }

    /// Status taken from a reply header, if the reply is an error.
    ///
    /// The body counts as encrypted when the header says so or when the code
    /// is always encrypted.
    #[must_use]
    pub fn from_reply(kind: ReplyKind) -> Option<Self> {
        match kind {
            ReplyKind::Error { status, encrypted } => {
                let mut outer = Self::new(status);
                outer.encrypted |= encrypted;
                Some(outer)
            }
            ReplyKind::Request | ReplyKind::Success => None,
        }
    }

    /// Numeric status code.
    #[must_use]
    pub const fn code(self) -> u16 { self.code }

    /// Whether the body must be decrypted before use.
    #[must_use]
    pub const fn is_encrypted(self) -> bool { self.encrypted }
}

/// Result of classifying an outer error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OuterError {
    /// Status code reported by the relay.
    pub code: u16,
    /// User-facing message.
    pub message: String,
    /// Identifier the sequencer was resynchronized to, if any.
    pub resync: Option<RequestId>,
    /// Whether the request should be transmitted again.
    pub retransmit: bool,
}

/// Extracts messages and resynchronization data from relay errors.
#[derive(Clone, Debug, Default)]
pub struct ErrorClassifier<C = AesGcmCipher, Z = GzipCompressor> {
    codec: PayloadCodec<C, Z>,
}

impl<C, Z> ErrorClassifier<C, Z>
where
    C: Cipher,
    Z: Compressor,
{
    /// Create a classifier decrypting bodies with `codec`.
    #[must_use]
    pub fn new(codec: PayloadCodec<C, Z>) -> Self { Self { codec } }

    /// Classify an outer error carried by a reply header.
    ///
    /// Plaintext bodies are returned unchanged. Encrypted bodies are decoded
    /// into a [`DecryptedResponse`] whose body holds an
    /// [`InnerErrorRecord`]; the expected request number, when present,
    /// resynchronizes `sequencer`. Only a request number mismatch that
    /// resynchronized the sequencer asks for retransmission.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifyError`] when an encrypted body cannot be decoded or
    /// parsed, or the sequencer cannot persist the new value.
    pub fn handle_outer<S: CounterStore>(
        &self,
        status: OuterStatus,
        body: &str,
        key: &TunnelKey,
        sequencer: &mut RequestSequencer<S>,
    ) -> Result<OuterError, ClassifyError> {
        let code = status.code();
        if !status.is_encrypted() {
            debug!("plaintext outer error: code={code}");
            return Ok(OuterError {
                code,
                message: body.to_owned(),
                resync: None,
                retransmit: false,
            });
        }

        let response = self.decode_response(body, key)?;
        let record: InnerErrorRecord = serde_json::from_str(&response.body_text())?;
        let resync = match record.expected_request_number {
            Some(expected) => {
                sequencer.resync(expected)?;
                Some(sequencer.peek())
            }
            None => {
                warn!("encrypted outer error without expected request number: code={code}");
                None
            }
        };

        Ok(OuterError {
            code,
            message: record.message,
            resync,
            retransmit: code == REQUEST_NUMBER_MISMATCH && resync.is_some(),
        })
    }

    /// Message for an inner error: the `description` of its body, or
    /// [`UNKNOWN_ERROR`].
    #[must_use]
    #[expect(
        clippy::unused_self,
        reason = "kept as a method so callers classify both levels through one value"
    )]
    pub fn handle_inner(&self, response: &DecryptedResponse) -> String {
        serde_json::from_str::<ErrorDescription>(&response.body_text())
            .ok()
            .and_then(|described| described.description)
            .unwrap_or_else(|| UNKNOWN_ERROR.to_owned())
    }

    /// Decode reply text into its plaintext JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifyError::Codec`] if the text cannot be decoded.
    pub fn decode_text(&self, text: &str, key: &TunnelKey) -> Result<String, ClassifyError> {
        Ok(self.codec.decode_to_string(text, key)?)
    }

    /// Decode reply text into a [`DecryptedResponse`].
    ///
    /// # Errors
    ///
    /// Returns [`ClassifyError`] if the text cannot be decoded or is not a
    /// response record.
    pub fn decode_response(
        &self,
        text: &str,
        key: &TunnelKey,
    ) -> Result<DecryptedResponse, ClassifyError> {
        DecryptedResponse::parse(&self.decode_text(text, key)?)
    }
}

#[cfg(test)]
mod tests;
