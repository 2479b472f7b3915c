//! Error and status types emitted by the framing layer.
//!
//! Parsing problems are reported precisely so callers can log them, even
//! though the inbound path deliberately drops unrecognized text.

use thiserror::Error;

use super::{FragmentCount, FragmentIndex, RequestId};

/// Errors raised while building or parsing individual header fields.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FramingError {
    /// A request identifier does not fit the six-digit field.
    #[error("request id {value} exceeds 999999")]
    RequestIdOutOfRange { value: u32 },
    /// A fragment index, total or status code does not fit its three-digit
    /// field.
    #[error("value {value} does not fit a three-digit header field")]
    FieldOutOfRange { value: usize },
    /// The text is not a first fragment.
    #[error("not a first fragment: {text:?}")]
    NotFirstFragment { text: String },
    /// The text is not a continuation fragment.
    #[error("not a continuation fragment: {text:?}")]
    NotContinuation { text: String },
    /// The text is not an acknowledgment.
    #[error("not an acknowledgment: {text:?}")]
    NotAcknowledgment { text: String },
}

/// Errors produced while splitting an outbound payload into fragments.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FragmentationError {
    /// The payload would need more fragments than the three-digit total can
    /// announce.
    #[error("message needs {required} fragments but at most {limit} are addressable")]
    OversizeMessage { required: usize, limit: usize },
    /// The packet size leaves no room for payload after a header.
    #[error("packet size {packet_size} cannot carry a {header_len}-character header and payload")]
    PacketTooSmall {
        packet_size: usize,
        header_len: usize,
    },
    /// Nothing to send; the wire format requires a non-empty payload.
    #[error("cannot fragment an empty payload")]
    EmptyPayload,
    /// A header field could not be encoded.
    #[error(transparent)]
    Framing(#[from] FramingError),
}

/// Progress reported when a fragment is fed into a
/// [`Reassembler`](super::Reassembler).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReassemblyStatus {
    /// The fragment was appended and more are expected.
    Incomplete {
        /// Index to acknowledge.
        ack: FragmentIndex,
        /// Fragments received so far.
        received: u16,
        /// Fragments announced by the first fragment.
        total: FragmentCount,
    },
    /// The fragment repeats one already accepted; it is acknowledged again
    /// but not appended.
    Duplicate {
        /// Index to acknowledge.
        ack: FragmentIndex,
    },
    /// The fragment completed the exchange.
    Complete {
        /// Index to acknowledge.
        ack: FragmentIndex,
        /// The reassembled payload.
        message: super::ReassembledMessage,
    },
}

/// Reasons a continuation fragment is refused by the
/// [`Reassembler`](super::Reassembler).
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum ReassemblyError {
    /// No first fragment has opened an assembly.
    #[error("continuation fragment {found} received without an active assembly")]
    NoActiveAssembly { found: FragmentIndex },
    /// The fragment is ahead of the next expected index.
    #[error("request {request_id}: expected fragment {expected}, found {found}")]
    IndexMismatch {
        request_id: RequestId,
        expected: u16,
        found: FragmentIndex,
    },
}
