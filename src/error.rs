//! Canonical error type for the crate.
//!
//! Each module reports failures through its own enum; [`TunnelError`]
//! aggregates them for callers of the session API.

use thiserror::Error;

use crate::{
    classifier::ClassifyError,
    codec::CodecError,
    fragment::{FragmentationError, FramingError},
    sequencer::SequencerError,
    transmitter::TransmitError,
    transport::TransportError,
};

/// Top-level error type exposed by `textframe`.
#[derive(Debug, Error)]
pub enum TunnelError {
    /// A transmission is already in progress.
    #[error("a transmission is already in progress")]
    TransmissionActive,
    /// The session actor has stopped.
    #[error("tunnel session has shut down")]
    SessionClosed,
    /// A header field could not be built or parsed.
    #[error(transparent)]
    Framing(#[from] FramingError),
    /// A payload could not be fragmented.
    #[error(transparent)]
    Fragmentation(#[from] FragmentationError),
    /// A payload could not be encoded or decoded.
    #[error(transparent)]
    Codec(#[from] CodecError),
    /// The request counter failed.
    #[error(transparent)]
    Sequencer(#[from] SequencerError),
    /// A transmission could not proceed.
    #[error(transparent)]
    Transmit(#[from] TransmitError),
    /// A relay reply could not be interpreted.
    #[error(transparent)]
    Classify(#[from] ClassifyError),
    /// The transport refused a message.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Result type used by the session API.
pub type Result<T, E = TunnelError> = std::result::Result<T, E>;
