//! Errors raised while starting or advancing a transmission.

use thiserror::Error;

use crate::{
    codec::CodecError,
    fragment::FragmentationError,
    sequencer::SequencerError,
    transport::TransportError,
};

/// Reasons a transmission could not proceed.
#[derive(Debug, Error)]
pub enum TransmitError {
    /// No request identifier could be allocated.
    #[error(transparent)]
    Sequencer(#[from] SequencerError),
    /// The payload could not be encoded.
    #[error(transparent)]
    Codec(#[from] CodecError),
    /// The encoded payload could not be fragmented.
    #[error(transparent)]
    Fragmentation(#[from] FragmentationError),
    /// The transport refused a fragment.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// A retransmission was requested but no payload is retained.
    #[error("no request to retransmit")]
    NothingToRetransmit,
}
