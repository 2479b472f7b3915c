//! Errors raised while classifying relay replies.

use thiserror::Error;

use crate::{codec::CodecError, sequencer::SequencerError};

/// A reply could not be interpreted.
#[derive(Debug, Error)]
pub enum ClassifyError {
    /// The reply body could not be decoded.
    #[error("cannot decode reply: {0}")]
    Codec(#[from] CodecError),
    /// The decoded reply is not the expected JSON record.
    #[error("malformed reply record: {0}")]
    Json(#[from] serde_json::Error),
    /// The sequencer could not be resynchronized.
    #[error("cannot resynchronize request number: {0}")]
    Sequencer(#[from] SequencerError),
}
