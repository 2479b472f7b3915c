//! Errors raised by the request sequencer and its stores.

use std::{io, path::PathBuf};

use thiserror::Error;

use crate::fragment::FramingError;

/// Failures while reading, advancing or persisting the request counter.
#[derive(Debug, Error)]
pub enum SequencerError {
    /// The counter file could not be read or written.
    #[error("counter file {path:?}: {source}")]
    Io {
        /// Counter file location.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// The counter file does not hold a decimal integer.
    #[error("counter file {path:?} holds {contents:?}, not a counter")]
    Corrupt {
        /// Counter file location.
        path: PathBuf,
        /// Text found in the file.
        contents: String,
    },

    /// A stored or requested value does not fit a request identifier.
    #[error(transparent)]
    Framing(#[from] FramingError),

    /// A custom store rejected the write.
    #[error("counter store unavailable: {0}")]
    Unavailable(String),
}
