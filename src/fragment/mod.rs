//! Frame codec for the text tunnel.
//!
//! This module collects the wire vocabulary of the tunnel: identifiers and
//! three-digit fields, the typed fragment views, the outbound
//! [`Fragmenter`], the inbound [`classify`] parser and the single-slot
//! [`Reassembler`]. Each sub-module focuses on a single concept while the
//! public API is re-exported here.
//!
//! ```text
//! first:         01-CRADLE-RRRRRR-FFF-<payload>
//! continuation:  III-<payload>
//! ack:           01-CRADLE-RRRRRR-III-ACK
//! ```

pub mod error;
pub mod fragmenter;
pub mod frame;
pub mod header;
pub mod id;
pub mod index;
pub mod parse;
pub mod reassembler;

pub use error::{FragmentationError, FramingError, ReassemblyError, ReassemblyStatus};
pub use fragmenter::{DEFAULT_PACKET_SIZE, FragmentBatch, Fragmenter};
pub use frame::{Acknowledgment, ContinuationFragment, FirstFragment, Fragment};
pub use header::{
    ACK_LEN,
    ACK_SUFFIX,
    CONTINUATION_HEADER_LEN,
    ERROR_CODE_PREFIX,
    FIELD_WIDTH,
    MAGIC,
    PREFIX_LEN,
    PROTOCOL_VERSION,
    REPLY_ERROR,
    REPLY_ERROR_ENCRYPTED,
    REPLY_SUCCESS,
    REQUEST_ID_WIDTH,
    ReplyKind,
    SEPARATOR,
};
pub use id::RequestId;
pub use index::{FragmentCount, FragmentIndex};
pub use parse::{Classified, classify, parse_ack, parse_continuation, parse_first};
pub use reassembler::{ReassembledMessage, Reassembler};

#[cfg(test)]
mod tests;
