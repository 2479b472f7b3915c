//! Typed views of the three text messages exchanged over the tunnel.
//!
//! Each type renders its exact wire form through [`Display`](fmt::Display);
//! the parser in [`parse`](super::parse) is the inverse.

use std::fmt;

use super::{
    ACK_SUFFIX,
    ERROR_CODE_PREFIX,
    FragmentCount,
    FragmentIndex,
    MAGIC,
    PROTOCOL_VERSION,
    ReplyKind,
    RequestId,
};

/// Opening fragment of a request or reply.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FirstFragment {
    request_id: RequestId,
    total: FragmentCount,
    kind: ReplyKind,
    payload: String,
}

impl FirstFragment {
    /// Construct a first fragment.
    #[must_use]
    pub fn new(
        request_id: RequestId,
        total: FragmentCount,
        kind: ReplyKind,
        payload: impl Into<String>,
    ) -> Self {
        Self {
            request_id,
            total,
            kind,
            payload: payload.into(),
        }
    }

    /// Identifier shared by every fragment of the exchange.
    #[must_use]
    pub const fn request_id(&self) -> RequestId { self.request_id }

    /// Number of fragments announced for the exchange.
    #[must_use]
    pub const fn total(&self) -> FragmentCount { self.total }

    /// Request or reply marker carried by the header.
    #[must_use]
    pub const fn kind(&self) -> ReplyKind { self.kind }

    /// Payload text following the header.
    #[must_use]
    pub fn payload(&self) -> &str { &self.payload }

    /// Consume the fragment, returning its payload.
    #[must_use]
    pub fn into_payload(self) -> String { self.payload }
}

impl fmt::Display for FirstFragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{PROTOCOL_VERSION}-{MAGIC}-{}-", self.request_id)?;
        if let Some(marker) = self.kind.marker() {
            write!(f, "{marker}-")?;
        }
        write!(f, "{}-", self.total)?;
        if let Some(status) = self.kind.status() {
            write!(f, "{ERROR_CODE_PREFIX}{status:03}-")?;
        }
        f.write_str(&self.payload)
    }
}

/// Any fragment after the first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContinuationFragment {
    index: FragmentIndex,
    payload: String,
}

impl ContinuationFragment {
    /// Construct a continuation fragment.
    #[must_use]
    pub fn new(index: FragmentIndex, payload: impl Into<String>) -> Self {
        Self {
            index,
            payload: payload.into(),
        }
    }

    /// Position of the fragment within its exchange.
    #[must_use]
    pub const fn index(&self) -> FragmentIndex { self.index }

    /// Payload text following the header.
    #[must_use]
    pub fn payload(&self) -> &str { &self.payload }

    /// Consume the fragment, returning its payload.
    #[must_use]
    pub fn into_payload(self) -> String { self.payload }
}

impl fmt::Display for ContinuationFragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.index, self.payload)
    }
}

/// Receipt confirming a single fragment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Acknowledgment {
    request_id: RequestId,
    index: FragmentIndex,
}

impl Acknowledgment {
    /// Construct an acknowledgment.
    #[must_use]
    pub const fn new(request_id: RequestId, index: FragmentIndex) -> Self {
        Self { request_id, index }
    }

    /// Identifier of the acknowledged exchange.
    #[must_use]
    pub const fn request_id(&self) -> RequestId { self.request_id }

    /// Index of the acknowledged fragment.
    #[must_use]
    pub const fn index(&self) -> FragmentIndex { self.index }
}

impl fmt::Display for Acknowledgment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{PROTOCOL_VERSION}-{MAGIC}-{}-{}-{ACK_SUFFIX}",
            self.request_id, self.index
        )
    }
}

/// One transport-sized message of the tunnel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Fragment {
    /// Opening fragment carrying the request identifier and total.
    First(FirstFragment),
    /// Subsequent fragment carrying only its index.
    Continuation(ContinuationFragment),
    /// Receipt for a single fragment.
    Acknowledgment(Acknowledgment),
}

impl Fragment {
    /// Whether this is an opening fragment.
    #[must_use]
    pub const fn is_first(&self) -> bool { matches!(self, Self::First(_)) }

    /// Whether this is an acknowledgment.
    #[must_use]
    pub const fn is_ack(&self) -> bool { matches!(self, Self::Acknowledgment(_)) }

    /// Payload text carried by the fragment; empty for acknowledgments.
    #[must_use]
    pub fn payload(&self) -> &str {
        match self {
            Self::First(first) => first.payload(),
            Self::Continuation(rest) => rest.payload(),
            Self::Acknowledgment(_) => "",
        }
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::First(first) => first.fmt(f),
            Self::Continuation(rest) => rest.fmt(f),
            Self::Acknowledgment(ack) => ack.fmt(f),
        }
    }
}

impl From<FirstFragment> for Fragment {
    fn from(value: FirstFragment) -> Self { Self::First(value) }
}

impl From<ContinuationFragment> for Fragment {
    fn from(value: ContinuationFragment) -> Self { Self::Continuation(value) }
}

impl From<Acknowledgment> for Fragment {
    fn from(value: Acknowledgment) -> Self { Self::Acknowledgment(value) }
}
