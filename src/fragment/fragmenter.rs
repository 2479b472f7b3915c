//! Outbound helper that splits armoured payload text into wire fragments.
//!
//! [`Fragmenter`] chunks text so every encoded fragment, header included,
//! fits the transport's packet size. The first fragment spends more of its
//! budget on the header than continuations do, which the fragment count
//! accounts for explicitly.

use std::num::NonZeroUsize;

use super::{
    CONTINUATION_HEADER_LEN,
    ContinuationFragment,
    FirstFragment,
    Fragment,
    FragmentCount,
    FragmentIndex,
    FragmentationError,
    ReplyKind,
    RequestId,
    index::MAX_FIELD_VALUE,
};

/// Default packet size: two concatenated 153-character text segments.
pub const DEFAULT_PACKET_SIZE: usize = 306;

/// Splits payload text into fragments no longer than the packet size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Fragmenter {
    packet_size: NonZeroUsize,
}

impl Default for Fragmenter {
    fn default() -> Self {
        Self {
            packet_size: NonZeroUsize::new(DEFAULT_PACKET_SIZE).unwrap_or(NonZeroUsize::MIN),
        }
    }
}

impl Fragmenter {
    /// Create a fragmenter emitting fragments of at most `packet_size`
    /// characters.
    ///
    /// # Errors
    ///
    /// Returns [`FragmentationError::PacketTooSmall`] when even the longest
    /// header kind would leave no room for payload.
    pub fn new(packet_size: NonZeroUsize) -> Result<Self, FragmentationError> {
        let widest = ReplyKind::Error {
            status: 0,
            encrypted: true,
        }
        .first_header_len();
        if packet_size.get() <= widest {
            return Err(FragmentationError::PacketTooSmall {
                packet_size: packet_size.get(),
                header_len: widest,
            });
        }
        Ok(Self { packet_size })
    }

    /// Return the maximum encoded fragment length in characters.
    #[must_use]
    pub const fn packet_size(&self) -> NonZeroUsize { self.packet_size }

    /// Number of fragments needed for `payload_len` characters of payload
    /// behind a first header of `kind`.
    ///
    /// One fragment suffices when the payload fits behind the first header;
    /// the overflow is then spread over continuations whose header is
    /// [`CONTINUATION_HEADER_LEN`] characters long.
    ///
    /// # Examples
    ///
    /// ```
    /// use textframe::fragment::{Fragmenter, ReplyKind};
    /// let fragmenter = Fragmenter::default();
    /// assert_eq!(fragmenter.fragment_count(11, ReplyKind::Request), 1);
    /// assert_eq!(fragmenter.fragment_count(1000, ReplyKind::Request), 4);
    /// ```
    #[must_use]
    pub fn fragment_count(&self, payload_len: usize, kind: ReplyKind) -> usize {
        let packet = self.packet_size.get();
        let framed = payload_len + kind.first_header_len();
        if framed <= packet {
            return 1;
        }
        1 + (framed - packet).div_ceil(packet - CONTINUATION_HEADER_LEN)
    }

    /// Split outbound request text into fragments tagged with `request_id`.
    ///
    /// # Errors
    ///
    /// Returns [`FragmentationError::EmptyPayload`] for empty text and
    /// [`FragmentationError::OversizeMessage`] when more than 999 fragments
    /// would be required.
    pub fn fragment(
        &self,
        payload: &str,
        request_id: RequestId,
    ) -> Result<FragmentBatch, FragmentationError> {
        self.fragment_as(payload, request_id, ReplyKind::Request)
    }

    /// Split text into fragments whose first header is of `kind`.
    ///
    /// Relay replies use this with [`ReplyKind::Success`] or
    /// [`ReplyKind::Error`].
    ///
    /// # Errors
    ///
    /// As [`fragment`](Self::fragment); additionally returns
    /// [`FragmentationError::Framing`] when an error status does not fit its
    /// three-digit field.
    pub fn fragment_as(
        &self,
        payload: &str,
        request_id: RequestId,
        kind: ReplyKind,
    ) -> Result<FragmentBatch, FragmentationError> {
        if payload.is_empty() {
            return Err(FragmentationError::EmptyPayload);
        }
        if let Some(status) = kind.status() {
            FragmentIndex::new(status)?;
        }

        let chars: Vec<char> = payload.chars().collect();
        let required = self.fragment_count(chars.len(), kind);
        let total = FragmentCount::try_from(required).map_err(|_| {
            FragmentationError::OversizeMessage {
                required,
                limit: usize::from(MAX_FIELD_VALUE),
            }
        })?;

        let packet = self.packet_size.get();
        let mut fragments = Vec::with_capacity(required);
        let first_room = packet - kind.first_header_len();
        let (head, mut rest) = chars.split_at(first_room.min(chars.len()));
        fragments.push(Fragment::First(FirstFragment::new(
            request_id,
            total,
            kind,
            head.iter().collect::<String>(),
        )));

        let mut index = FragmentIndex::zero();
        let room = packet - CONTINUATION_HEADER_LEN;
        while !rest.is_empty() {
            index = index
                .checked_increment()
                .ok_or(FragmentationError::OversizeMessage {
                    required,
                    limit: usize::from(MAX_FIELD_VALUE),
                })?;
            let (chunk, tail) = rest.split_at(room.min(rest.len()));
            fragments.push(Fragment::Continuation(ContinuationFragment::new(
                index,
                chunk.iter().collect::<String>(),
            )));
            rest = tail;
        }

        debug_assert_eq!(fragments.len(), required, "fragment count drifted");
        Ok(FragmentBatch::new(request_id, fragments))
    }
}

/// Collection of fragments produced for a single exchange.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FragmentBatch {
    request_id: RequestId,
    fragments: Vec<Fragment>,
}

impl FragmentBatch {
    fn new(request_id: RequestId, fragments: Vec<Fragment>) -> Self {
        debug_assert!(!fragments.is_empty(), "fragment batches must not be empty");
        Self {
            request_id,
            fragments,
        }
    }

    /// Return the [`RequestId`] shared by all fragments.
    #[must_use]
    pub const fn request_id(&self) -> RequestId { self.request_id }

    /// Return the fragments as a slice.
    #[must_use]
    pub fn fragments(&self) -> &[Fragment] { self.fragments.as_slice() }

    /// Number of fragments in the batch.
    #[expect(
        clippy::len_without_is_empty,
        reason = "batches are guaranteed non-empty"
    )]
    #[must_use]
    pub fn len(&self) -> usize { self.fragments.len() }

    /// Whether the exchange required more than one fragment.
    #[must_use]
    pub fn is_fragmented(&self) -> bool { self.len() > 1 }

    /// Render every fragment to its wire text, in sending order.
    #[must_use]
    pub fn to_wire(&self) -> Vec<String> {
        self.fragments.iter().map(ToString::to_string).collect()
    }

    /// Consume the batch, returning all fragments.
    #[must_use]
    pub fn into_fragments(self) -> Vec<Fragment> { self.fragments }
}

impl IntoIterator for FragmentBatch {
    type Item = Fragment;
    type IntoIter = std::vec::IntoIter<Fragment>;

    fn into_iter(self) -> Self::IntoIter { self.fragments.into_iter() }
}
