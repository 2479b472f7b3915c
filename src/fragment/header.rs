//! Fixed header vocabulary of the text tunnel.
//!
//! Every first fragment and acknowledgment opens with
//! `VV-MMMMMM-RRRRRR-`, the protocol version, the magic tag and the six-digit
//! request identifier. Continuations only carry a three-digit index.

/// Protocol version tag opening first fragments and acknowledgments.
pub const PROTOCOL_VERSION: &str = "01";
/// Magic tag following the protocol version.
pub const MAGIC: &str = "CRADLE";
/// Suffix closing an acknowledgment.
pub const ACK_SUFFIX: &str = "ACK";
/// Marker of a successful reply's first fragment.
pub const REPLY_SUCCESS: &str = "REPLY";
/// Marker of a reply carrying a plaintext outer error.
pub const REPLY_ERROR: &str = "REPLY_ERROR";
/// Marker of a reply carrying an encrypted outer error.
pub const REPLY_ERROR_ENCRYPTED: &str = "REPLY_ERROR_ENC";
/// Prefix of the three-digit status code inside error replies.
pub const ERROR_CODE_PREFIX: &str = "ERR";
/// Separator between header fields.
pub const SEPARATOR: char = '-';

/// Width of the request identifier field.
pub const REQUEST_ID_WIDTH: usize = 6;
/// Width of the fragment index, fragment total and status code fields.
pub const FIELD_WIDTH: usize = 3;

/// Length of `VV-MMMMMM-RRRRRR-`, shared by first fragments and
/// acknowledgments.
pub const PREFIX_LEN: usize =
    PROTOCOL_VERSION.len() + 1 + MAGIC.len() + 1 + REQUEST_ID_WIDTH + 1;

/// Length of a continuation header, `III-`.
pub const CONTINUATION_HEADER_LEN: usize = FIELD_WIDTH + 1;

/// Length of an encoded acknowledgment, `VV-MMMMMM-RRRRRR-III-ACK`.
pub const ACK_LEN: usize = PREFIX_LEN + FIELD_WIDTH + 1 + ACK_SUFFIX.len();

/// Role of a first fragment within the exchange.
///
/// Requests sent by the device announce only the fragment total. Replies
/// produced by the relay insert a marker after the request identifier and,
/// for errors, a three-digit status code after the total.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ReplyKind {
    /// `VV-MMMMMM-RRRRRR-FFF-`
    #[default]
    Request,
    /// `VV-MMMMMM-RRRRRR-REPLY-FFF-`
    Success,
    /// `VV-MMMMMM-RRRRRR-REPLY_ERROR[_ENC]-FFF-ERRccc-`
    Error {
        /// Status code reported by the relay.
        status: u16,
        /// Whether the error body is itself encrypted.
        encrypted: bool,
    },
}

impl ReplyKind {
    /// Marker inserted after the request identifier, if any.
    #[must_use]
    pub const fn marker(self) -> Option<&'static str> {
        match self {
            Self::Request => None,
            Self::Success => Some(REPLY_SUCCESS),
            Self::Error {
                encrypted: false, ..
            } => Some(REPLY_ERROR),
            Self::Error {
                encrypted: true, ..
            } => Some(REPLY_ERROR_ENCRYPTED),
        }
    }

    /// Status code carried in the header, if any.
    #[must_use]
    pub const fn status(self) -> Option<u16> {
        match self {
            Self::Error { status, .. } => Some(status),
            Self::Request | Self::Success => None,
        }
    }

    /// Length of the first-fragment header for this kind, including the
    /// trailing separator.
    ///
    /// # Examples
    ///
    /// ```
    /// use textframe::fragment::ReplyKind;
    /// assert_eq!(ReplyKind::Request.first_header_len(), "01-CRADLE-000123-001-".len());
    /// ```
    #[must_use]
    pub const fn first_header_len(self) -> usize {
        let marker = match self.marker() {
            Some(marker) => marker.len() + 1,
            None => 0,
        };
        let status = match self {
            Self::Error { .. } => ERROR_CODE_PREFIX.len() + FIELD_WIDTH + 1,
            Self::Request | Self::Success => 0,
        };
        PREFIX_LEN + marker + FIELD_WIDTH + 1 + status
    }
}
