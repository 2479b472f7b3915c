//! Classification and field extraction for inbound text.
//!
//! The tunnel shares its channel with unrelated traffic, so anything that
//! does not match a header exactly is reported as
//! [`Classified::Unrecognized`] rather than as an error.

use super::{
    ACK_LEN,
    ACK_SUFFIX,
    Acknowledgment,
    ContinuationFragment,
    ERROR_CODE_PREFIX,
    FIELD_WIDTH,
    FirstFragment,
    FragmentCount,
    FragmentIndex,
    FramingError,
    MAGIC,
    PROTOCOL_VERSION,
    REPLY_ERROR,
    REPLY_ERROR_ENCRYPTED,
    REPLY_SUCCESS,
    REQUEST_ID_WIDTH,
    ReplyKind,
    RequestId,
    SEPARATOR,
};

/// Outcome of [`classify`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Classified {
    /// Opening fragment of a request or reply.
    FirstFragment(FirstFragment),
    /// Subsequent fragment.
    ContinuationFragment(ContinuationFragment),
    /// Receipt for a fragment.
    Acknowledgment(Acknowledgment),
    /// Text that matches none of the tunnel headers.
    Unrecognized,
}

/// Classify `text` and extract its fields.
///
/// Acknowledgments are tested first because an acknowledgment is also
/// shaped like a first fragment whose payload is `ACK`.
///
/// # Examples
///
/// ```
/// use textframe::fragment::{Classified, classify};
/// assert!(matches!(
///     classify("01-CRADLE-000123-001-ACK"),
///     Classified::Acknowledgment(_)
/// ));
/// assert!(matches!(classify("002-abc"), Classified::ContinuationFragment(_)));
/// assert_eq!(classify("hello"), Classified::Unrecognized);
/// ```
#[must_use]
pub fn classify(text: &str) -> Classified {
    if let Some(ack) = scan_ack(text) {
        return Classified::Acknowledgment(ack);
    }
    if let Some(first) = scan_first(text) {
        return Classified::FirstFragment(first);
    }
    if let Some(rest) = scan_continuation(text) {
        return Classified::ContinuationFragment(rest);
    }
    Classified::Unrecognized
}

/// Parse `text` as a first fragment.
///
/// # Errors
///
/// Returns [`FramingError::NotFirstFragment`] when the header does not match.
pub fn parse_first(text: &str) -> Result<FirstFragment, FramingError> {
    if scan_ack(text).is_some() {
        return Err(FramingError::NotFirstFragment {
            text: text.to_owned(),
        });
    }
    scan_first(text).ok_or_else(|| FramingError::NotFirstFragment {
        text: text.to_owned(),
    })
}

/// Parse `text` as a continuation fragment.
///
/// # Errors
///
/// Returns [`FramingError::NotContinuation`] when the header does not match.
pub fn parse_continuation(text: &str) -> Result<ContinuationFragment, FramingError> {
    scan_continuation(text).ok_or_else(|| FramingError::NotContinuation {
        text: text.to_owned(),
    })
}

/// Parse `text` as an acknowledgment.
///
/// # Errors
///
/// Returns [`FramingError::NotAcknowledgment`] when the text does not match.
pub fn parse_ack(text: &str) -> Result<Acknowledgment, FramingError> {
    scan_ack(text).ok_or_else(|| FramingError::NotAcknowledgment {
        text: text.to_owned(),
    })
}

fn scan_ack(text: &str) -> Option<Acknowledgment> {
    if text.len() != ACK_LEN {
        return None;
    }
    let mut cursor = Cursor::new(text);
    let request_id = cursor.prefix()?;
    let index = FragmentIndex::new(cursor.digits(FIELD_WIDTH)?).ok()?;
    cursor.separator()?;
    cursor.literal(ACK_SUFFIX)?;
    cursor
        .rest()
        .is_empty()
        .then(|| Acknowledgment::new(request_id, index))
}

fn scan_first(text: &str) -> Option<FirstFragment> {
    let mut cursor = Cursor::new(text);
    let request_id = cursor.prefix()?;
    let marker = cursor.marker();

    let total = FragmentCount::new(cursor.digits(FIELD_WIDTH)?).ok()?;
    cursor.separator()?;

    let kind = match marker {
        None => ReplyKind::Request,
        Some(Marker::Success) => ReplyKind::Success,
        Some(Marker::Error { encrypted }) => {
            cursor.literal(ERROR_CODE_PREFIX)?;
            let status = cursor.digits(FIELD_WIDTH)?;
            cursor.separator()?;
            ReplyKind::Error { status, encrypted }
        }
    };

    let payload = cursor.rest();
    (!payload.is_empty()).then(|| FirstFragment::new(request_id, total, kind, payload))
}

fn scan_continuation(text: &str) -> Option<ContinuationFragment> {
    let mut cursor = Cursor::new(text);
    let index = FragmentIndex::new(cursor.digits(FIELD_WIDTH)?).ok()?;
    cursor.separator()?;
    let payload = cursor.rest();
    (!payload.is_empty()).then(|| ContinuationFragment::new(index, payload))
}

#[derive(Clone, Copy)]
enum Marker {
    Success,
    Error { encrypted: bool },
}

/// Forward-only reader over header fields.
struct Cursor<'a> {
    rest: &'a str,
}

impl<'a> Cursor<'a> {
    fn new(text: &'a str) -> Self { Self { rest: text } }

    fn rest(&self) -> &'a str { self.rest }

    fn literal(&mut self, expected: &str) -> Option<()> {
        self.rest = self.rest.strip_prefix(expected)?;
        Some(())
    }

    fn separator(&mut self) -> Option<()> {
        self.rest = self.rest.strip_prefix(SEPARATOR)?;
        Some(())
    }

    fn digits(&mut self, width: usize) -> Option<u16> {
        let field = self.rest.get(..width)?;
        if !field.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        self.rest = &self.rest[width..];
        field.parse().ok()
    }

    /// Consume `VV-MMMMMM-RRRRRR-` and return the request identifier.
    fn prefix(&mut self) -> Option<RequestId> {
        self.literal(PROTOCOL_VERSION)?;
        self.separator()?;
        self.literal(MAGIC)?;
        self.separator()?;
        let field = self.rest.get(..REQUEST_ID_WIDTH)?;
        if !field.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let id = RequestId::new(field.parse().ok()?).ok()?;
        self.rest = &self.rest[REQUEST_ID_WIDTH..];
        self.separator()?;
        Some(id)
    }

    /// Consume an optional reply marker and its separator.
    ///
    /// Longer markers are tried first since they share a prefix.
    fn marker(&mut self) -> Option<Marker> {
        let candidates = [
            (REPLY_ERROR_ENCRYPTED, Marker::Error { encrypted: true }),
            (REPLY_ERROR, Marker::Error { encrypted: false }),
            (REPLY_SUCCESS, Marker::Success),
        ];
        for (literal, marker) in candidates {
            if let Some(after) = self
                .rest
                .strip_prefix(literal)
                .and_then(|after| after.strip_prefix(SEPARATOR))
            {
                self.rest = after;
                return Some(marker);
            }
        }
        None
    }
}
