use derive_more::{Display, Into};

use super::FramingError;

/// Identifier tagging every fragment of one tunnelled request.
///
/// Request identifiers occupy six decimal digits on the wire, so the value is
/// confined to `0..=999_999` and wraps back to zero after the maximum.
///
/// # Examples
///
/// ```
/// use textframe::fragment::RequestId;
/// let id = RequestId::new(123).expect("in range");
/// assert_eq!(id.to_string(), "000123");
/// assert_eq!(RequestId::MAX.wrapping_next(), RequestId::ZERO);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Display, Into)]
#[display("{_0:06}")]
pub struct RequestId(u32);

impl RequestId {
    /// Smallest identifier.
    pub const ZERO: Self = Self(0);
    /// Largest identifier representable in the six-digit header field.
    pub const MAX: Self = Self(999_999);

    /// Construct an identifier, rejecting values wider than six digits.
    ///
    /// # Errors
    ///
    /// Returns [`FramingError::RequestIdOutOfRange`] for values above
    /// [`RequestId::MAX`].
    pub const fn new(value: u32) -> Result<Self, FramingError> {
        if value > Self::MAX.0 {
            return Err(FramingError::RequestIdOutOfRange { value });
        }
        Ok(Self(value))
    }

    /// Return the inner numeric identifier.
    #[must_use]
    pub const fn get(self) -> u32 { self.0 }

    /// Return the identifier following `self`, wrapping to zero after
    /// [`RequestId::MAX`].
    #[must_use]
    pub const fn wrapping_next(self) -> Self {
        if self.0 >= Self::MAX.0 {
            Self::ZERO
        } else {
            Self(self.0 + 1)
        }
    }
}

impl TryFrom<u32> for RequestId {
    type Error = FramingError;

    fn try_from(value: u32) -> Result<Self, Self::Error> { Self::new(value) }
}
