//! Three-digit fragment positions and counts.
//!
//! Both the fragment index carried by continuations and acknowledgments and
//! the fragment total carried by first fragments are printed as exactly three
//! decimal digits. [`FragmentIndex`] and [`FragmentCount`] keep those values
//! inside the representable range so a header can never be truncated.

use derive_more::{Display, Into};

use super::FramingError;

/// Largest value either three-digit field can carry.
pub const MAX_FIELD_VALUE: u16 = 999;

/// Zero-based ordinal describing a fragment's position within its request.
///
/// # Examples
///
/// ```
/// use textframe::fragment::FragmentIndex;
/// let index = FragmentIndex::new(3).expect("in range");
/// assert_eq!(index.to_string(), "003");
/// assert_eq!(index.checked_increment().map(FragmentIndex::get), Some(4));
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Display, Into)]
#[display("{_0:03}")]
pub struct FragmentIndex(u16);

impl FragmentIndex {
    /// Construct an index, rejecting values wider than three digits.
    ///
    /// # Errors
    ///
    /// Returns [`FramingError::FieldOutOfRange`] for values above 999.
    pub const fn new(value: u16) -> Result<Self, FramingError> {
        if value > MAX_FIELD_VALUE {
            return Err(FramingError::FieldOutOfRange { value: value as usize });
        }
        Ok(Self(value))
    }

    /// Return the first valid fragment index.
    #[must_use]
    pub const fn zero() -> Self { Self(0) }

    /// Return the underlying numeric value.
    #[must_use]
    pub const fn get(self) -> u16 { self.0 }

    /// Increment the index, returning `None` once the field would overflow.
    #[must_use]
    pub fn checked_increment(self) -> Option<Self> {
        let next = self.0.checked_add(1)?;
        (next <= MAX_FIELD_VALUE).then_some(Self(next))
    }
}

impl TryFrom<usize> for FragmentIndex {
    type Error = FramingError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        u16::try_from(value)
            .map_err(|_| FramingError::FieldOutOfRange { value })
            .and_then(Self::new)
    }
}

/// Number of fragments announced by a first fragment, in `1..=999`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Display, Into)]
#[display("{_0:03}")]
pub struct FragmentCount(u16);

impl FragmentCount {
    /// A request carried by a single fragment.
    pub const ONE: Self = Self(1);

    /// Construct a count, rejecting zero and values wider than three digits.
    ///
    /// # Errors
    ///
    /// Returns [`FramingError::FieldOutOfRange`] when `value` is zero or above
    /// 999.
    pub const fn new(value: u16) -> Result<Self, FramingError> {
        if value == 0 || value > MAX_FIELD_VALUE {
            return Err(FramingError::FieldOutOfRange { value: value as usize });
        }
        Ok(Self(value))
    }

    /// Return the underlying numeric value.
    #[must_use]
    pub const fn get(self) -> u16 { self.0 }
}

impl TryFrom<usize> for FragmentCount {
    type Error = FramingError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        u16::try_from(value)
            .map_err(|_| FramingError::FieldOutOfRange { value })
            .and_then(Self::new)
    }
}
