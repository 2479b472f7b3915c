//! Request identifier generation.
//!
//! [`RequestSequencer`] hands out the six-digit identifiers stamped on every
//! outbound request. The next value is persisted through a [`CounterStore`]
//! before an identifier is returned, so a restart never reuses one that may
//! already have reached the relay. When the relay reports that it expected a
//! different identifier, [`RequestSequencer::resync`] overwrites the counter.

use log::{debug, info};

use crate::fragment::RequestId;

pub mod error;
pub mod store;

pub use error::SequencerError;
pub use store::{CounterStore, FileCounterStore, MemoryCounterStore};

/// Persistent generator of [`RequestId`] values.
#[derive(Debug)]
pub struct RequestSequencer<S = MemoryCounterStore> {
    store: S,
    next: RequestId,
}

impl<S: CounterStore> RequestSequencer<S> {
    /// Load the counter from `store`; an empty store starts at zero.
    ///
    /// # Errors
    ///
    /// Returns [`SequencerError`] if the store cannot be read or holds a
    /// value wider than six digits.
    pub fn open(mut store: S) -> Result<Self, SequencerError> {
        let raw = store.load()?.unwrap_or(0);
        let next = RequestId::new(raw)?;
        debug!("request sequencer opened: next={next}");
        Ok(Self { store, next })
    }

    /// Return the next identifier and persist its successor.
    ///
    /// The counter wraps to zero after 999999.
    ///
    /// # Errors
    ///
    /// Returns [`SequencerError`] when the successor cannot be persisted; the
    /// in-memory counter is left unchanged so the same identifier is offered
    /// again.
    pub fn next(&mut self) -> Result<RequestId, SequencerError> {
        let current = self.next;
        let following = current.wrapping_next();
        self.store.store(following.get())?;
        self.next = following;
        Ok(current)
    }

    /// Overwrite the counter so the next identifier is `value`.
    ///
    /// # Errors
    ///
    /// Returns [`SequencerError::Framing`] for values above 999999 and
    /// [`SequencerError`] store variants if persisting fails.
    pub fn resync(&mut self, value: u32) -> Result<(), SequencerError> {
        let id = RequestId::new(value)?;
        self.store.store(id.get())?;
        info!("request sequencer resynchronized: from={}, to={id}", self.next);
        self.next = id;
        Ok(())
    }

    /// Identifier the next call to [`next`](Self::next) will return.
    #[must_use]
    pub const fn peek(&self) -> RequestId { self.next }

    /// Borrow the backing store.
    #[must_use]
    pub fn store(&self) -> &S { &self.store }
}
