//! Inbound helper that stitches fragments back into one payload.
//!
//! [`Reassembler`] holds at most one assembly buffer: the tunnel never has
//! more than one exchange in flight per direction. A new first fragment
//! always replaces whatever partial buffer was present. Continuations are
//! accepted strictly in order; anything ahead of the window is refused and a
//! repeat of an already accepted index is reported as a duplicate so the
//! caller can acknowledge it again. The identity of the last completed
//! exchange is remembered so repeats of its final fragments are still
//! recognised after the buffer has been handed out.

use log::debug;

use super::{
    ContinuationFragment,
    FirstFragment,
    FragmentCount,
    FragmentIndex,
    ReassemblyError,
    ReassemblyStatus,
    ReplyKind,
    RequestId,
};

#[derive(Debug)]
struct AssemblyBuffer {
    request_id: RequestId,
    kind: ReplyKind,
    total: FragmentCount,
    received: u16,
    payload: String,
}

impl AssemblyBuffer {
    fn is_complete(&self) -> bool { self.received >= self.total.get() }

    fn last_index(&self) -> FragmentIndex {
        FragmentIndex::new(self.received.saturating_sub(1)).unwrap_or_default()
    }
}

/// Container for a fully reassembled payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReassembledMessage {
    request_id: RequestId,
    kind: ReplyKind,
    payload: String,
}

impl ReassembledMessage {
    /// Construct a new [`ReassembledMessage`].
    #[must_use]
    pub fn new(request_id: RequestId, kind: ReplyKind, payload: String) -> Self {
        Self {
            request_id,
            kind,
            payload,
        }
    }

    /// Identifier shared by the fragments that formed this payload.
    #[must_use]
    pub const fn request_id(&self) -> RequestId { self.request_id }

    /// Kind announced by the first fragment.
    #[must_use]
    pub const fn kind(&self) -> ReplyKind { self.kind }

    /// Borrow the reassembled payload text.
    #[must_use]
    pub fn payload(&self) -> &str { &self.payload }

    /// Consume the message, returning the payload text.
    #[must_use]
    pub fn into_payload(self) -> String { self.payload }
}

/// Single-slot fragment reassembler.
#[derive(Debug, Default)]
pub struct Reassembler {
    active: Option<AssemblyBuffer>,
    completed: Option<(RequestId, FragmentCount)>,
}

impl Reassembler {
    /// Create an empty reassembler.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Whether a partial assembly is buffered.
    #[must_use]
    pub fn is_active(&self) -> bool { self.active.is_some() }

    /// Identifier of the buffered assembly, if any.
    #[must_use]
    pub fn request_id(&self) -> Option<RequestId> {
        self.active.as_ref().map(|buffer| buffer.request_id)
    }

    /// Identifier of the last completed assembly, if no newer one started.
    #[must_use]
    pub fn completed_request_id(&self) -> Option<RequestId> {
        self.completed.map(|(request_id, _)| request_id)
    }

    /// Fragments received and announced for the buffered assembly.
    #[must_use]
    pub fn progress(&self) -> Option<(u16, FragmentCount)> {
        self.active
            .as_ref()
            .map(|buffer| (buffer.received, buffer.total))
    }

    /// Start a new assembly from `first`, discarding any partial buffer.
    ///
    /// A single-fragment exchange completes immediately.
    pub fn push_first(&mut self, first: FirstFragment) -> ReassemblyStatus {
        self.completed = None;
        if let Some(stale) = self.active.take() {
            debug!(
                "discarding partial assembly: request_id={}, received={}, total={}",
                stale.request_id, stale.received, stale.total
            );
        }

        let buffer = AssemblyBuffer {
            request_id: first.request_id(),
            kind: first.kind(),
            total: first.total(),
            received: 1,
            payload: first.into_payload(),
        };
        self.settle(buffer)
    }

    /// Append a continuation to the active assembly.
    ///
    /// # Errors
    ///
    /// Returns [`ReassemblyError::NoActiveAssembly`] when no first fragment
    /// has been seen and the fragment is not a repeat from the last
    /// completed assembly, and [`ReassemblyError::IndexMismatch`] when the
    /// fragment is ahead of the next expected index or past the announced
    /// total. Refused fragments leave the buffer untouched.
    pub fn push_continuation(
        &mut self,
        fragment: ContinuationFragment,
    ) -> Result<ReassemblyStatus, ReassemblyError> {
        let Some(mut buffer) = self.active.take() else {
            let found = fragment.index();
            return match self.completed {
                Some((_, total)) if found.get() < total.get() => {
                    Ok(ReassemblyStatus::Duplicate { ack: found })
                }
                _ => Err(ReassemblyError::NoActiveAssembly { found }),
            };
        };

        let found = fragment.index();
        if found.get() < buffer.received {
            self.active = Some(buffer);
            return Ok(ReassemblyStatus::Duplicate { ack: found });
        }
        if found.get() != buffer.received || buffer.is_complete() {
            let err = ReassemblyError::IndexMismatch {
                request_id: buffer.request_id,
                expected: buffer.received,
                found,
            };
            self.active = Some(buffer);
            return Err(err);
        }

        buffer.payload.push_str(fragment.payload());
        buffer.received += 1;
        Ok(self.settle(buffer))
    }

    /// Drop any partial assembly.
    pub fn reset(&mut self) {
        self.active = None;
        self.completed = None;
    }

    fn settle(&mut self, buffer: AssemblyBuffer) -> ReassemblyStatus {
        let ack = buffer.last_index();
        if buffer.is_complete() {
            self.completed = Some((buffer.request_id, buffer.total));
            return ReassemblyStatus::Complete {
                ack,
                message: ReassembledMessage::new(buffer.request_id, buffer.kind, buffer.payload),
            };
        }
        let status = ReassemblyStatus::Incomplete {
            ack,
            received: buffer.received,
            total: buffer.total,
        };
        self.active = Some(buffer);
        status
    }
}
