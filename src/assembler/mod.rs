//! Inbound half of the tunnel.
//!
//! [`InboundAssembler`] filters inbound text by sender, reassembles reply
//! fragments and acknowledges each accepted fragment back to the relay.
//! Acknowledgments addressed to the outbound side are surfaced as
//! [`InboundEvent::Acknowledgment`] for the transmitter to consume.

use log::debug;

use crate::{
    fragment::{
        Acknowledgment,
        Classified,
        FragmentCount,
        ReassembledMessage,
        ReassemblyStatus,
        Reassembler,
        RequestId,
        classify,
    },
    metrics::{self, Direction},
    transport::{Address, InboundMessage, TextTransport, TransportError},
};

/// Result of feeding one inbound message to the assembler.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InboundEvent {
    /// The message had no effect: foreign sender, unrecognized text or a
    /// fragment outside the receive window.
    Ignored,
    /// The relay acknowledged one of our fragments.
    Acknowledgment(Acknowledgment),
    /// A reply fragment was accepted and acknowledged.
    Progress {
        /// Identifier carried by the reply.
        request_id: RequestId,
        /// Whether this fragment opened the reply.
        first: bool,
        /// Fragments received so far.
        received: u16,
        /// Fragments announced by the relay.
        total: FragmentCount,
    },
    /// A repeated fragment was acknowledged again.
    Duplicate,
    /// The reply is complete.
    Complete(ReassembledMessage),
}

/// Receives, reassembles and acknowledges relay replies.
#[derive(Debug)]
pub struct InboundAssembler {
    relay: Address,
    reassembler: Reassembler,
}

impl InboundAssembler {
    /// Create an assembler accepting messages from `relay` only.
    #[must_use]
    pub fn new(relay: Address) -> Self {
        Self {
            relay,
            reassembler: Reassembler::new(),
        }
    }

    /// Address messages must come from.
    #[must_use]
    pub fn relay(&self) -> &Address { &self.relay }

    /// Whether a partial reply is buffered.
    #[must_use]
    pub fn is_receiving(&self) -> bool { self.reassembler.is_active() }

    /// Drop any partial reply.
    pub fn reset(&mut self) { self.reassembler.reset(); }

    /// Feed one inbound message.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if an acknowledgment cannot be sent. The
    /// fragment has been accepted regardless.
    pub fn accept<T>(
        &mut self,
        message: &InboundMessage,
        transport: &mut T,
    ) -> Result<InboundEvent, TransportError>
    where
        T: TextTransport + ?Sized,
    {
        if message.from != self.relay {
            debug!("ignoring message from foreign sender: from={}", message.from);
            return Ok(InboundEvent::Ignored);
        }

        match classify(&message.text) {
            Classified::Acknowledgment(ack) => Ok(InboundEvent::Acknowledgment(ack)),
            Classified::FirstFragment(first) => {
                metrics::inc_fragments(Direction::Inbound);
                let request_id = first.request_id();
                let status = self.reassembler.push_first(first);
                self.settle(request_id, status, true, transport)
            }
            Classified::ContinuationFragment(rest) => {
                let window = self
                    .reassembler
                    .request_id()
                    .or_else(|| self.reassembler.completed_request_id());
                let Some(request_id) = window else {
                    debug!(
                        "dropping continuation without a reply in progress: index={}",
                        rest.index()
                    );
                    metrics::inc_dropped();
                    return Ok(InboundEvent::Ignored);
                };
                match self.reassembler.push_continuation(rest) {
                    Ok(status) => {
                        metrics::inc_fragments(Direction::Inbound);
                        self.settle(request_id, status, false, transport)
                    }
                    Err(err) => {
                        debug!("dropping fragment: {err}");
                        metrics::inc_dropped();
                        Ok(InboundEvent::Ignored)
                    }
                }
            }
            Classified::Unrecognized => {
                debug!("dropping unrecognized text: len={}", message.text.len());
                metrics::inc_dropped();
                Ok(InboundEvent::Ignored)
            }
        }
    }

    fn settle<T>(
        &self,
        request_id: RequestId,
        status: ReassemblyStatus,
        first: bool,
        transport: &mut T,
    ) -> Result<InboundEvent, TransportError>
    where
        T: TextTransport + ?Sized,
    {
        let (ack, event) = match status {
            ReassemblyStatus::Incomplete {
                ack,
                received,
                total,
            } => (
                ack,
                InboundEvent::Progress {
                    request_id,
                    first,
                    received,
                    total,
                },
            ),
            ReassemblyStatus::Duplicate { ack } => (ack, InboundEvent::Duplicate),
            ReassemblyStatus::Complete { ack, message } => (ack, InboundEvent::Complete(message)),
        };
        let ack = Acknowledgment::new(request_id, ack);
        transport.send_text(&self.relay, &ack.to_string())?;
        Ok(event)
    }
}

#[cfg(test)]
mod tests;
