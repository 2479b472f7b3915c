//! Stop-and-wait delivery of outbound requests.
//!
//! [`OutboundTransmitter`] owns the pre-computed wire fragments of the
//! current request and never has more than one of them in flight: the next
//! fragment is only sent once the relay has acknowledged the previous one.
//! The encoded payload and key are retained so the request can be rebuilt
//! under a fresh identifier when the relay asks for a retransmission.

use log::{debug, info};

use crate::{
    codec::{AesGcmCipher, Cipher, Compressor, GzipCompressor, PayloadCodec, TunnelKey},
    fragment::{Acknowledgment, FragmentIndex, Fragmenter, RequestId},
    metrics::{self, Direction},
    sequencer::{CounterStore, RequestSequencer},
    state::TransmissionTracker,
    transport::{Address, TextTransport},
};

pub mod error;

pub use error::TransmitError;

/// Outcome of advancing the transmitter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Delivery {
    /// The fragment at `index` was sent and awaits acknowledgment.
    Sent {
        /// Index of the fragment now in flight.
        index: FragmentIndex,
    },
    /// Every fragment has been acknowledged.
    Delivered,
    /// The acknowledgment did not match the fragment in flight.
    Ignored,
    /// No request is in flight.
    Idle,
}

#[derive(Debug)]
struct OutboundRequest {
    request_id: RequestId,
    wire: Vec<String>,
    next_to_send: usize,
    resends: u32,
}

impl OutboundRequest {
    fn in_flight(&self) -> Option<FragmentIndex> {
        u16::try_from(self.next_to_send)
            .ok()
            .and_then(|index| FragmentIndex::new(index).ok())
    }
}

#[derive(Debug)]
struct PendingPayload {
    payload: Vec<u8>,
    key: TunnelKey,
}

/// Stop-and-wait sender for one request at a time.
#[derive(Debug)]
pub struct OutboundTransmitter<C = AesGcmCipher, Z = GzipCompressor> {
    codec: PayloadCodec<C, Z>,
    fragmenter: Fragmenter,
    relay: Address,
    request: Option<OutboundRequest>,
    pending: Option<PendingPayload>,
}

impl<C, Z> OutboundTransmitter<C, Z>
where
    C: Cipher,
    Z: Compressor,
{
    /// Create a transmitter sending to `relay`.
    #[must_use]
    pub fn new(codec: PayloadCodec<C, Z>, fragmenter: Fragmenter, relay: Address) -> Self {
        Self {
            codec,
            fragmenter,
            relay,
            request: None,
            pending: None,
        }
    }

    /// Whether a request is being delivered.
    #[must_use]
    pub fn is_active(&self) -> bool { self.request.is_some() }

    /// Identifier of the request being delivered.
    #[must_use]
    pub fn request_id(&self) -> Option<RequestId> {
        self.request.as_ref().map(|request| request.request_id)
    }

    /// Index of the fragment awaiting acknowledgment.
    #[must_use]
    pub fn in_flight(&self) -> Option<FragmentIndex> {
        self.request.as_ref().and_then(OutboundRequest::in_flight)
    }

    /// Times the in-flight fragment has been resent.
    #[must_use]
    pub fn resends(&self) -> u32 { self.request.as_ref().map_or(0, |request| request.resends) }

    /// Fragments of the current request.
    #[must_use]
    pub fn fragment_total(&self) -> usize {
        self.request.as_ref().map_or(0, |request| request.wire.len())
    }

    /// Start delivering `payload` under a fresh identifier.
    ///
    /// The payload is encoded, fragmented and its first fragment sent.
    ///
    /// # Errors
    ///
    /// Returns [`TransmitError`] when the identifier cannot be allocated, the
    /// payload cannot be encoded or fragmented, or the first send fails. The
    /// tracker is moved to `Exception` in every case.
    pub fn start<S, T>(
        &mut self,
        payload: &[u8],
        key: &TunnelKey,
        sequencer: &mut RequestSequencer<S>,
        transport: &mut T,
        tracker: &mut TransmissionTracker,
    ) -> Result<RequestId, TransmitError>
    where
        S: CounterStore,
        T: TextTransport + ?Sized,
    {
        self.pending = Some(PendingPayload {
            payload: payload.to_vec(),
            key: key.clone(),
        });
        self.launch(sequencer, transport, tracker)
    }

    /// Rebuild the last request under a fresh identifier and send it again.
    ///
    /// # Errors
    ///
    /// As [`start`](Self::start); additionally returns
    /// [`TransmitError::NothingToRetransmit`] when no payload is retained.
    pub fn restart<S, T>(
        &mut self,
        sequencer: &mut RequestSequencer<S>,
        transport: &mut T,
        tracker: &mut TransmissionTracker,
    ) -> Result<RequestId, TransmitError>
    where
        S: CounterStore,
        T: TextTransport + ?Sized,
    {
        if self.pending.is_none() {
            return Err(TransmitError::NothingToRetransmit);
        }
        self.launch(sequencer, transport, tracker)
    }

    fn launch<S, T>(
        &mut self,
        sequencer: &mut RequestSequencer<S>,
        transport: &mut T,
        tracker: &mut TransmissionTracker,
    ) -> Result<RequestId, TransmitError>
    where
        S: CounterStore,
        T: TextTransport + ?Sized,
    {
        self.request = None;
        let prepared = self.prepare(sequencer);
        let request = match prepared {
            Ok(request) => request,
            Err(err) => {
                tracker.fail(err.to_string());
                return Err(err);
            }
        };

        let request_id = request.request_id;
        info!(
            "transmission started: request_id={request_id}, fragments={}",
            request.wire.len()
        );
        tracker.begin_sending(request.wire.len());
        self.request = Some(request);
        self.send_current(transport, tracker)?;
        Ok(request_id)
    }

    fn prepare<S: CounterStore>(
        &self,
        sequencer: &mut RequestSequencer<S>,
    ) -> Result<OutboundRequest, TransmitError> {
        let pending = self.pending.as_ref().ok_or(TransmitError::NothingToRetransmit)?;
        let text = self.codec.encode(&pending.payload, &pending.key)?;
        let request_id = sequencer.peek();
        let batch = self.fragmenter.fragment(&text, request_id)?;
        sequencer.next()?;
        Ok(OutboundRequest {
            request_id,
            wire: batch.to_wire(),
            next_to_send: 0,
            resends: 0,
        })
    }

    /// Whether `ack` confirms the fragment in flight.
    #[must_use]
    pub fn matches(&self, ack: &Acknowledgment) -> bool {
        self.request.as_ref().is_some_and(|request| {
            request.request_id == ack.request_id() && request.in_flight() == Some(ack.index())
        })
    }

    /// Handle an inbound acknowledgment.
    ///
    /// Acknowledgments for another request or another fragment are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`TransmitError::Transport`] if sending the next fragment
    /// fails.
    pub fn acknowledge<T>(
        &mut self,
        ack: &Acknowledgment,
        transport: &mut T,
        tracker: &mut TransmissionTracker,
    ) -> Result<Delivery, TransmitError>
    where
        T: TextTransport + ?Sized,
    {
        if !self.matches(ack) {
            debug!(
                "ignoring acknowledgment: ack={ack}, in_flight={:?}",
                self.in_flight().map(FragmentIndex::get)
            );
            return Ok(Delivery::Ignored);
        }
        self.on_acknowledgment_or_retry(true, transport, tracker)
    }

    /// Advance on acknowledgment, or resend the in-flight fragment.
    ///
    /// When `acknowledged` the next fragment is sent, or the tracker moves to
    /// `WaitingForServerResponse` once none remain. Otherwise the fragment in
    /// flight is sent again.
    ///
    /// # Errors
    ///
    /// Returns [`TransmitError::Transport`] if the send fails; the request is
    /// then discarded and the tracker moved to `Exception`.
    pub fn on_acknowledgment_or_retry<T>(
        &mut self,
        acknowledged: bool,
        transport: &mut T,
        tracker: &mut TransmissionTracker,
    ) -> Result<Delivery, TransmitError>
    where
        T: TextTransport + ?Sized,
    {
        let Some(request) = self.request.as_mut() else {
            return Ok(Delivery::Idle);
        };

        if acknowledged {
            request.next_to_send += 1;
            request.resends = 0;
            if request.next_to_send >= request.wire.len() {
                info!("all fragments acknowledged: request_id={}", request.request_id);
                self.request = None;
                tracker.await_response();
                return Ok(Delivery::Delivered);
            }
        } else {
            request.resends += 1;
            debug!(
                "resending fragment: request_id={}, index={}, resend={}",
                request.request_id, request.next_to_send, request.resends
            );
        }

        self.send_current(transport, tracker)
    }

    fn send_current<T>(
        &mut self,
        transport: &mut T,
        tracker: &mut TransmissionTracker,
    ) -> Result<Delivery, TransmitError>
    where
        T: TextTransport + ?Sized,
    {
        let Some(request) = self.request.as_ref() else {
            return Ok(Delivery::Idle);
        };
        let Some(index) = request.in_flight() else {
            return Ok(Delivery::Idle);
        };
        let Some(text) = request.wire.get(request.next_to_send) else {
            return Ok(Delivery::Idle);
        };

        if let Err(err) = transport.send_text(&self.relay, text) {
            self.request = None;
            tracker.fail(err.to_string());
            return Err(err.into());
        }
        metrics::inc_fragments(Direction::Outbound);
        tracker.record_sent();
        Ok(Delivery::Sent { index })
    }

    /// Forget the request in flight and the retained payload.
    pub fn abandon(&mut self) {
        if let Some(request) = self.request.take() {
            info!("transmission abandoned: request_id={}", request.request_id);
        }
        self.pending = None;
    }
}
