//! Tunnel session: one request and its reply at a time.
//!
//! [`TunnelSession`] wires the outbound transmitter, the inbound assembler,
//! the error classifier and the state tracker together. It is a synchronous
//! state machine driven by three inputs: a caller starting a transmission,
//! an inbound text message and an expired deadline. The session never
//! sleeps; it exposes [`TunnelSession::next_deadline`] and expects its
//! driver to call [`TunnelSession::on_deadline`] once that instant passes.
//! [`TunnelActor`] is the asynchronous driver used in production.

use log::{debug, info, warn};
use tokio::{sync::watch, time::Instant};

use crate::{
    assembler::{InboundAssembler, InboundEvent},
    classifier::{ErrorClassifier, OuterStatus},
    codec::{AesGcmCipher, Cipher, Compressor, GzipCompressor, PayloadCodec, TunnelKey},
    config::TunnelConfig,
    error::{Result, TunnelError},
    fragment::{ReassembledMessage, RequestId},
    metrics,
    sequencer::{CounterStore, MemoryCounterStore, RequestSequencer},
    state::{ResponseDisposition, TransmissionPhase, TransmissionState, TransmissionTracker},
    transmitter::{Delivery, OutboundTransmitter},
    transport::{InboundMessage, TextTransport},
};

pub mod actor;

pub use actor::{TunnelActor, TunnelHandle};

/// What the session is waiting for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerKind {
    /// An acknowledgment for the fragment in flight.
    Acknowledgment,
    /// The relay's reply, or its next fragment.
    Response,
}

#[derive(Clone, Copy, Debug)]
struct Deadline {
    at: Instant,
    kind: TimerKind,
}

/// Synchronous tunnel state machine.
pub struct TunnelSession<T, S = MemoryCounterStore, C = AesGcmCipher, Z = GzipCompressor> {
    config: TunnelConfig,
    transport: T,
    sequencer: RequestSequencer<S>,
    transmitter: OutboundTransmitter<C, Z>,
    assembler: InboundAssembler,
    classifier: ErrorClassifier<C, Z>,
    tracker: TransmissionTracker,
    key: Option<TunnelKey>,
    awaiting: Option<RequestId>,
    deadline: Option<Deadline>,
    counted: bool,
}

impl<T, S> TunnelSession<T, S>
where
    T: TextTransport,
    S: CounterStore,
{
    /// Create a session using AES-GCM and gzip.
    ///
    /// The configuration is normalized first, so out-of-range values are
    /// clamped.
    ///
    /// # Errors
    ///
    /// Returns [`TunnelError::Fragmentation`] if no fragmenter can be built
    /// for the normalized packet size.
    pub fn new(config: TunnelConfig, transport: T, sequencer: RequestSequencer<S>) -> Result<Self> {
        Self::with_codec(config, transport, sequencer, PayloadCodec::new())
    }
}

impl<T, S, C, Z> TunnelSession<T, S, C, Z>
where
    T: TextTransport,
    S: CounterStore,
    C: Cipher + Clone,
    Z: Compressor + Clone,
{
    /// Create a session with a custom payload codec.
    ///
    /// The configuration is normalized as in [`TunnelSession::new`].
    ///
    /// # Errors
    ///
    /// Returns [`TunnelError::Fragmentation`] if no fragmenter can be built
    /// for the normalized packet size.
    pub fn with_codec(
        config: TunnelConfig,
        transport: T,
        sequencer: RequestSequencer<S>,
        codec: PayloadCodec<C, Z>,
    ) -> Result<Self> {
        let config = config.normalized();
        let fragmenter = config.fragmenter()?;
        let tracker = TransmissionTracker::new(config.max_transmission_attempts);
        Ok(Self {
            transmitter: OutboundTransmitter::new(codec.clone(), fragmenter, config.relay.clone()),
            assembler: InboundAssembler::new(config.relay.clone()),
            classifier: ErrorClassifier::new(codec),
            tracker,
            config,
            transport,
            sequencer,
            key: None,
            awaiting: None,
            deadline: None,
            counted: false,
        })
    }
}

impl<T, S, C, Z> TunnelSession<T, S, C, Z>
where
    T: TextTransport,
    S: CounterStore,
    C: Cipher,
    Z: Compressor,
{
    /// Session configuration.
    #[must_use]
    pub fn config(&self) -> &TunnelConfig { &self.config }

    /// Current state snapshot.
    #[must_use]
    pub fn state(&self) -> &TransmissionState { self.tracker.state() }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> TransmissionPhase { self.tracker.phase() }

    /// Subscribe to state snapshots.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<TransmissionState> { self.tracker.subscribe() }

    /// Borrow the transport.
    #[must_use]
    pub fn transport(&self) -> &T { &self.transport }

    /// Borrow the request sequencer.
    #[must_use]
    pub fn sequencer(&self) -> &RequestSequencer<S> { &self.sequencer }

    /// Identifier of the request being delivered.
    #[must_use]
    pub fn request_id(&self) -> Option<RequestId> { self.transmitter.request_id() }

    /// Instant at which [`on_deadline`](Self::on_deadline) must next be called.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> { self.deadline.map(|deadline| deadline.at) }

    /// What the pending deadline guards.
    #[must_use]
    pub fn timer_kind(&self) -> Option<TimerKind> { self.deadline.map(|deadline| deadline.kind) }

    /// Start sending `payload` encrypted under `key`.
    ///
    /// Any previous result is discarded.
    ///
    /// # Errors
    ///
    /// Returns [`TunnelError::TransmissionActive`] while another
    /// transmission is in progress, or [`TunnelError::Transmit`] when the
    /// request cannot be prepared or its first fragment sent. In the latter
    /// case the phase is `Exception`.
    pub fn start_transmission(&mut self, payload: &[u8], key: TunnelKey) -> Result<RequestId> {
        if self.tracker.phase().is_active() {
            return Err(TunnelError::TransmissionActive);
        }

        self.tracker.reset();
        self.assembler.reset();
        self.deadline = None;
        let started = self.transmitter.start(
            payload,
            &key,
            &mut self.sequencer,
            &mut self.transport,
            &mut self.tracker,
        );
        self.key = Some(key);

        match started {
            Ok(request_id) => {
                self.awaiting = Some(request_id);
                if !self.counted {
                    self.counted = true;
                    metrics::inc_transmissions();
                }
                self.arm(TimerKind::Acknowledgment, 0);
                Ok(request_id)
            }
            Err(err) => {
                self.conclude();
                Err(err.into())
            }
        }
    }

    /// Feed one inbound text message.
    ///
    /// Messages from senders other than the relay are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`TunnelError`] when an acknowledgment or fragment cannot be
    /// sent. The phase is `Exception` afterwards.
    pub fn on_text_received(&mut self, message: &InboundMessage) -> Result<InboundEvent> {
        let event = match self.assembler.accept(message, &mut self.transport) {
            Ok(event) => event,
            Err(err) => {
                self.tracker.fail(err.to_string());
                self.abort();
                return Err(err.into());
            }
        };

        match &event {
            InboundEvent::Acknowledgment(ack) => {
                let delivery = self.transmitter.acknowledge(ack, &mut self.transport, &mut self.tracker);
                match delivery {
                    Ok(Delivery::Sent { .. }) => self.arm(TimerKind::Acknowledgment, 0),
                    Ok(Delivery::Delivered) => self.arm(TimerKind::Response, 0),
                    Ok(Delivery::Ignored | Delivery::Idle) => {}
                    Err(err) => {
                        self.abort();
                        return Err(err.into());
                    }
                }
            }
            InboundEvent::Progress {
                request_id,
                first,
                received,
                total,
            } => {
                if self.awaits_reply_to(*request_id) {
                    if *first {
                        self.tracker.begin_receiving(usize::from(total.get()));
                    } else {
                        self.tracker.record_received();
                    }
                    debug!("reply progress: received={received}, total={total}");
                    self.arm(TimerKind::Response, 0);
                }
            }
            InboundEvent::Complete(reply) => self.complete(reply)?,
            InboundEvent::Duplicate | InboundEvent::Ignored => {}
        }
        Ok(event)
    }

    fn awaits_reply_to(&self, request_id: RequestId) -> bool {
        let awaiting = matches!(
            self.tracker.phase(),
            TransmissionPhase::SendingToRelayServer
                | TransmissionPhase::WaitingForServerResponse
                | TransmissionPhase::ReceivingServerResponse
        );
        awaiting && self.awaiting == Some(request_id)
    }

    fn complete(&mut self, reply: &ReassembledMessage) -> Result<()> {
        if !self.awaits_reply_to(reply.request_id()) {
            debug!(
                "ignoring reply without a transmission awaiting it: request_id={}, awaiting={:?}",
                reply.request_id(),
                self.awaiting.map(|id| id.get())
            );
            return Ok(());
        }
        let Some(key) = self.key.clone() else {
            return Ok(());
        };

        if self.tracker.phase() == TransmissionPhase::ReceivingServerResponse {
            self.tracker.record_received();
        } else {
            self.tracker.begin_receiving(1);
        }

        let disposition = self.tracker.handle_response(
            reply.payload(),
            OuterStatus::from_reply(reply.kind()),
            &self.classifier,
            &key,
            &mut self.sequencer,
        );
        match disposition {
            ResponseDisposition::Settled => {
                self.transmitter.abandon();
                self.conclude();
                Ok(())
            }
            ResponseDisposition::Retransmit => {
                self.deadline = None;
                match self
                    .transmitter
                    .restart(&mut self.sequencer, &mut self.transport, &mut self.tracker)
                {
                    Ok(request_id) => {
                        self.awaiting = Some(request_id);
                        info!("request retransmitted: request_id={request_id}");
                        self.arm(TimerKind::Acknowledgment, 0);
                        Ok(())
                    }
                    Err(err) => {
                        self.abort();
                        Err(err.into())
                    }
                }
            }
        }
    }

    /// Handle the expiry of the pending deadline.
    ///
    /// Does nothing if no deadline is pending or `now` is before it.
    ///
    /// # Errors
    ///
    /// Returns [`TunnelError`] if resending a fragment fails.
    pub fn on_deadline(&mut self, now: Instant) -> Result<()> {
        let Some(deadline) = self.deadline else {
            return Ok(());
        };
        if now < deadline.at {
            return Ok(());
        }
        self.deadline = None;

        match deadline.kind {
            TimerKind::Acknowledgment => {
                let resends = self.transmitter.resends();
                if resends >= self.config.max_fragment_resends {
                    self.expire(format!("no acknowledgment from relay after {resends} resends"));
                    return Ok(());
                }
                match self
                    .transmitter
                    .on_acknowledgment_or_retry(false, &mut self.transport, &mut self.tracker)
                {
                    Ok(Delivery::Sent { .. }) => {
                        metrics::inc_resends();
                        let attempt = self.transmitter.resends();
                        self.arm(TimerKind::Acknowledgment, attempt);
                        Ok(())
                    }
                    Ok(_) => Ok(()),
                    Err(err) => {
                        self.abort();
                        Err(err.into())
                    }
                }
            }
            TimerKind::Response => {
                self.expire("no response from relay".to_owned());
                Ok(())
            }
        }
    }

    fn expire(&mut self, message: String) {
        metrics::inc_timeouts();
        self.tracker.time_out(message);
        self.abort();
    }

    /// Abandon the current transmission, if any, and return to idle.
    pub fn abandon(&mut self) {
        if self.tracker.phase().is_active() {
            warn!("abandoning transmission: phase={}", self.tracker.phase());
        }
        self.abort();
        self.tracker.finish();
    }

    /// Acknowledge the settled result and return to idle.
    ///
    /// A transmission still in progress is abandoned.
    pub fn finish(&mut self) {
        if self.tracker.phase().is_active() {
            self.abandon();
        } else {
            self.tracker.finish();
        }
    }

    fn arm(&mut self, kind: TimerKind, attempt: u32) {
        let after = match kind {
            TimerKind::Acknowledgment => self.config.ack_deadline(attempt),
            TimerKind::Response => self.config.response_timeout,
        };
        self.deadline = Some(Deadline {
            at: Instant::now() + after,
            kind,
        });
    }

    fn abort(&mut self) {
        self.transmitter.abandon();
        self.assembler.reset();
        self.conclude();
    }

    fn conclude(&mut self) {
        self.deadline = None;
        self.awaiting = None;
        if self.counted {
            self.counted = false;
            metrics::dec_transmissions();
        }
    }
}

impl<T, S, C, Z> std::fmt::Debug for TunnelSession<T, S, C, Z> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TunnelSession")
            .field("relay", &self.config.relay)
            .field("phase", &self.tracker.phase())
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}
