//! Transmission state tracking.
//!
//! [`TransmissionTracker`] is the single owner of the [`TransmissionState`].
//! Every mutation is published through a `tokio::sync::watch` channel so
//! observers such as a progress display always see the latest snapshot.
//! The tracker also owns the bounded retry policy applied when the relay
//! reports a request number mismatch.

use log::{debug, info, warn};
use tokio::sync::watch;

use crate::{
    classifier::{DecryptedResponse, ErrorClassifier, OuterStatus, is_error_code},
    codec::{Cipher, Compressor, TunnelKey},
    sequencer::{CounterStore, RequestSequencer},
};

pub mod phase;

pub use phase::{TransmissionPhase, TransmissionState};

/// What the session should do after a reply has been handled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResponseDisposition {
    /// Send the request again under the resynchronized identifier.
    Retransmit,
    /// The exchange is settled; the result is in the state.
    Settled,
}

/// Owner of the observable transmission state.
#[derive(Debug)]
pub struct TransmissionTracker {
    state: TransmissionState,
    max_transmission_attempts: u32,
    tx: watch::Sender<TransmissionState>,
}

impl TransmissionTracker {
    /// Create an idle tracker allowing `max_transmission_attempts` attempts
    /// per request.
    #[must_use]
    pub fn new(max_transmission_attempts: u32) -> Self {
        let state = TransmissionState::default();
        let (tx, _rx) = watch::channel(state.clone());
        Self {
            state,
            max_transmission_attempts: max_transmission_attempts.max(1),
            tx,
        }
    }

    /// Subscribe to state snapshots.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<TransmissionState> { self.tx.subscribe() }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> &TransmissionState { &self.state }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> TransmissionPhase { self.state.phase }

    /// Forget everything about the previous request.
    pub fn reset(&mut self) {
        self.state = TransmissionState::default();
        self.publish();
    }

    /// Enter `phase` without touching anything else.
    pub fn set_phase(&mut self, phase: TransmissionPhase) {
        if self.state.phase != phase {
            debug!("transmission phase: {} -> {phase}", self.state.phase);
        }
        self.state.phase = phase;
        self.publish();
    }

    /// Prepare to send a request of `fragments_to_send` fragments.
    ///
    /// Counters and the status code are cleared; the retransmission count is
    /// kept so the retry bound spans every attempt of one request.
    pub fn begin_sending(&mut self, fragments_to_send: usize) {
        let state = &mut self.state;
        state.fragments_sent = 0;
        state.fragments_to_send = fragments_to_send;
        state.fragments_received = 0;
        state.fragments_to_receive = 0;
        state.last_status_code = None;
        state.response_body = None;
        self.set_phase(TransmissionPhase::GettingReadyToSend);
    }

    /// A fragment went out on the transport.
    pub fn record_sent(&mut self) {
        self.state.fragments_sent += 1;
        self.set_phase(TransmissionPhase::SendingToRelayServer);
    }

    /// Every fragment of the request has been acknowledged.
    pub fn await_response(&mut self) {
        self.set_phase(TransmissionPhase::WaitingForServerResponse);
    }

    /// The first reply fragment announced `total` fragments.
    pub fn begin_receiving(&mut self, total: usize) {
        self.state.fragments_received = 1;
        self.state.fragments_to_receive = total;
        self.set_phase(TransmissionPhase::ReceivingServerResponse);
    }

    /// Another reply fragment was accepted.
    pub fn record_received(&mut self) {
        self.state.fragments_received += 1;
        self.publish();
    }

    /// The relay stopped answering.
    pub fn time_out(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!("transmission timed out: {message}");
        self.state.last_error_message = Some(message);
        self.set_phase(TransmissionPhase::TimeOut);
    }

    /// The transmission failed locally.
    pub fn fail(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!("transmission failed: {message}");
        self.state.last_error_message = Some(message);
        self.state.last_status_code = None;
        self.state.retransmit_attempts = 0;
        self.set_phase(TransmissionPhase::Exception);
    }

    /// The caller consumed the final result.
    pub fn finish(&mut self) {
        self.state.retransmit_attempts = 0;
        self.state.last_status_code = None;
        self.set_phase(TransmissionPhase::Done);
    }

    /// Handle a complete reply.
    ///
    /// With an outer `status` the body is classified as an outer error; a
    /// request number mismatch is retried while attempts remain, anything
    /// else ends in [`TransmissionPhase::WaitingForUserResponse`] with the
    /// message and code. Without a status the body is decrypted and either
    /// accepted or classified as an inner error. Replies that cannot be
    /// decoded end in [`TransmissionPhase::Exception`].
    pub fn handle_response<C, Z, S>(
        &mut self,
        text: &str,
        status: Option<OuterStatus>,
        classifier: &ErrorClassifier<C, Z>,
        key: &TunnelKey,
        sequencer: &mut RequestSequencer<S>,
    ) -> ResponseDisposition
    where
        C: Cipher,
        Z: Compressor,
        S: CounterStore,
    {
        match status {
            Some(status) => self.handle_outer(text, status, classifier, key, sequencer),
            None => {
                self.handle_inner(text, classifier, key);
                ResponseDisposition::Settled
            }
        }
    }

    fn handle_outer<C, Z, S>(
        &mut self,
        text: &str,
        status: OuterStatus,
        classifier: &ErrorClassifier<C, Z>,
        key: &TunnelKey,
        sequencer: &mut RequestSequencer<S>,
    ) -> ResponseDisposition
    where
        C: Cipher,
        Z: Compressor,
        S: CounterStore,
    {
        let outcome = match classifier.handle_outer(status, text, key, sequencer) {
            Ok(outcome) => outcome,
            Err(err) => {
                self.fail(format!("cannot interpret relay error {}: {err}", status.code()));
                return ResponseDisposition::Settled;
            }
        };

        let attempts_left = self.state.retransmit_attempts + 1 < self.max_transmission_attempts;
        if outcome.retransmit && attempts_left {
            self.state.retransmit_attempts += 1;
            info!(
                "request number mismatch, retransmitting: attempt={}, resync={:?}",
                self.state.retransmit_attempts + 1,
                outcome.resync.map(|id| id.get())
            );
            crate::metrics::inc_retransmissions();
            self.state.last_status_code = Some(outcome.code);
            self.state.last_error_message = Some(outcome.message);
            self.set_phase(TransmissionPhase::Retransmission);
            return ResponseDisposition::Retransmit;
        }

        self.settle(outcome.code, Some(outcome.message), None);
        ResponseDisposition::Settled
    }

    fn handle_inner<C, Z>(
        &mut self,
        text: &str,
        classifier: &ErrorClassifier<C, Z>,
        key: &TunnelKey,
    ) where
        C: Cipher,
        Z: Compressor,
    {
        let decoded = classifier
            .decode_text(text, key)
            .and_then(|decoded| DecryptedResponse::parse(&decoded).map(|parsed| (decoded, parsed)));
        let (decoded, response) = match decoded {
            Ok(pair) => pair,
            Err(err) => {
                self.fail(format!("cannot decode relay reply: {err}"));
                return;
            }
        };

        if is_error_code(response.code) {
            let message = classifier.handle_inner(&response);
            self.settle(response.code, Some(message), None);
        } else {
            self.settle(response.code, None, Some(decoded));
        }
    }

    fn settle(&mut self, code: u16, message: Option<String>, body: Option<String>) {
        info!("transmission settled: code={code}");
        self.state.last_status_code = Some(code);
        if message.is_some() {
            self.state.last_error_message = message;
        }
        if body.is_some() {
            self.state.last_error_message = None;
            self.state.response_body = body;
        }
        self.set_phase(TransmissionPhase::WaitingForUserResponse);
    }

    fn publish(&self) { self.tx.send_modify(|shared| shared.clone_from(&self.state)); }
}
