//! Asynchronous driver for a [`TunnelSession`].
//!
//! The actor owns the session and polls a shutdown token, a command queue
//! and the session's pending deadline with a `tokio::select!` loop. The
//! `biased` keyword makes shutdown win over queued commands, and commands
//! win over a deadline expiring in the same poll so a late acknowledgment
//! is never mistaken for a timeout.

use tokio::{
    sync::{mpsc, oneshot, watch},
    task::JoinHandle,
    time::{Instant, sleep_until},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::TunnelSession;
use crate::{
    codec::{Cipher, Compressor, TunnelKey},
    error::{Result, TunnelError},
    fragment::RequestId,
    sequencer::CounterStore,
    state::TransmissionState,
    transport::{Address, InboundMessage, TextTransport},
};

/// Capacity of the command queue created by [`TunnelActor::new`].
pub const COMMAND_CAPACITY: usize = 64;

enum Command {
    Start {
        payload: Vec<u8>,
        key: TunnelKey,
        reply: oneshot::Sender<Result<RequestId>>,
    },
    Deliver(InboundMessage),
    Abandon,
    Finish,
}

/// Cloneable handle used to drive a running [`TunnelActor`].
#[derive(Clone, Debug)]
pub struct TunnelHandle {
    commands: mpsc::Sender<Command>,
    state: watch::Receiver<TransmissionState>,
    shutdown: CancellationToken,
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Start { payload, .. } => f
                .debug_struct("Start")
                .field("payload_len", &payload.len())
                .finish_non_exhaustive(),
            Self::Deliver(message) => f.debug_tuple("Deliver").field(&message.from).finish(),
            Self::Abandon => f.write_str("Abandon"),
            Self::Finish => f.write_str("Finish"),
        }
    }
}

impl TunnelHandle {
    /// Start sending `payload` encrypted under `key`.
    ///
    /// # Errors
    ///
    /// Returns the session's error if the transmission cannot start, or
    /// [`TunnelError::SessionClosed`] if the actor has stopped.
    pub async fn start_transmission(
        &self,
        payload: impl Into<Vec<u8>>,
        key: TunnelKey,
    ) -> Result<RequestId> {
        let (reply, response) = oneshot::channel();
        self.send(Command::Start {
            payload: payload.into(),
            key,
            reply,
        })
        .await?;
        response.await.map_err(|_| TunnelError::SessionClosed)?
    }

    /// Deliver an inbound text message to the session.
    ///
    /// # Errors
    ///
    /// Returns [`TunnelError::SessionClosed`] if the actor has stopped.
    pub async fn deliver(&self, from: impl Into<Address>, text: impl Into<String>) -> Result<()> {
        self.send(Command::Deliver(InboundMessage::new(from, text))).await
    }

    /// Deliver an inbound message without waiting for queue space.
    ///
    /// Intended for synchronous platform callbacks.
    ///
    /// # Errors
    ///
    /// Returns [`TunnelError::SessionClosed`] if the actor has stopped or its
    /// queue is full.
    pub fn try_deliver(&self, message: InboundMessage) -> Result<()> {
        self.commands
            .try_send(Command::Deliver(message))
            .map_err(|_| TunnelError::SessionClosed)
    }

    /// Abandon the current transmission.
    ///
    /// # Errors
    ///
    /// Returns [`TunnelError::SessionClosed`] if the actor has stopped.
    pub async fn abandon(&self) -> Result<()> { self.send(Command::Abandon).await }

    /// Acknowledge the settled result and return the session to idle.
    ///
    /// # Errors
    ///
    /// Returns [`TunnelError::SessionClosed`] if the actor has stopped.
    pub async fn finish(&self) -> Result<()> { self.send(Command::Finish).await }

    /// Latest published state.
    #[must_use]
    pub fn current_state(&self) -> TransmissionState { self.state.borrow().clone() }

    /// Subscribe to state snapshots.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<TransmissionState> { self.state.clone() }

    /// Wait until the published state satisfies `predicate`.
    ///
    /// # Errors
    ///
    /// Returns [`TunnelError::SessionClosed`] if the actor stops first.
    pub async fn wait_for<F>(&self, mut predicate: F) -> Result<TransmissionState>
    where
        F: FnMut(&TransmissionState) -> bool,
    {
        let mut state = self.state.clone();
        let snapshot = state
            .wait_for(|current| predicate(current))
            .await
            .map_err(|_| TunnelError::SessionClosed)?;
        Ok(snapshot.clone())
    }

    /// Ask the actor to stop.
    pub fn shutdown(&self) { self.shutdown.cancel(); }

    async fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| TunnelError::SessionClosed)
    }
}

/// Actor owning a [`TunnelSession`] and its timers.
pub struct TunnelActor<T, S, C, Z> {
    session: TunnelSession<T, S, C, Z>,
    commands: mpsc::Receiver<Command>,
    shutdown: CancellationToken,
}

impl<T, S, C, Z> TunnelActor<T, S, C, Z>
where
    T: TextTransport,
    S: CounterStore,
    C: Cipher,
    Z: Compressor,
{
    /// Wrap `session` in an actor, returning the actor and its handle.
    #[must_use]
    pub fn new(
        session: TunnelSession<T, S, C, Z>,
        shutdown: CancellationToken,
    ) -> (Self, TunnelHandle) {
        let (tx, rx) = mpsc::channel(COMMAND_CAPACITY);
        let handle = TunnelHandle {
            commands: tx,
            state: session.subscribe(),
            shutdown: shutdown.clone(),
        };
        let actor = Self {
            session,
            commands: rx,
            shutdown,
        };
        (actor, handle)
    }

    /// Spawn the actor on the current runtime.
    ///
    /// The task ends when [`TunnelHandle::shutdown`] is called or every
    /// handle has been dropped; it yields the session back.
    #[must_use]
    pub fn spawn(
        session: TunnelSession<T, S, C, Z>,
    ) -> (TunnelHandle, JoinHandle<TunnelSession<T, S, C, Z>>) {
        let (actor, handle) = Self::new(session, CancellationToken::new());
        (handle, tokio::spawn(actor.run()))
    }

    /// Drive the session until shutdown or until every handle is dropped.
    pub async fn run(mut self) -> TunnelSession<T, S, C, Z> {
        if self.shutdown.is_cancelled() {
            return self.session;
        }
        info!(relay = %self.session.config().relay, "tunnel actor started");

        loop {
            let deadline = self.session.next_deadline();
            tokio::select! {
                biased;

                () = self.shutdown.cancelled() => {
                    debug!("tunnel actor shutting down");
                    break;
                }

                command = self.commands.recv() => {
                    let Some(command) = command else {
                        debug!("all tunnel handles dropped");
                        break;
                    };
                    self.handle(command);
                }

                () = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    if let Err(err) = self.session.on_deadline(Instant::now()) {
                        warn!(error = %err, "deadline handling failed");
                    }
                }
            }
        }

        if self.session.phase().is_active() {
            self.session.abandon();
        }
        info!("tunnel actor stopped");
        self.session
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Start { payload, key, reply } => {
                let result = self.session.start_transmission(&payload, key);
                if let Err(err) = &result {
                    warn!(error = %err, "transmission did not start");
                }
                if reply.send(result).is_err() {
                    debug!("start requester went away");
                }
            }
            Command::Deliver(message) => {
                if let Err(err) = self.session.on_text_received(&message) {
                    warn!(from = %message.from, error = %err, "inbound message failed");
                }
            }
            Command::Abandon => self.session.abandon(),
            Command::Finish => self.session.finish(),
        }
    }
}

impl<T, S, C, Z> std::fmt::Debug for TunnelActor<T, S, C, Z> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TunnelActor")
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}
