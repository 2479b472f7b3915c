//! In-memory transport recording every outbound message.

use std::sync::{
    Arc,
    Mutex,
    MutexGuard,
    atomic::{AtomicBool, Ordering},
};

use textframe::transport::{Address, TextTransport, TransportError};

/// One message handed to the transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SentText {
    /// Destination address.
    pub to: Address,
    /// Message body.
    pub text: String,
}

/// Transport whose clones share one outbox.
///
/// Give one clone to the session and keep another to inspect what was sent
/// or to make subsequent sends fail.
#[derive(Clone, Debug, Default)]
pub struct RecordingTransport {
    sent: Arc<Mutex<Vec<SentText>>>,
    refuse: Arc<AtomicBool>,
}

impl RecordingTransport {
    /// Create an empty transport.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    fn outbox(&self) -> MutexGuard<'_, Vec<SentText>> {
        self.sent.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Every message sent so far.
    #[must_use]
    pub fn sent(&self) -> Vec<SentText> { self.outbox().clone() }

    /// Bodies of every message sent so far.
    #[must_use]
    pub fn texts(&self) -> Vec<String> {
        self.outbox().iter().map(|sent| sent.text.clone()).collect()
    }

    /// Body of the most recent message.
    #[must_use]
    pub fn last(&self) -> Option<String> { self.outbox().last().map(|sent| sent.text.clone()) }

    /// Number of messages sent.
    #[must_use]
    pub fn len(&self) -> usize { self.outbox().len() }

    /// Whether nothing has been sent.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.outbox().is_empty() }

    /// Forget recorded messages.
    pub fn clear(&self) { self.outbox().clear(); }

    /// Make subsequent sends fail, or succeed again.
    pub fn set_refusing(&self, refuse: bool) { self.refuse.store(refuse, Ordering::SeqCst); }
}

impl TextTransport for RecordingTransport {
    fn send_text(&mut self, to: &Address, text: &str) -> Result<(), TransportError> {
        if self.refuse.load(Ordering::SeqCst) {
            return Err(TransportError::SendFailed {
                to: to.clone(),
                reason: "transport refusing".to_owned(),
            });
        }
        self.outbox().push(SentText {
            to: to.clone(),
            text: text.to_owned(),
        });
        Ok(())
    }
}
