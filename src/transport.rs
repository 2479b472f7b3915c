//! Platform short-text transport seam.
//!
//! The tunnel only needs a way to send one text message to an address.
//! Inbound messages arrive as [`InboundMessage`] values pushed into the
//! session by whatever receives them on the platform.

use derive_more::{Display, From, Into};
use thiserror::Error;

/// Address of a short-text endpoint, such as the relay's phone number.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Display, From, Into)]
pub struct Address(String);

impl Address {
    /// Wrap an address string.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self { Self(address.into()) }

    /// Borrow the address text.
    #[must_use]
    pub fn as_str(&self) -> &str { &self.0 }
}

impl From<&str> for Address {
    fn from(value: &str) -> Self { Self(value.to_owned()) }
}

/// Text received from the transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InboundMessage {
    /// Sender address.
    pub from: Address,
    /// Message body.
    pub text: String,
}

impl InboundMessage {
    /// Construct an inbound message.
    #[must_use]
    pub fn new(from: impl Into<Address>, text: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            text: text.into(),
        }
    }
}

/// Errors reported by a [`TextTransport`].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The platform refused or failed to send the message.
    #[error("failed to send to {to}: {reason}")]
    SendFailed {
        /// Destination address.
        to: Address,
        /// Platform diagnostic.
        reason: String,
    },
    /// The transport has been shut down.
    #[error("transport closed")]
    Closed,
}

/// Sends single text messages.
pub trait TextTransport: Send + 'static {
    /// Send `text` to `to`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the platform could not accept the
    /// message.
    fn send_text(&mut self, to: &Address, text: &str) -> Result<(), TransportError>;
}

impl<T: TextTransport + ?Sized> TextTransport for Box<T> {
    fn send_text(&mut self, to: &Address, text: &str) -> Result<(), TransportError> {
        (**self).send_text(to, text)
    }
}
