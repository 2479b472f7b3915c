//! Shared utilities for integration tests.
//!
//! Builds sessions wired to a [`RecordingTransport`] and feeds relay
//! messages into them.

// Items in this shared module may not be used by all test binaries that import it.
#![allow(
    dead_code,
    reason = "shared test utilities are not used by all test binaries"
)]

use textframe::{
    InboundMessage,
    MemoryCounterStore,
    RequestSequencer,
    TunnelConfig,
    TunnelSession,
};
use textframe_testing::{RecordingTransport, relay::RELAY};

/// Session type used by the integration tests.
pub type TestSession = TunnelSession<RecordingTransport>;

/// Build a session whose counter starts at `first_id`.
pub fn session(config: TunnelConfig, first_id: u32) -> (TestSession, RecordingTransport) {
    let transport = RecordingTransport::new();
    let sequencer =
        RequestSequencer::open(MemoryCounterStore::with_value(first_id)).expect("open counter");
    let session = TunnelSession::new(config, transport.clone(), sequencer).expect("session");
    (session, transport)
}

/// Feed messages from the relay in order.
pub fn feed<I>(session: &mut TestSession, texts: I)
where
    I: IntoIterator,
    I::Item: Into<String>,
{
    for text in texts {
        session
            .on_text_received(&InboundMessage::new(RELAY, text.into()))
            .expect("inbound message");
    }
}

/// Acknowledge every fragment of the request in flight.
pub fn acknowledge_all(session: &mut TestSession) {
    let request_id = session.request_id().expect("request in flight").get();
    let total = session.state().fragments_to_send;
    for index in 0..total {
        let index = u16::try_from(index).expect("fragment index");
        feed(session, [textframe_testing::relay::ack(request_id, index)]);
    }
}

/// Expire every pending deadline until none is left.
pub fn expire_all(session: &mut TestSession) {
    while let Some(at) = session.next_deadline() {
        session.on_deadline(at).expect("deadline");
    }
}
