//! Unit tests for inbound filtering, reassembly and acknowledgment.

use rstest::{fixture, rstest};

use super::{InboundAssembler, InboundEvent};
use crate::{
    fragment::{Fragmenter, ReplyKind, RequestId},
    transport::{Address, InboundMessage, TextTransport, TransportError},
};

const RELAY: &str = "+15550100";

#[derive(Debug, Default)]
struct Outbox {
    sent: Vec<String>,
}

impl TextTransport for Outbox {
    fn send_text(&mut self, to: &Address, text: &str) -> Result<(), TransportError> {
        assert_eq!(to.as_str(), RELAY);
        self.sent.push(text.to_owned());
        Ok(())
    }
}

#[fixture]
fn assembler() -> InboundAssembler { InboundAssembler::new(Address::from(RELAY)) }

fn reply_wire(payload: &str, id: u32) -> Vec<String> {
    Fragmenter::default()
        .fragment_as(payload, RequestId::new(id).expect("id"), ReplyKind::Success)
        .expect("fragment reply")
        .to_wire()
}

fn from_relay(text: &str) -> InboundMessage { InboundMessage::new(RELAY, text) }

#[rstest]
fn foreign_sender_is_ignored(mut assembler: InboundAssembler) {
    let mut outbox = Outbox::default();
    let wire = reply_wire("abc", 1);
    let event = assembler
        .accept(&InboundMessage::new("+15550199", wire[0].clone()), &mut outbox)
        .expect("accept");
    assert_eq!(event, InboundEvent::Ignored);
    assert!(outbox.sent.is_empty());
    assert!(!assembler.is_receiving());
}

#[rstest]
fn acknowledgments_are_forwarded(mut assembler: InboundAssembler) {
    let mut outbox = Outbox::default();
    let event = assembler
        .accept(&from_relay("01-CRADLE-000042-000-ACK"), &mut outbox)
        .expect("accept");
    assert!(matches!(event, InboundEvent::Acknowledgment(ack) if ack.request_id().get() == 42));
    assert!(outbox.sent.is_empty());
}

#[rstest]
fn unrecognized_text_is_dropped(mut assembler: InboundAssembler) {
    let mut outbox = Outbox::default();
    let event = assembler
        .accept(&from_relay("Your balance is low"), &mut outbox)
        .expect("accept");
    assert_eq!(event, InboundEvent::Ignored);
    assert!(outbox.sent.is_empty());
}

#[rstest]
fn multi_fragment_reply_is_acknowledged_and_completed(mut assembler: InboundAssembler) {
    let mut outbox = Outbox::default();
    let payload = "r".repeat(700);
    let wire = reply_wire(&payload, 77);
    assert_eq!(wire.len(), 3);

    let first = assembler.accept(&from_relay(&wire[0]), &mut outbox).expect("accept");
    assert!(matches!(
        first,
        InboundEvent::Progress {
            first: true,
            received: 1,
            ..
        }
    ));
    assembler.accept(&from_relay(&wire[1]), &mut outbox).expect("accept");
    let last = assembler.accept(&from_relay(&wire[2]), &mut outbox).expect("accept");

    let InboundEvent::Complete(message) = last else {
        panic!("expected completion, got {last:?}");
    };
    assert_eq!(message.payload(), payload);
    assert_eq!(message.kind(), ReplyKind::Success);
    assert_eq!(
        outbox.sent,
        vec![
            "01-CRADLE-000077-000-ACK",
            "01-CRADLE-000077-001-ACK",
            "01-CRADLE-000077-002-ACK",
        ]
    );
}

#[rstest]
fn out_of_order_continuation_is_dropped_silently(mut assembler: InboundAssembler) {
    let mut outbox = Outbox::default();
    let wire = reply_wire(&"q".repeat(700), 5);

    assembler.accept(&from_relay(&wire[0]), &mut outbox).expect("accept");
    let early = assembler.accept(&from_relay(&wire[2]), &mut outbox).expect("accept");
    assert_eq!(early, InboundEvent::Ignored);
    assert_eq!(outbox.sent.len(), 1);

    let next = assembler.accept(&from_relay(&wire[1]), &mut outbox).expect("accept");
    assert!(matches!(next, InboundEvent::Progress { received: 2, .. }));
}

#[rstest]
fn duplicate_is_reacknowledged(mut assembler: InboundAssembler) {
    let mut outbox = Outbox::default();
    let wire = reply_wire(&"d".repeat(700), 6);

    assembler.accept(&from_relay(&wire[0]), &mut outbox).expect("accept");
    assembler.accept(&from_relay(&wire[1]), &mut outbox).expect("accept");
    let again = assembler.accept(&from_relay(&wire[1]), &mut outbox).expect("accept");

    assert_eq!(again, InboundEvent::Duplicate);
    assert_eq!(outbox.sent.last().map(String::as_str), Some("01-CRADLE-000006-001-ACK"));
}

#[rstest]
fn continuation_without_reply_is_dropped(mut assembler: InboundAssembler) {
    let mut outbox = Outbox::default();
    let event = assembler.accept(&from_relay("001-abc"), &mut outbox).expect("accept");
    assert_eq!(event, InboundEvent::Ignored);
    assert!(outbox.sent.is_empty());
}

#[rstest]
fn reset_discards_partial_reply(mut assembler: InboundAssembler) {
    let mut outbox = Outbox::default();
    let wire = reply_wire(&"z".repeat(700), 8);
    assembler.accept(&from_relay(&wire[0]), &mut outbox).expect("accept");
    assert!(assembler.is_receiving());
    assembler.reset();
    assert!(!assembler.is_receiving());
    let event = assembler.accept(&from_relay(&wire[1]), &mut outbox).expect("accept");
    assert_eq!(event, InboundEvent::Ignored);
}

#[rstest]
fn repeated_final_fragment_is_reacknowledged(mut assembler: InboundAssembler) {
    let mut outbox = Outbox::default();
    let wire = reply_wire(&"f".repeat(700), 9);
    for text in &wire {
        assembler.accept(&from_relay(text), &mut outbox).expect("accept");
    }
    assert_eq!(outbox.sent.len(), 3);

    let again = assembler.accept(&from_relay(&wire[2]), &mut outbox).expect("accept");
    assert_eq!(again, InboundEvent::Duplicate);
    assert_eq!(outbox.sent.len(), 4);
    assert_eq!(outbox.sent.last().map(String::as_str), Some("01-CRADLE-000009-002-ACK"));
    assert!(!assembler.is_receiving());
}

#[rstest]
fn new_reply_forgets_the_completed_one(mut assembler: InboundAssembler) {
    let mut outbox = Outbox::default();
    for text in reply_wire(&"g".repeat(700), 10) {
        assembler.accept(&from_relay(&text), &mut outbox).expect("accept");
    }
    let single = reply_wire("short", 11);
    assembler.accept(&from_relay(&single[0]), &mut outbox).expect("accept");
    let sent = outbox.sent.len();

    let stale = assembler
        .accept(&from_relay("002-gggg"), &mut outbox)
        .expect("accept");
    assert_eq!(stale, InboundEvent::Ignored);
    assert_eq!(outbox.sent.len(), sent);
}
