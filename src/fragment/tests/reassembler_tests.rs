//! Tests for inbound reassembly ordering, duplicates and resets.

use rstest::{fixture, rstest};

use crate::fragment::{
    ContinuationFragment,
    FirstFragment,
    FragmentCount,
    FragmentIndex,
    ReassemblyError,
    ReassemblyStatus,
    Reassembler,
    ReplyKind,
    RequestId,
};

fn id(value: u32) -> RequestId { RequestId::new(value).expect("valid request id") }

fn first(request_id: u32, total: u16, payload: &str) -> FirstFragment {
    FirstFragment::new(
        id(request_id),
        FragmentCount::new(total).expect("valid total"),
        ReplyKind::Request,
        payload,
    )
}

fn rest(index: u16, payload: &str) -> ContinuationFragment {
    ContinuationFragment::new(FragmentIndex::new(index).expect("valid index"), payload)
}

fn index(value: u16) -> FragmentIndex { FragmentIndex::new(value).expect("valid index") }

#[fixture]
fn three_part() -> Reassembler {
    let mut reassembler = Reassembler::new();
    let status = reassembler.push_first(first(5, 3, "AAA"));
    assert!(matches!(
        status,
        ReassemblyStatus::Incomplete { received: 1, .. }
    ));
    reassembler
}

#[test]
fn single_fragment_completes_immediately() {
    let mut reassembler = Reassembler::new();
    let ReassemblyStatus::Complete { ack, message } = reassembler.push_first(first(1, 1, "hi"))
    else {
        panic!("expected completion");
    };
    assert_eq!(ack, FragmentIndex::zero());
    assert_eq!(message.request_id(), id(1));
    assert_eq!(message.payload(), "hi");
    assert!(!reassembler.is_active());
}

#[rstest]
fn in_order_fragments_reassemble(mut three_part: Reassembler) {
    assert_eq!(
        three_part
            .push_continuation(rest(1, "BBB"))
            .expect("accept fragment 1"),
        ReassemblyStatus::Incomplete {
            ack: index(1),
            received: 2,
            total: FragmentCount::new(3).expect("valid total"),
        }
    );
    let ReassemblyStatus::Complete { ack, message } = three_part
        .push_continuation(rest(2, "CC"))
        .expect("accept fragment 2")
    else {
        panic!("expected completion");
    };
    assert_eq!(ack, index(2));
    assert_eq!(message.into_payload(), "AAABBBCC");
    assert!(!three_part.is_active());
}

#[rstest]
fn fragment_ahead_of_window_is_dropped(mut three_part: Reassembler) {
    let err = three_part
        .push_continuation(rest(2, "CC"))
        .expect_err("fragment 2 before 1 must be refused");
    assert_eq!(
        err,
        ReassemblyError::IndexMismatch {
            request_id: id(5),
            expected: 1,
            found: index(2),
        }
    );
    assert_eq!(
        three_part.progress().map(|(received, _)| received),
        Some(1)
    );

    three_part
        .push_continuation(rest(1, "BBB"))
        .expect("fragment 1 still accepted");
    let ReassemblyStatus::Complete { message, .. } = three_part
        .push_continuation(rest(2, "CC"))
        .expect("fragment 2 accepted in order")
    else {
        panic!("expected completion");
    };
    assert_eq!(message.payload(), "AAABBBCC");
}

#[rstest]
fn duplicate_is_reacknowledged_without_appending(mut three_part: Reassembler) {
    three_part
        .push_continuation(rest(1, "BBB"))
        .expect("accept fragment 1");
    assert_eq!(
        three_part
            .push_continuation(rest(1, "BBB"))
            .expect("duplicate is not an error"),
        ReassemblyStatus::Duplicate { ack: index(1) }
    );
    let ReassemblyStatus::Complete { message, .. } = three_part
        .push_continuation(rest(2, "CC"))
        .expect("accept fragment 2")
    else {
        panic!("expected completion");
    };
    assert_eq!(message.payload(), "AAABBBCC");
}

#[test]
fn continuation_without_first_is_refused() {
    let mut reassembler = Reassembler::new();
    assert_eq!(
        reassembler.push_continuation(rest(1, "x")),
        Err(ReassemblyError::NoActiveAssembly { found: index(1) })
    );
}

#[rstest]
fn new_first_fragment_replaces_partial_assembly(mut three_part: Reassembler) {
    three_part
        .push_continuation(rest(1, "BBB"))
        .expect("accept fragment 1");
    let status = three_part.push_first(first(6, 2, "new"));
    assert!(matches!(status, ReassemblyStatus::Incomplete { received: 1, .. }));
    assert_eq!(three_part.request_id(), Some(id(6)));

    let ReassemblyStatus::Complete { message, .. } = three_part
        .push_continuation(rest(1, "er"))
        .expect("accept fragment 1 of new request")
    else {
        panic!("expected completion");
    };
    assert_eq!(message.request_id(), id(6));
    assert_eq!(message.payload(), "newer");
}

#[rstest]
fn reset_discards_the_buffer(mut three_part: Reassembler) {
    three_part.reset();
    assert!(!three_part.is_active());
    assert_eq!(three_part.progress(), None);
    assert!(three_part.push_continuation(rest(1, "BBB")).is_err());
}

#[rstest]
fn repeat_after_completion_is_reacknowledged(mut three_part: Reassembler) {
    three_part.push_continuation(rest(1, "BBB")).expect("accept fragment 1");
    three_part.push_continuation(rest(2, "CC")).expect("accept fragment 2");
    assert!(!three_part.is_active());
    assert_eq!(three_part.completed_request_id(), Some(id(5)));

    assert_eq!(
        three_part.push_continuation(rest(2, "CC")),
        Ok(ReassemblyStatus::Duplicate { ack: index(2) })
    );
    assert!(three_part.push_continuation(rest(3, "DD")).is_err());

    three_part.reset();
    assert_eq!(three_part.completed_request_id(), None);
    assert!(three_part.push_continuation(rest(2, "CC")).is_err());
}
