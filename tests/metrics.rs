#![cfg(feature = "metrics")]
//! Tests for `textframe` metrics.
//!
//! Counters and gauges are observed through
//! `metrics_util::debugging::DebuggingRecorder` installed for the current
//! thread while a synchronous session runs.

mod common;

use common::{acknowledge_all, expire_all, feed, session};
use rstest::rstest;
use textframe::{TunnelConfig, metrics as names};
use textframe_testing::{
    metrics::{counter, debugging_recorder_setup, gauge, with_recorder},
    relay::{self, RELAY, test_key},
};

#[test]
fn fragment_metric_counts_each_direction() {
    let (snapshotter, recorder) = debugging_recorder_setup();
    with_recorder(&recorder, || {
        names::inc_fragments(names::Direction::Outbound);
        names::inc_fragments(names::Direction::Inbound);
        names::inc_fragments(names::Direction::Inbound);
    });

    assert_eq!(
        counter(&snapshotter, names::FRAGMENTS_TOTAL, &[("direction", "outbound")]),
        1
    );
    assert_eq!(
        counter(&snapshotter, names::FRAGMENTS_TOTAL, &[("direction", "inbound")]),
        2
    );
}

#[rstest]
#[case(1)]
#[case(3)]
fn dropped_metric_counts(#[case] expected: u64) {
    let (snapshotter, recorder) = debugging_recorder_setup();
    with_recorder(&recorder, || (0..expected).for_each(|_| names::inc_dropped()));
    assert_eq!(counter(&snapshotter, names::DROPPED_TOTAL, &[]), expected);
}

#[test]
fn completed_exchange_balances_the_gauge() {
    let (snapshotter, recorder) = debugging_recorder_setup();
    with_recorder(&recorder, || {
        let (mut session, _transport) = session(TunnelConfig::new(RELAY), 1);
        session
            .start_transmission(b"ping", test_key())
            .expect("start");
        assert_eq!(gauge(&snapshotter, names::TRANSMISSIONS_ACTIVE), Some(1.0));

        acknowledge_all(&mut session);
        feed(&mut session, relay::success(1, 200, "pong", &test_key()));
        feed(&mut session, ["not a tunnel message"]);
    });

    assert_eq!(gauge(&snapshotter, names::TRANSMISSIONS_ACTIVE), Some(0.0));
    assert_eq!(
        counter(&snapshotter, names::FRAGMENTS_TOTAL, &[("direction", "outbound")]),
        1
    );
    assert_eq!(
        counter(&snapshotter, names::FRAGMENTS_TOTAL, &[("direction", "inbound")]),
        1
    );
    assert_eq!(counter(&snapshotter, names::DROPPED_TOTAL, &[]), 1);
}

#[test]
fn timeouts_and_resends_are_counted() {
    let (snapshotter, recorder) = debugging_recorder_setup();
    with_recorder(&recorder, || {
        let (mut session, _transport) = session(TunnelConfig::new(RELAY), 1);
        session
            .start_transmission(b"ping", test_key())
            .expect("start");
        expire_all(&mut session);
    });

    assert_eq!(counter(&snapshotter, names::RESENDS_TOTAL, &[]), 2);
    assert_eq!(counter(&snapshotter, names::TIMEOUTS_TOTAL, &[]), 1);
    assert_eq!(gauge(&snapshotter, names::TRANSMISSIONS_ACTIVE), Some(0.0));
}

#[test]
fn mismatch_retransmission_is_counted() {
    let (snapshotter, recorder) = debugging_recorder_setup();
    with_recorder(&recorder, || {
        let (mut session, _transport) = session(TunnelConfig::new(RELAY), 1);
        session
            .start_transmission(b"ping", test_key())
            .expect("start");
        acknowledge_all(&mut session);
        feed(&mut session, relay::mismatch(1, 7, &test_key()));
    });

    assert_eq!(counter(&snapshotter, names::RETRANSMISSIONS_TOTAL, &[]), 1);
    assert_eq!(gauge(&snapshotter, names::TRANSMISSIONS_ACTIVE), Some(1.0));
}
