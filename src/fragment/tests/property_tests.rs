//! Generated checks for fragmentation and reassembly.

use std::num::NonZeroUsize;

use proptest::{
    prelude::{Just, Strategy, any, prop_oneof},
    prop_assert,
    prop_assert_eq,
    test_runner::{Config as ProptestConfig, RngAlgorithm, TestCaseError, TestRng, TestRunner},
};
use rstest::rstest;

use crate::fragment::{
    Classified,
    Fragmenter,
    ReassemblyStatus,
    Reassembler,
    ReplyKind,
    RequestId,
    classify,
};

fn deterministic_runner(cases: u32) -> TestRunner {
    let config = ProptestConfig {
        cases,
        ..ProptestConfig::default()
    };
    let rng = TestRng::deterministic_rng(RngAlgorithm::ChaCha);
    TestRunner::new_with_rng(config, rng)
}

fn kind_strategy() -> impl Strategy<Value = ReplyKind> {
    prop_oneof![
        Just(ReplyKind::Request),
        Just(ReplyKind::Success),
        (0u16..=999, any::<bool>())
            .prop_map(|(status, encrypted)| ReplyKind::Error { status, encrypted }),
    ]
}

// Lowercase only: a lone `ACK` payload would render as an acknowledgment.
const PAYLOAD_PATTERN: &str = "[a-z0-9+/=]{1,1500}";

fn fragmenter(packet_size: usize) -> Result<Fragmenter, TestCaseError> {
    let size = NonZeroUsize::new(packet_size)
        .ok_or_else(|| TestCaseError::fail("zero packet size".to_owned()))?;
    Fragmenter::new(size).map_err(|err| TestCaseError::fail(format!("fragmenter: {err}")))
}

#[rstest]
#[case(64)]
#[case(160)]
fn generated_payloads_survive_the_wire(#[case] cases: u32) {
    let mut runner = deterministic_runner(cases);
    let strategy = (
        PAYLOAD_PATTERN,
        45usize..=400,
        0u32..=RequestId::MAX.get(),
        kind_strategy(),
    );

    runner
        .run(&strategy, |(payload, packet_size, raw_id, kind)| {
            let fragmenter = fragmenter(packet_size)?;
            let request_id = RequestId::new(raw_id)
                .map_err(|err| TestCaseError::fail(format!("request id: {err}")))?;
            let batch = fragmenter
                .fragment_as(&payload, request_id, kind)
                .map_err(|err| TestCaseError::fail(format!("fragment failed: {err}")))?;

            prop_assert_eq!(
                batch.len(),
                fragmenter.fragment_count(payload.len(), kind)
            );

            let mut reassembler = Reassembler::new();
            let mut completed = None;
            for (position, wire) in batch.to_wire().into_iter().enumerate() {
                prop_assert!(wire.len() <= packet_size);
                let status = match classify(&wire) {
                    Classified::FirstFragment(first) => {
                        prop_assert_eq!(position, 0);
                        reassembler.push_first(first)
                    }
                    Classified::ContinuationFragment(rest) => reassembler
                        .push_continuation(rest)
                        .map_err(|err| TestCaseError::fail(format!("reassembly: {err}")))?,
                    other => {
                        return Err(TestCaseError::fail(format!("misclassified: {other:?}")));
                    }
                };
                if let ReassemblyStatus::Complete { message, .. } = status {
                    completed = Some(message);
                }
            }

            let message =
                completed.ok_or_else(|| TestCaseError::fail("never completed".to_owned()))?;
            prop_assert_eq!(message.request_id(), request_id);
            prop_assert_eq!(message.kind(), kind);
            prop_assert_eq!(message.payload(), payload.as_str());
            Ok(())
        })
        .expect("generated payloads should reassemble");
}
