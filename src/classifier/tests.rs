//! Unit tests for outer and inner error classification.

use rstest::{fixture, rstest};
use serde_json::json;

use super::{
    ClassifyError,
    DecryptedResponse,
    ErrorClassifier,
    OuterStatus,
    REQUEST_NUMBER_MISMATCH,
    UNKNOWN_ERROR,
    is_error_code,
};
use crate::{
    codec::{PayloadCodec, TunnelKey},
    fragment::{ReplyKind, RequestId},
    sequencer::{MemoryCounterStore, RequestSequencer},
};

#[fixture]
fn key() -> TunnelKey { TunnelKey::from([9u8; 32]) }

fn classifier() -> ErrorClassifier { ErrorClassifier::default() }

#[fixture]
fn store() -> MemoryCounterStore { MemoryCounterStore::with_value(40) }

fn seal(value: &serde_json::Value, key: &TunnelKey) -> String {
    PayloadCodec::new()
        .encode(value.to_string().as_bytes(), key)
        .expect("encode body")
}

fn mismatch_body(expected: u32, key: &TunnelKey) -> String {
    let inner = json!({
        "message": "Request number mismatch",
        "expectedRequestNumber": expected,
    });
    seal(
        &json!({ "code": 425, "body": inner.to_string() }),
        key,
    )
}

#[rstest]
#[case(399, false)]
#[case(400, true)]
#[case(425, true)]
#[case(500, true)]
#[case(200, false)]
fn error_codes_start_at_400(#[case] code: u16, #[case] expected: bool) {
    assert_eq!(is_error_code(code), expected);
}

#[test]
fn outer_status_encryption_follows_code_and_marker() {
    assert!(OuterStatus::new(REQUEST_NUMBER_MISMATCH).is_encrypted());
    assert!(!OuterStatus::new(400).is_encrypted());
    let marked = OuterStatus::from_reply(ReplyKind::Error {
        status: 401,
        encrypted: true,
    })
    .expect("error reply");
    assert!(marked.is_encrypted());
    assert_eq!(OuterStatus::from_reply(ReplyKind::Success), None);
}

#[rstest]
fn plaintext_outer_error_returns_body(key: TunnelKey, store: MemoryCounterStore) {
    let mut sequencer = RequestSequencer::open(store.clone()).expect("open");
    let outcome = classifier()
        .handle_outer(OuterStatus::new(400), "Mock error message", &key, &mut sequencer)
        .expect("classify");
    assert_eq!(outcome.message, "Mock error message");
    assert_eq!(outcome.code, 400);
    assert!(!outcome.retransmit);
    assert_eq!(store.value(), Some(40));
}

#[rstest]
fn mismatch_resyncs_and_requests_retransmission(key: TunnelKey, store: MemoryCounterStore) {
    let mut sequencer = RequestSequencer::open(store.clone()).expect("open");
    let outcome = classifier()
        .handle_outer(
            OuterStatus::new(REQUEST_NUMBER_MISMATCH),
            &mismatch_body(7, &key),
            &key,
            &mut sequencer,
        )
        .expect("classify");

    assert_eq!(outcome.message, "Request number mismatch");
    assert!(outcome.retransmit);
    assert_eq!(outcome.resync, Some(RequestId::new(7).expect("valid id")));
    assert_eq!(store.value(), Some(7));
    assert_eq!(sequencer.next().expect("next").get(), 7);
}

#[rstest]
fn inline_object_body_is_accepted(key: TunnelKey, store: MemoryCounterStore) {
    let mut sequencer = RequestSequencer::open(store).expect("open");
    let body = seal(
        &json!({
            "code": 425,
            "body": { "message": "mismatch", "expectedRequestNumber": 3 }
        }),
        &key,
    );
    let outcome = classifier()
        .handle_outer(OuterStatus::new(425), &body, &key, &mut sequencer)
        .expect("classify");
    assert_eq!(outcome.resync.map(RequestId::get), Some(3));
}

#[rstest]
fn encrypted_error_without_expected_number_is_terminal(
    key: TunnelKey,
    store: MemoryCounterStore,
) {
    let mut sequencer = RequestSequencer::open(store.clone()).expect("open");
    let body = seal(
        &json!({ "code": 403, "body": json!({ "message": "forbidden" }).to_string() }),
        &key,
    );
    let status = OuterStatus::from_reply(ReplyKind::Error {
        status: 403,
        encrypted: true,
    })
    .expect("error reply");
    let outcome = classifier()
        .handle_outer(status, &body, &key, &mut sequencer)
        .expect("classify");
    assert_eq!(outcome.message, "forbidden");
    assert!(!outcome.retransmit);
    assert_eq!(store.value(), Some(40));
}

#[rstest]
fn undecodable_encrypted_body_is_an_error(key: TunnelKey, store: MemoryCounterStore) {
    let mut sequencer = RequestSequencer::open(store).expect("open");
    let result = classifier().handle_outer(
        OuterStatus::new(425),
        "garbage",
        &key,
        &mut sequencer,
    );
    assert!(matches!(result, Err(ClassifyError::Codec(_))));
}

#[rstest]
#[case(r#"{ "description": "Mock error message" }"#, "Mock error message")]
#[case("{}", UNKNOWN_ERROR)]
#[case("not json", UNKNOWN_ERROR)]
fn inner_error_uses_description(#[case] body: &str, #[case] expected: &str) {
    let response = DecryptedResponse::new(401, body);
    assert_eq!(classifier().handle_inner(&response), expected);
}

#[rstest]
fn decode_response_reads_code_and_body(key: TunnelKey) {
    let text = seal(&json!({ "code": 200, "body": "{\"ok\":true}" }), &key);
    let response = classifier()
        .decode_response(&text, &key)
        .expect("decode");
    assert_eq!(response.code, 200);
    assert_eq!(response.body_text(), "{\"ok\":true}");
}

#[test]
fn response_without_code_is_malformed() {
    assert!(matches!(
        DecryptedResponse::parse(r#"{ "body": "x" }"#),
        Err(ClassifyError::Json(_))
    ));
}
