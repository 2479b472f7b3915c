//! Builders for the messages a relay server sends back.
//!
//! Tests play the relay: they acknowledge request fragments and answer with
//! encrypted success or error replies built here.

use serde_json::json;
use textframe::{
    Fragmenter,
    PayloadCodec,
    ReplyKind,
    RequestId,
    TunnelKey,
    classifier::REQUEST_NUMBER_MISMATCH,
};

/// Address the test relay sends from.
pub const RELAY: &str = "+15550100";

/// Key shared by the tests and the simulated relay.
#[must_use]
pub fn test_key() -> TunnelKey { TunnelKey::from([0x5a; 32]) }

/// Acknowledgment text for fragment `index` of request `request_id`.
#[must_use]
pub fn ack(request_id: u32, index: u16) -> String {
    format!("01-CRADLE-{request_id:06}-{index:03}-ACK")
}

/// Encode `value` as JSON under `key`.
///
/// # Panics
///
/// Panics if encoding fails.
#[must_use]
pub fn seal(value: &serde_json::Value, key: &TunnelKey) -> String {
    PayloadCodec::new()
        .encode(value.to_string().as_bytes(), key)
        .expect("encode relay body")
}

/// Split a relay reply into wire fragments.
///
/// # Panics
///
/// Panics if `request_id` or `kind` cannot be framed.
#[must_use]
pub fn reply_wire(request_id: u32, kind: ReplyKind, body: &str) -> Vec<String> {
    Fragmenter::default()
        .fragment_as(
            body,
            RequestId::new(request_id).expect("request id in range"),
            kind,
        )
        .expect("fragment relay reply")
        .to_wire()
}

/// Wire fragments of a successful reply carrying `body` with status `code`.
#[must_use]
pub fn success(request_id: u32, code: u16, body: &str, key: &TunnelKey) -> Vec<String> {
    let sealed = seal(&json!({ "code": code, "body": body }), key);
    reply_wire(request_id, ReplyKind::Success, &sealed)
}

/// Wire fragments of a reply reporting an inner error.
#[must_use]
pub fn inner_error(
    request_id: u32,
    code: u16,
    description: Option<&str>,
    key: &TunnelKey,
) -> Vec<String> {
    let body = description.map_or_else(
        || json!({}).to_string(),
        |text| json!({ "description": text }).to_string(),
    );
    success(request_id, code, &body, key)
}

/// Wire fragments of a request number mismatch expecting `expected`.
#[must_use]
pub fn mismatch(request_id: u32, expected: u32, key: &TunnelKey) -> Vec<String> {
    let record = json!({
        "message": "Request number mismatch",
        "expectedRequestNumber": expected,
    });
    let sealed = seal(
        &json!({ "code": REQUEST_NUMBER_MISMATCH, "body": record.to_string() }),
        key,
    );
    reply_wire(
        request_id,
        ReplyKind::Error {
            status: REQUEST_NUMBER_MISMATCH,
            encrypted: true,
        },
        &sealed,
    )
}

/// Wire fragments of an outer error with a plaintext body.
#[must_use]
pub fn plain_error(request_id: u32, status: u16, message: &str) -> Vec<String> {
    reply_wire(
        request_id,
        ReplyKind::Error {
            status,
            encrypted: false,
        },
        message,
    )
}

/// Request identifier carried by a first-fragment header.
#[must_use]
pub fn request_id_of(first_fragment: &str) -> Option<u32> {
    first_fragment.get(10..16).and_then(|digits| digits.parse().ok())
}
