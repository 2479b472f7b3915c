//! Metric helpers for `textframe`.
//!
//! This module defines metric names and simple helper functions wrapping the
//! [`metrics`](https://docs.rs/metrics) crate. With the `metrics` feature
//! disabled every helper compiles to nothing.

#[cfg(feature = "metrics")]
use metrics::{counter, gauge};

/// Name of the gauge tracking active outbound transmissions.
pub const TRANSMISSIONS_ACTIVE: &str = "textframe_transmissions_active";
/// Name of the counter tracking fragments sent or received.
pub const FRAGMENTS_TOTAL: &str = "textframe_fragments_total";
/// Name of the counter tracking inbound messages dropped without effect.
pub const DROPPED_TOTAL: &str = "textframe_dropped_total";
/// Name of the counter tracking whole-request retransmissions.
pub const RETRANSMISSIONS_TOTAL: &str = "textframe_retransmissions_total";
/// Name of the counter tracking fragments resent after an acknowledgment
/// timeout.
pub const RESENDS_TOTAL: &str = "textframe_fragment_resends_total";
/// Name of the counter tracking acknowledgment and response timeouts.
pub const TIMEOUTS_TOTAL: &str = "textframe_timeouts_total";

/// Direction of fragment travel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Fragments received from the relay.
    Inbound,
    /// Fragments sent to the relay.
    Outbound,
}

impl Direction {
    /// Label value used for the `direction` label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Direction::Inbound => "inbound",
            Direction::Outbound => "outbound",
        }
    }
}

/// Increment the active transmissions gauge.
pub fn inc_transmissions() {
    #[cfg(feature = "metrics")]
    gauge!(TRANSMISSIONS_ACTIVE).increment(1.0);
}

/// Decrement the active transmissions gauge.
pub fn dec_transmissions() {
    #[cfg(feature = "metrics")]
    gauge!(TRANSMISSIONS_ACTIVE).decrement(1.0);
}

/// Record a fragment for the given direction.
pub fn inc_fragments(direction: Direction) {
    #[cfg(feature = "metrics")]
    counter!(FRAGMENTS_TOTAL, "direction" => direction.as_str()).increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = direction;
}

/// Record an inbound message dropped without effect.
pub fn inc_dropped() {
    #[cfg(feature = "metrics")]
    counter!(DROPPED_TOTAL).increment(1);
}

/// Record a whole-request retransmission.
pub fn inc_retransmissions() {
    #[cfg(feature = "metrics")]
    counter!(RETRANSMISSIONS_TOTAL).increment(1);
}

/// Record a fragment resent after an acknowledgment timeout.
pub fn inc_resends() {
    #[cfg(feature = "metrics")]
    counter!(RESENDS_TOTAL).increment(1);
}

/// Record a timeout.
pub fn inc_timeouts() {
    #[cfg(feature = "metrics")]
    counter!(TIMEOUTS_TOTAL).increment(1);
}
