//! Tunnel configuration.
//!
//! [`TunnelConfig`] gathers the knobs of a tunnel session. Values are plain
//! public fields with chained setters; [`TunnelConfig::normalized`] clamps
//! them into a usable range before a session is built.

use std::{num::NonZeroUsize, time::Duration};

use crate::{
    fragment::{DEFAULT_PACKET_SIZE, FragmentationError, Fragmenter, ReplyKind},
    transport::Address,
};

/// Shortest acknowledgment timeout accepted by [`TunnelConfig::normalized`].
pub const MIN_ACK_TIMEOUT: Duration = Duration::from_millis(10);

/// Configuration for a tunnel session.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use textframe::TunnelConfig;
///
/// let config = TunnelConfig::new("+15550100")
///     .packet_size(160)
///     .ack_timeout(Duration::from_secs(5))
///     .max_transmission_attempts(2);
///
/// assert_eq!(config.packet_size, 160);
/// assert_eq!(config.relay.as_str(), "+15550100");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TunnelConfig {
    /// Address of the relay server. Messages from any other sender are
    /// ignored.
    pub relay: Address,

    /// Maximum length of one wire message in characters.
    ///
    /// Default: 306.
    pub packet_size: usize,

    /// Time to wait for an acknowledgment before resending the in-flight
    /// fragment. The n-th wait lasts `ack_timeout * n`.
    ///
    /// Default: 10 seconds.
    pub ack_timeout: Duration,

    /// How many times the in-flight fragment is resent before the
    /// transmission times out.
    ///
    /// Default: 2.
    pub max_fragment_resends: u32,

    /// Time to wait for the relay's reply once every fragment is
    /// acknowledged, and between reply fragments.
    ///
    /// Default: 120 seconds.
    pub response_timeout: Duration,

    /// Transmission attempts allowed per request when the relay reports a
    /// request number mismatch, the first attempt included.
    ///
    /// Default: 3.
    pub max_transmission_attempts: u32,
}

impl Default for TunnelConfig {
    fn default() -> Self {
        Self {
            relay: Address::default(),
            packet_size: DEFAULT_PACKET_SIZE,
            ack_timeout: Duration::from_secs(10),
            max_fragment_resends: 2,
            response_timeout: Duration::from_secs(120),
            max_transmission_attempts: 3,
        }
    }
}

impl TunnelConfig {
    /// Default configuration talking to `relay`.
    #[must_use]
    pub fn new(relay: impl Into<Address>) -> Self { Self::default().relay(relay) }

    /// Set the relay address.
    #[must_use]
    pub fn relay(mut self, relay: impl Into<Address>) -> Self {
        self.relay = relay.into();
        self
    }

    /// Set the packet size in characters.
    #[must_use]
    pub fn packet_size(mut self, size: usize) -> Self {
        self.packet_size = size;
        self
    }

    /// Set the base acknowledgment timeout.
    #[must_use]
    pub fn ack_timeout(mut self, timeout: Duration) -> Self {
        self.ack_timeout = timeout;
        self
    }

    /// Set how many times a fragment is resent before timing out.
    #[must_use]
    pub fn max_fragment_resends(mut self, count: u32) -> Self {
        self.max_fragment_resends = count;
        self
    }

    /// Set the reply timeout.
    #[must_use]
    pub fn response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = timeout;
        self
    }

    /// Set the number of transmission attempts per request.
    #[must_use]
    pub fn max_transmission_attempts(mut self, attempts: u32) -> Self {
        self.max_transmission_attempts = attempts;
        self
    }

    /// Smallest packet size that still carries payload behind every header
    /// kind.
    #[must_use]
    pub const fn min_packet_size() -> usize {
        ReplyKind::Error {
            status: 0,
            encrypted: true,
        }
        .first_header_len()
            + 1
    }

    /// Clamp every value into its usable range.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.packet_size = self.packet_size.max(Self::min_packet_size());
        self.ack_timeout = self.ack_timeout.max(MIN_ACK_TIMEOUT);
        self.response_timeout = self.response_timeout.max(self.ack_timeout);
        self.max_transmission_attempts = self.max_transmission_attempts.max(1);
        self
    }

    /// Acknowledgment deadline for the given zero-based attempt.
    #[must_use]
    pub fn ack_deadline(&self, attempt: u32) -> Duration {
        self.ack_timeout.saturating_mul(attempt.saturating_add(1))
    }

    /// Build the fragmenter for the configured packet size.
    ///
    /// # Errors
    ///
    /// Returns [`FragmentationError::PacketTooSmall`] when the packet size
    /// cannot carry a header and payload.
    pub fn fragmenter(&self) -> Result<Fragmenter, FragmentationError> {
        let size = NonZeroUsize::new(self.packet_size).ok_or(
            FragmentationError::PacketTooSmall {
                packet_size: 0,
                header_len: Self::min_packet_size() - 1,
            },
        )?;
        Fragmenter::new(size)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rstest::rstest;

    use super::TunnelConfig;

    #[test]
    fn defaults_match_the_relay_protocol() {
        let config = TunnelConfig::new("relay");
        assert_eq!(config.packet_size, 306);
        assert_eq!(config.ack_timeout, Duration::from_secs(10));
        assert_eq!(config.max_fragment_resends, 2);
        assert_eq!(config.max_transmission_attempts, 3);
        assert!(config.fragmenter().is_ok());
    }

    #[rstest]
    #[case(0, 45)]
    #[case(44, 45)]
    #[case(45, 45)]
    #[case(500, 500)]
    fn normalization_clamps_packet_size(#[case] requested: usize, #[case] expected: usize) {
        let config = TunnelConfig::new("relay").packet_size(requested).normalized();
        assert_eq!(config.packet_size, expected);
        assert!(config.fragmenter().is_ok());
    }

    #[test]
    fn normalization_keeps_at_least_one_attempt() {
        let config = TunnelConfig::new("relay")
            .max_transmission_attempts(0)
            .ack_timeout(Duration::ZERO)
            .normalized();
        assert_eq!(config.max_transmission_attempts, 1);
        assert!(config.ack_timeout > Duration::ZERO);
    }

    #[test]
    fn unnormalized_tiny_packet_is_refused() {
        assert!(TunnelConfig::new("relay").packet_size(20).fragmenter().is_err());
    }

    #[rstest]
    #[case(0, 10)]
    #[case(1, 20)]
    #[case(2, 30)]
    fn ack_deadline_scales_with_attempt(#[case] attempt: u32, #[case] seconds: u64) {
        assert_eq!(
            TunnelConfig::default().ack_deadline(attempt),
            Duration::from_secs(seconds)
        );
    }
}
