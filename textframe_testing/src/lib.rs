//! Utilities for exercising a `textframe` tunnel session in tests.
//!
//! [`RecordingTransport`] stands in for the text messaging channel, the
//! [`relay`] module plays the relay server and [`logger`] captures log
//! output.
//!
//! ```rust
//! use textframe::{MemoryCounterStore, RequestSequencer, TunnelConfig, TunnelSession};
//! use textframe_testing::{RecordingTransport, relay};
//!
//! let transport = RecordingTransport::new();
//! let sequencer = RequestSequencer::open(MemoryCounterStore::with_value(7)).unwrap();
//! let mut session =
//!     TunnelSession::new(TunnelConfig::new(relay::RELAY), transport.clone(), sequencer).unwrap();
//! session.start_transmission(b"ping", relay::test_key()).unwrap();
//! assert_eq!(transport.len(), 1);
//! ```

pub mod logging;
pub mod metrics;
pub mod relay;
pub mod transport;

pub use logging::{LoggerHandle, logger};
pub use transport::{RecordingTransport, SentText};
