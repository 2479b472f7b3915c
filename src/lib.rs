#![doc(html_root_url = "https://docs.rs/textframe/latest")]
//! Public API for the `textframe` library.
//!
//! This crate tunnels encrypted request/response exchanges over a text
//! messaging channel with a small per-message size limit. Requests are
//! compressed, encrypted and armoured, split into numbered fragments and
//! delivered stop-and-wait to a relay server; replies are reassembled,
//! acknowledged and classified into results or errors.
//!
//! ```
//! use textframe::{MemoryCounterStore, RequestSequencer, TunnelConfig, TunnelKey, TunnelSession};
//! # use textframe::transport::{Address, TextTransport, TransportError};
//! # #[derive(Default)]
//! # struct Modem(Vec<String>);
//! # impl TextTransport for Modem {
//! #     fn send_text(&mut self, _to: &Address, text: &str) -> Result<(), TransportError> {
//! #         self.0.push(text.to_owned());
//! #         Ok(())
//! #     }
//! # }
//!
//! let sequencer = RequestSequencer::open(MemoryCounterStore::new()).expect("open counter");
//! let mut session = TunnelSession::new(TunnelConfig::new("+15550100"), Modem::default(), sequencer)
//!     .expect("valid configuration");
//!
//! let id = session
//!     .start_transmission(b"{\"action\":\"balance\"}", TunnelKey::from([7u8; 32]))
//!     .expect("first fragment sent");
//! assert_eq!(id.get(), 0);
//! assert!(session.transport().0[0].starts_with("01-CRADLE-000000-"));
//! ```

pub mod assembler;
pub mod classifier;
pub mod codec;
pub mod config;
pub mod error;
pub mod fragment;
pub mod metrics;
pub mod sequencer;
pub mod session;
pub mod state;
pub mod transmitter;
pub mod transport;

pub use assembler::{InboundAssembler, InboundEvent};
pub use classifier::{ErrorClassifier, OuterError, OuterStatus, REQUEST_NUMBER_MISMATCH};
pub use codec::{PayloadCodec, TunnelKey};
pub use config::TunnelConfig;
pub use error::{Result, TunnelError};
pub use fragment::{
    Acknowledgment,
    Classified,
    FragmentBatch,
    FragmentCount,
    FragmentIndex,
    Fragmenter,
    ReassembledMessage,
    Reassembler,
    ReplyKind,
    RequestId,
    classify,
};
pub use metrics::Direction;
pub use sequencer::{CounterStore, FileCounterStore, MemoryCounterStore, RequestSequencer};
pub use session::{TimerKind, TunnelActor, TunnelHandle, TunnelSession};
pub use state::{TransmissionPhase, TransmissionState, TransmissionTracker};
pub use transmitter::{Delivery, OutboundTransmitter};
pub use transport::{Address, InboundMessage, TextTransport};
