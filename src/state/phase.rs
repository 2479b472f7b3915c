//! Transmission phases and the observable snapshot.

use derive_more::Display;

/// Phase of the current transmission.
///
/// ```text
/// GettingReadyToSend -> SendingToRelayServer -> WaitingForServerResponse
///     -> ReceivingServerResponse -> WaitingForUserResponse | Retransmission
/// ```
///
/// `Retransmission` loops back to `GettingReadyToSend`. `TimeOut` and
/// `Exception` may be entered from any active phase; `Done` follows once the
/// caller has consumed the final result.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Display)]
pub enum TransmissionPhase {
    /// A request is being encoded and fragmented.
    GettingReadyToSend,
    /// Fragments are being delivered to the relay.
    SendingToRelayServer,
    /// Every fragment was acknowledged; waiting for the reply.
    WaitingForServerResponse,
    /// Reply fragments are arriving.
    ReceivingServerResponse,
    /// A final result is available to the caller.
    WaitingForUserResponse,
    /// The relay asked for the request to be sent again.
    Retransmission,
    /// Idle: nothing in flight and no result pending.
    #[default]
    Done,
    /// The relay stopped answering.
    TimeOut,
    /// The transmission failed locally.
    Exception,
}

impl TransmissionPhase {
    /// Whether no further protocol activity will happen without a new
    /// command.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::WaitingForUserResponse | Self::Done | Self::TimeOut | Self::Exception
        )
    }

    /// Whether a transmission is in progress.
    #[must_use]
    pub const fn is_active(self) -> bool { !self.is_terminal() }
}

/// Snapshot of the tracker published to observers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransmissionState {
    /// Current phase.
    pub phase: TransmissionPhase,
    /// Message of the last error, if any.
    pub last_error_message: Option<String>,
    /// Status code of the last result, if any.
    pub last_status_code: Option<u16>,
    /// Retransmissions performed for the current request.
    pub retransmit_attempts: u32,
    /// Fragments of the current request sent so far.
    pub fragments_sent: usize,
    /// Fragments the current request consists of.
    pub fragments_to_send: usize,
    /// Reply fragments received so far.
    pub fragments_received: usize,
    /// Reply fragments announced by the relay.
    pub fragments_to_receive: usize,
    /// Decrypted body of the last successful reply.
    pub response_body: Option<String>,
}
