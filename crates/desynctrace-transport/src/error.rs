use std::time::Duration;

use desynctrace_protocol::ProbeError;
use thiserror::Error;

/// Transport-level error taxonomy. Callers always receive this alongside the
/// wall-clock duration the attempt took (see [`crate::Outcome`]); the
/// duration is what lets the blind detector tell "fatal after 3ms" apart from
/// "timed out after 4.2s".
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid target url: {0}")]
    InvalidUrl(String),

    #[error("connect failed: {0}")]
    Connect(#[from] std::io::Error),

    #[error("tls handshake failed: {0}")]
    Tls(String),

    #[error("deadline of {0:?} exceeded")]
    Timeout(Duration),

    #[error("server sent GOAWAY")]
    GoAway,

    #[error("server reset stream")]
    StreamReset,

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("unsupported proxy scheme: {0}")]
    UnsupportedProxyScheme(String),

    #[error("scan cancelled")]
    Cancelled,
}

impl TransportError {
    /// Folds this error into the shared [`ProbeError`] taxonomy the
    /// detectors work with.
    pub fn into_probe_error(self) -> ProbeError {
        match self {
            TransportError::Timeout(d) => ProbeError::TransportTimeout(d),
            TransportError::GoAway | TransportError::StreamReset | TransportError::Malformed(_) => {
                ProbeError::ProtocolReset(self.to_string())
            }
            other => ProbeError::TransportFatal(other.to_string()),
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::Timeout(_))
    }
}
