//! Crate-wide error taxonomy.
//!
//! Wire-level submodules (`rtp`, `rtcp`, `srtp`) keep their own narrow
//! decode/crypto-error enums for precise diagnostics; each converts into
//! `RtcError` via `From` at the boundary where a public, fallible operation
//! returns it.

use std::fmt;

use crate::rtcp::rtcp_error::RtcpError;
use crate::rtp::rtp_error::RtpError;
use crate::srtp::srtp_error::SrtpError;

/// Top-level error type returned by every public, fallible operation.
///
/// There is no `Ok`/success variant here: Rust's `Result<T, RtcError>`
/// already carries that case, so adding one would just be the source
/// language's taxonomy leaking through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RtcError {
    GenericError,
    InvalidValue,
    SendError,
    RecvError,
    MemoryError,
    PayloadTooBig,
    Timeout,
    AuthFailure,
    NotReady,
}

pub type Result<T> = std::result::Result<T, RtcError>;

impl fmt::Display for RtcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use RtcError::*;
        match self {
            GenericError => write!(f, "generic error"),
            InvalidValue => write!(f, "invalid value"),
            SendError => write!(f, "send error"),
            RecvError => write!(f, "recv error"),
            MemoryError => write!(f, "memory error (worker thread could not be spawned)"),
            PayloadTooBig => write!(f, "payload too big for the selected formatter"),
            Timeout => write!(f, "operation timed out"),
            AuthFailure => write!(f, "authentication failure (ZRTP)"),
            NotReady => write!(f, "not ready"),
        }
    }
}

impl std::error::Error for RtcError {}

impl From<RtpError> for RtcError {
    fn from(_: RtpError) -> Self {
        RtcError::InvalidValue
    }
}

impl From<RtcpError> for RtcError {
    fn from(_: RtcpError) -> Self {
        RtcError::InvalidValue
    }
}

impl From<SrtpError> for RtcError {
    fn from(e: SrtpError) -> Self {
        match e {
            SrtpError::AuthFailure { .. } | SrtpError::ReplayDetected { .. } => {
                RtcError::AuthFailure
            }
            SrtpError::TooShort | SrtpError::InvalidKeyLength => RtcError::InvalidValue,
        }
    }
}

impl From<std::io::Error> for RtcError {
    fn from(e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut => RtcError::Timeout,
            _ => RtcError::SendError,
        }
    }
}
