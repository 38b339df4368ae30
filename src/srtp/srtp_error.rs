use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SrtpError {
    TooShort,
    InvalidKeyLength,
    ReplayDetected { ssrc: u32, seq: u16 },
    AuthFailure { ssrc: u32, seq: u16 },
}

impl fmt::Display for SrtpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use SrtpError::*;
        match self {
            TooShort => write!(f, "packet too short for SRTP"),
            InvalidKeyLength => write!(f, "derived session key has an invalid length"),
            ReplayDetected { ssrc, seq } => {
                write!(f, "replay detected: ssrc={ssrc:#x} seq={seq}")
            }
            AuthFailure { ssrc, seq } => {
                write!(f, "auth tag mismatch: ssrc={ssrc:#x} seq={seq}")
            }
        }
    }
}

impl std::error::Error for SrtpError {}
