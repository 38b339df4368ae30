use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ZrtpError {
    TooShort,
    BadCrc,
    UnknownMessageType([u8; 8]),
    UnexpectedMessage,
    NoCommonAlgorithm,
    MacMismatch,
    Timeout,
}

impl fmt::Display for ZrtpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use ZrtpError::*;
        match self {
            TooShort => write!(f, "zrtp message too short"),
            BadCrc => write!(f, "zrtp message failed crc check"),
            UnknownMessageType(tag) => write!(
                f,
                "unknown zrtp message type {:?}",
                String::from_utf8_lossy(tag)
            ),
            UnexpectedMessage => write!(f, "zrtp message not valid in current state"),
            NoCommonAlgorithm => write!(f, "no common algorithm with peer"),
            MacMismatch => write!(f, "confirm mac verification failed"),
            Timeout => write!(f, "zrtp phase timed out"),
        }
    }
}

impl std::error::Error for ZrtpError {}
