//! ZRTP (RFC 6189): media-path key agreement negotiating a shared `s0`
//! used to export SRTP master keys, without relying on a signaling-path
//! key exchange.

pub mod algorithms;
pub mod crc;
pub mod hash_chain;
pub mod messages;
pub mod retransmit;
pub mod session;
pub mod zrtp_error;

pub use messages::ZrtpMessage;
pub use retransmit::{RetransmitPolicy, RetransmitTimer};
pub use session::{ZrtpRole, ZrtpSession, ZrtpState};
pub use zrtp_error::ZrtpError;
