//! Per-stream send/receive worker threads, built on `crate::socket` and
//! `crate::payload`.

pub mod config;
pub mod receiver;
pub mod rtcp_worker;
pub mod sender;

pub use config::{ReceiverConfig, SenderConfig};
pub use receiver::Receiver;
pub use rtcp_worker::{RtcpHandle, RtcpWorker};
pub use sender::Sender;
