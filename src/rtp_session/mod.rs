//! Per-source RTP statistics tracking shared by the RTCP side of
//! `crate::session`: sequence/jitter bookkeeping (`rx_tracker`), sender/RTT
//! bookkeeping (`tx_tracker`), and the wrapping sequence-number arithmetic
//! (`seq_ext`) both build on.

pub mod rx_tracker;
pub mod rx_tracker_error;
pub mod seq_ext;
pub mod tx_tracker;
