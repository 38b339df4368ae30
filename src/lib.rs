//! An RTP/RTCP media transport stack for local-network real-time audio and
//! video, with ZRTP key agreement and SRTP encryption above the wire.
//!
//! `Context` issues `Session`s; each `Session` holds one or more
//! `MediaStream`s, and each `MediaStream` owns a `Sender`/`Receiver` pair
//! plus an RTCP worker over `crate::socket`'s UDP wrapper.

/// `Context`/`Session`: the top-level factory issuing SSRC-identified sessions.
pub mod context;
/// Runtime configuration surface (`ContextConfig`, numeric/bool flag parsing).
pub mod config;
/// Crate-wide error type shared across the RTP/RTCP/SRTP/socket/session stack.
pub mod error;
/// Logging utilities for the application.
pub mod log;
/// Composes a socket, sender, receiver and optional RTCP worker into one stream.
pub mod media_stream;
/// Frame packetization and reassembly formatters sitting above raw RTP packets.
pub mod payload;
/// RTCP (RTP Control Protocol) packet parsing, building and scheduling.
pub mod rtcp;
/// RTP (Real-time Transport Protocol) packet parsing and building.
pub mod rtp;
/// Per-source RTP statistics tracking (jitter, sequence, RTT) feeding RTCP.
pub mod rtp_session;
/// Sender/Receiver/RTCP worker threads built on `socket` and `payload`.
pub mod session;
/// UDP socket wrapper used by `session`'s worker threads.
pub mod socket;
/// SRTP (Secure Real-time Transport Protocol) implementation.
pub mod srtp;
/// ZRTP media-path key agreement (RFC 6189).
pub mod zrtp;
