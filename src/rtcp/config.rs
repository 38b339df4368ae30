/// RTCP version, always matches the RTP version it accompanies (RFC 3550 §6.1).
pub const RTCP_VERSION: u8 = 2;

/// RFC 3550 §6.2: minimum interval between reports, 2.5s during the first
/// interval of a session, 5s afterwards.
pub const RTCP_MIN_INTERVAL_SECS: f64 = 5.0;
pub const RTCP_MIN_INITIAL_INTERVAL_SECS: f64 = 2.5;

/// Divisor from RFC 3550 §6.3.1 that converts the average reporting interval
/// into the randomized interval actually scheduled (e^-1.5 correction).
pub const RTCP_COMPENSATION: f64 = 1.21828;

/// Fraction of session bandwidth allotted to RTCP traffic (RFC 3550 §6.2).
pub const DEFAULT_RTCP_BANDWIDTH_FRACTION: f64 = 0.05;

/// Fraction of RTCP bandwidth reserved for senders before the 25% rule
/// referenced in RFC 3550 §6.3.2 kicks in.
pub const SENDER_BANDWIDTH_FRACTION: f64 = 0.25;

/// Assumed total session bandwidth (bits/sec) used to turn
/// `rtcp-bandwidth-fraction` into the bytes/sec `RtcpRunner` needs, absent
/// any explicit bandwidth signaled elsewhere in this crate's configuration
/// surface. Matches a narrowband voice codec's typical bitrate.
pub const DEFAULT_SESSION_BANDWIDTH_BPS: f64 = 64_000.0;
