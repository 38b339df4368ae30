/// RTP version this crate produces and accepts (RFC 3550 §5.1).
pub const RTP_VERSION: u8 = 2;

pub const DEFAULT_FRAGMENT_PAYLOAD_CEILING: usize = 1400;

pub const DEFAULT_REORDER_WINDOW: u16 = 128;

/// Sampling clock rate assumed for scaling wall-clock arrival time into RTP
/// timestamp units (RFC 3550 Appendix A.8's jitter transit calculation)
/// absent a per-stream override. 90 kHz matches the common video clock;
/// callers on an 8 kHz audio clock should set `clock_rate_hz` explicitly.
pub const DEFAULT_CLOCK_RATE_HZ: u32 = 90_000;
