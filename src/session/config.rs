use crate::rtp::config::DEFAULT_FRAGMENT_PAYLOAD_CEILING;

/// Static per-stream config for a `Sender`, set once at construction (spec §4.2).
#[derive(Debug, Clone)]
pub struct SenderConfig {
    pub local_ssrc: u32,
    pub payload_type: u8,
    /// RTP timestamp units added per `push_frame` call absent an explicit
    /// override flag (e.g. 90000/fps for a 90 kHz video clock).
    pub timestamp_increment: u32,
    pub ceiling: usize,
    pub use_fragmenting_formatter: bool,
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            local_ssrc: 0,
            payload_type: 96,
            timestamp_increment: 3000,
            ceiling: DEFAULT_FRAGMENT_PAYLOAD_CEILING,
            use_fragmenting_formatter: false,
        }
    }
}

/// Static per-stream config for a `Receiver` (spec §4.3).
#[derive(Debug, Clone)]
pub struct ReceiverConfig {
    pub expected_ssrc: Option<u32>,
    pub reorder_window: u16,
    pub max_queued_frames: usize,
    pub use_fragmenting_formatter: bool,
    /// Sampling clock rate used to scale wall-clock arrival time into RTP
    /// timestamp units for jitter (RFC 3550 Appendix A.8).
    pub clock_rate_hz: u32,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            expected_ssrc: None,
            reorder_window: crate::rtp::config::DEFAULT_REORDER_WINDOW,
            max_queued_frames: 256,
            use_fragmenting_formatter: false,
            clock_rate_hz: crate::rtp::config::DEFAULT_CLOCK_RATE_HZ,
        }
    }
}
