//! Runtime configuration surface for a `Context` (spec §6).
//!
//! Not a file-format loader — the teacher's INI-style `Config` served its
//! signaling/ICE layers a config *file*; this crate's configuration surface
//! is a runtime API (`configure_ctx`), so it's a typed record plus a small
//! hand-rolled flag table, in the same no-`serde` spirit as the teacher's
//! own config style.

use crate::error::RtcError;
use crate::rtp::config::DEFAULT_REORDER_WINDOW;
use crate::rtcp::config::DEFAULT_RTCP_BANDWIDTH_FRACTION;

/// Numeric flags recognized by `configure_ctx(flag, value)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericFlag {
    ReorderWindowSize,
    ReassemblyTimeoutMs,
    MaxQueuedFrames,
    RtcpBandwidthFraction,
}

impl NumericFlag {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "reorder-window-size" => Some(Self::ReorderWindowSize),
            "reassembly-timeout-ms" => Some(Self::ReassemblyTimeoutMs),
            "max-queued-frames" => Some(Self::MaxQueuedFrames),
            "rtcp-bandwidth-fraction" => Some(Self::RtcpBandwidthFraction),
            _ => None,
        }
    }
}

/// Boolean flags recognized by `configure_ctx(flag)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoolFlag {
    EnableRtcp,
    EnableSrtp,
    UseFragmentingFormatter,
    StrictSequenceCheck,
    AllowReuseaddr,
}

impl BoolFlag {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "enable-rtcp" => Some(Self::EnableRtcp),
            "enable-srtp" => Some(Self::EnableSrtp),
            "use-fragmenting-formatter" => Some(Self::UseFragmentingFormatter),
            "strict-sequence-check" => Some(Self::StrictSequenceCheck),
            "allow-reuseaddr" => Some(Self::AllowReuseaddr),
            _ => None,
        }
    }
}

/// Typed configuration record a `Context` carries. Defaults match the
/// values named throughout spec §4/§5/§8.
#[derive(Debug, Clone)]
pub struct ContextConfig {
    pub reorder_window_size: u16,
    pub reassembly_timeout_ms: u64,
    pub max_queued_frames: usize,
    pub rtcp_bandwidth_fraction: f64,
    pub enable_rtcp: bool,
    pub enable_srtp: bool,
    pub use_fragmenting_formatter: bool,
    pub strict_sequence_check: bool,
    pub allow_reuseaddr: bool,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            reorder_window_size: DEFAULT_REORDER_WINDOW,
            reassembly_timeout_ms: 2_000,
            max_queued_frames: 256,
            rtcp_bandwidth_fraction: DEFAULT_RTCP_BANDWIDTH_FRACTION,
            enable_rtcp: true,
            enable_srtp: false,
            use_fragmenting_formatter: false,
            strict_sequence_check: false,
            allow_reuseaddr: false,
        }
    }
}

impl ContextConfig {
    pub fn configure_numeric(&mut self, flag: &str, value: f64) -> Result<(), RtcError> {
        let flag = NumericFlag::parse(flag).ok_or(RtcError::InvalidValue)?;
        if value.is_sign_negative() {
            return Err(RtcError::InvalidValue);
        }
        match flag {
            NumericFlag::ReorderWindowSize => {
                self.reorder_window_size = value as u16;
            }
            NumericFlag::ReassemblyTimeoutMs => {
                self.reassembly_timeout_ms = value as u64;
            }
            NumericFlag::MaxQueuedFrames => {
                self.max_queued_frames = value as usize;
            }
            NumericFlag::RtcpBandwidthFraction => {
                if value > 1.0 {
                    return Err(RtcError::InvalidValue);
                }
                self.rtcp_bandwidth_fraction = value;
            }
        }
        Ok(())
    }

    pub fn configure_bool(&mut self, flag: &str) -> Result<(), RtcError> {
        let flag = BoolFlag::parse(flag).ok_or(RtcError::InvalidValue)?;
        match flag {
            BoolFlag::EnableRtcp => self.enable_rtcp = true,
            BoolFlag::EnableSrtp => self.enable_srtp = true,
            BoolFlag::UseFragmentingFormatter => self.use_fragmenting_formatter = true,
            BoolFlag::StrictSequenceCheck => self.strict_sequence_check = true,
            BoolFlag::AllowReuseaddr => self.allow_reuseaddr = true,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_numeric_flag_is_invalid() {
        let mut cfg = ContextConfig::default();
        assert_eq!(
            cfg.configure_numeric("not-a-flag", 1.0).unwrap_err(),
            RtcError::InvalidValue
        );
    }

    #[test]
    fn negative_numeric_value_is_invalid() {
        let mut cfg = ContextConfig::default();
        assert_eq!(
            cfg.configure_numeric("max-queued-frames", -1.0).unwrap_err(),
            RtcError::InvalidValue
        );
    }

    #[test]
    fn bool_flags_default_off_except_rtcp() {
        let cfg = ContextConfig::default();
        assert!(cfg.enable_rtcp);
        assert!(!cfg.enable_srtp);
        assert!(!cfg.allow_reuseaddr);
    }

    #[test]
    fn setting_reorder_window_size_applies() {
        let mut cfg = ContextConfig::default();
        cfg.configure_numeric("reorder-window-size", 64.0).unwrap();
        assert_eq!(cfg.reorder_window_size, 64);
    }
}
