//! `Context`: a process-wide factory issuing `Session`s (spec §2/§3).
//!
//! `Session` holds a locally chosen SSRC and a bag of `MediaStream`s to a
//! single remote address. Per-frame sequence number and timestamp state
//! (also named at the Session level in spec §3) is kept at the
//! granularity actually used by spec §4.2/§4.3's operations — inside each
//! `MediaStream`'s `Sender`/`Receiver` — since a session's streams can run
//! independent payload clocks; see DESIGN.md for this Open Question
//! decision.

use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use rand::rngs::OsRng;
use rand::RngCore;

use crate::config::ContextConfig;
use crate::error::RtcError;
use crate::log::log_sink::LogSink;
use crate::media_stream::{MediaStream, MediaStreamConfig};

/// Process-wide factory for `Session`s, holding the shared `ContextConfig`
/// (spec §6's `configure_ctx` surface) and the set of SSRCs already handed
/// out so new sessions never collide with an existing one locally.
pub struct Context {
    config: Mutex<ContextConfig>,
    issued_ssrcs: Mutex<HashSet<u32>>,
    logger: Arc<dyn LogSink>,
}

impl Context {
    pub fn new(logger: Arc<dyn LogSink>) -> Self {
        Self {
            config: Mutex::new(ContextConfig::default()),
            issued_ssrcs: Mutex::new(HashSet::new()),
            logger,
        }
    }

    pub fn configure_numeric(&self, flag: &str, value: f64) -> Result<(), RtcError> {
        self.config.lock().unwrap().configure_numeric(flag, value)
    }

    pub fn configure_bool(&self, flag: &str) -> Result<(), RtcError> {
        self.config.lock().unwrap().configure_bool(flag)
    }

    pub fn config_snapshot(&self) -> ContextConfig {
        self.config.lock().unwrap().clone()
    }

    /// Picks a local SSRC with no collision against any SSRC already
    /// issued to a live `Session` from this `Context` (spec §3's collision
    /// invariant, applied at allocation time rather than reactively on
    /// receive, since this crate owns every locally-issued SSRC up front).
    fn alloc_ssrc(&self) -> u32 {
        let mut issued = self.issued_ssrcs.lock().unwrap();
        loop {
            let candidate = OsRng.next_u32();
            if candidate != 0 && issued.insert(candidate) {
                return candidate;
            }
        }
    }

    pub fn create_session(&self) -> Session {
        let local_ssrc = self.alloc_ssrc();
        Session {
            local_ssrc,
            config: self.config_snapshot(),
            logger: Arc::clone(&self.logger),
            streams: Mutex::new(Vec::new()),
        }
    }
}

/// One session's local identity (SSRC) plus the `MediaStream`s it hosts
/// to a single remote address (spec §3).
pub struct Session {
    local_ssrc: u32,
    config: ContextConfig,
    logger: Arc<dyn LogSink>,
    streams: Mutex<Vec<MediaStream>>,
}

impl Session {
    pub fn local_ssrc(&self) -> u32 {
        self.local_ssrc
    }

    /// Constructs and spawns a new `MediaStream` to `remote_addr`, adding
    /// it to this session's bag and returning its index.
    pub fn add_media_stream(
        &self,
        local_port: u16,
        remote_addr: SocketAddr,
        payload_type: u8,
        timestamp_increment: u32,
        cname: impl Into<String>,
    ) -> Result<usize, RtcError> {
        let stream = MediaStream::new(
            MediaStreamConfig {
                local_port,
                remote_addr,
                local_ssrc: self.local_ssrc,
                payload_type,
                timestamp_increment,
                clock_rate_hz: crate::rtp::config::DEFAULT_CLOCK_RATE_HZ,
                cname: cname.into(),
            },
            &self.config,
            Arc::clone(&self.logger),
        )?;
        let mut streams = self.streams.lock().unwrap();
        streams.push(stream);
        Ok(streams.len() - 1)
    }

    pub fn stream_count(&self) -> usize {
        self.streams.lock().unwrap().len()
    }

    pub fn stream_local_addr(&self, stream_idx: usize) -> Option<SocketAddr> {
        self.streams.lock().unwrap().get(stream_idx)?.local_addr().ok()
    }

    /// Repoints an already-added stream at a new remote address (see
    /// `MediaStream::reconnect`).
    pub fn reconnect_stream(&self, stream_idx: usize, remote_addr: SocketAddr) -> Result<(), RtcError> {
        let streams = self.streams.lock().unwrap();
        let stream = streams.get(stream_idx).ok_or(RtcError::InvalidValue)?;
        stream.reconnect(remote_addr);
        Ok(())
    }

    pub fn push_frame(&self, stream_idx: usize, bytes: Vec<u8>) -> Result<(), RtcError> {
        let streams = self.streams.lock().unwrap();
        let stream = streams.get(stream_idx).ok_or(RtcError::InvalidValue)?;
        stream.push_frame(bytes)
    }

    pub fn pull_frame(&self, stream_idx: usize) -> Option<Vec<u8>> {
        let streams = self.streams.lock().unwrap();
        streams.get(stream_idx)?.pull_frame()
    }

    /// Terminates every `MediaStream` in this session (spec §3's lifecycle:
    /// destructor signals workers to stop and joins them).
    pub fn terminate_all(&self) -> Result<(), RtcError> {
        let mut streams = self.streams.lock().unwrap();
        for stream in streams.iter_mut() {
            stream.terminate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::NoopLogSink;

    #[test]
    fn sessions_get_distinct_ssrcs() {
        let ctx = Context::new(Arc::new(NoopLogSink));
        let a = ctx.create_session();
        let b = ctx.create_session();
        assert_ne!(a.local_ssrc(), b.local_ssrc());
    }

    #[test]
    fn unknown_flag_is_rejected() {
        let ctx = Context::new(Arc::new(NoopLogSink));
        assert!(ctx.configure_bool("not-a-real-flag").is_err());
    }

    #[test]
    fn add_media_stream_and_echo_frame() {
        let ctx = Context::new(Arc::new(NoopLogSink));
        {
            let mut cfg = ctx.config.lock().unwrap();
            cfg.enable_rtcp = false;
        }

        let session_a = ctx.create_session();
        let idx_a = session_a
            .add_media_stream(0, "127.0.0.1:1".parse().unwrap(), 96, 3000, "a@test")
            .unwrap();

        let session_b = ctx.create_session();
        let idx_b = session_b
            .add_media_stream(0, "127.0.0.1:1".parse().unwrap(), 96, 3000, "b@test")
            .unwrap();

        let b_addr = session_b.stream_local_addr(idx_b).unwrap();
        session_a.reconnect_stream(idx_a, b_addr).unwrap();

        session_a.push_frame(idx_a, vec![9, 8, 7]).unwrap();
        assert_eq!(session_b.pull_frame(idx_b), Some(vec![9, 8, 7]));
    }
}
