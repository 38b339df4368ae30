//! `MediaStream`: the tuple (local-addr, local-port, remote-addr,
//! remote-port, payload-format, flags) from spec §3, owning a `Socket`
//! shared between a `Sender` and a `Receiver`, plus an optional RTCP
//! worker on a second socket conventionally at `local_port + 1` (spec
//! §4.4/§6). Lifecycle: `new` binds both sockets and spawns all workers;
//! `Drop` signals and joins them.

use std::net::SocketAddr;
use std::sync::Arc;

use crate::config::ContextConfig;
use crate::error::RtcError;
use crate::log::log_sink::LogSink;
use crate::rtcp::config::DEFAULT_SESSION_BANDWIDTH_BPS;
use crate::session::{Receiver, ReceiverConfig, RtcpWorker, Sender, SenderConfig};
use crate::socket::Socket;

/// Per-stream identity and addressing, supplied once at construction.
#[derive(Debug, Clone)]
pub struct MediaStreamConfig {
    pub local_port: u16,
    pub remote_addr: SocketAddr,
    pub local_ssrc: u32,
    pub payload_type: u8,
    pub timestamp_increment: u32,
    /// Sampling clock rate backing this stream's RTP timestamps, used to
    /// scale wall-clock arrival time into RTP units for jitter (RFC 3550
    /// Appendix A.8). Defaults to `DEFAULT_CLOCK_RATE_HZ` (90 kHz).
    pub clock_rate_hz: u32,
    pub cname: String,
}

/// Owns the RTP socket/Sender/Receiver and, when enabled, the RTCP worker.
/// The Receiver feeds every inbound packet's sequence/timestamp into the
/// RTCP worker's per-remote-SSRC tracker via an `RtcpHandle`, so outbound
/// report blocks carry real loss/jitter data about this stream's inbound
/// media (spec §4.4).
pub struct MediaStream {
    socket: Arc<Socket>,
    sender: Sender,
    receiver: Receiver,
    rtcp: Option<RtcpWorker>,
    bye_sent: bool,
}

impl MediaStream {
    pub fn new(
        stream_cfg: MediaStreamConfig,
        ctx_cfg: &ContextConfig,
        logger: Arc<dyn LogSink>,
    ) -> Result<Self, RtcError> {
        let socket = Arc::new(Socket::bind(
            stream_cfg.local_port,
            ctx_cfg.allow_reuseaddr,
            Arc::clone(&logger),
        )?);
        socket.connect(stream_cfg.remote_addr);

        let sender = Sender::new(
            SenderConfig {
                local_ssrc: stream_cfg.local_ssrc,
                payload_type: stream_cfg.payload_type,
                timestamp_increment: stream_cfg.timestamp_increment,
                ceiling: crate::rtp::config::DEFAULT_FRAGMENT_PAYLOAD_CEILING,
                use_fragmenting_formatter: ctx_cfg.use_fragmenting_formatter,
            },
            Arc::clone(&socket),
            Arc::clone(&logger),
        );

        let rtcp = if ctx_cfg.enable_rtcp {
            let rtcp_local_port = if stream_cfg.local_port == 0 {
                0
            } else {
                stream_cfg.local_port + 1
            };
            let rtcp_socket = Arc::new(Socket::bind(
                rtcp_local_port,
                ctx_cfg.allow_reuseaddr,
                Arc::clone(&logger),
            )?);
            let mut rtcp_remote = stream_cfg.remote_addr;
            rtcp_remote.set_port(stream_cfg.remote_addr.port().saturating_add(1));
            rtcp_socket.connect(rtcp_remote);

            let rtcp_bw_bytes_per_sec =
                DEFAULT_SESSION_BANDWIDTH_BPS / 8.0 * ctx_cfg.rtcp_bandwidth_fraction;
            Some(RtcpWorker::new(
                stream_cfg.local_ssrc,
                stream_cfg.cname,
                rtcp_bw_bytes_per_sec,
                rtcp_socket,
                Arc::clone(&logger),
            ))
        } else {
            None
        };

        let receiver = Receiver::new(
            ReceiverConfig {
                expected_ssrc: None,
                reorder_window: ctx_cfg.reorder_window_size,
                max_queued_frames: ctx_cfg.max_queued_frames,
                use_fragmenting_formatter: ctx_cfg.use_fragmenting_formatter,
                clock_rate_hz: stream_cfg.clock_rate_hz,
            },
            Arc::clone(&socket),
            rtcp.as_ref().map(RtcpWorker::handle),
            logger,
        );

        Ok(Self {
            socket,
            sender,
            receiver,
            rtcp,
            bye_sent: false,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, RtcError> {
        self.socket.local_addr()
    }

    /// Repoints the RTP socket at a new remote address. Only needed when a
    /// peer's ephemeral port isn't known until after construction (e.g. two
    /// locally bound test streams); real deployments know the remote
    /// address up front and never call this.
    pub fn reconnect(&self, remote_addr: SocketAddr) {
        self.socket.connect(remote_addr);
    }

    /// Enqueues a frame for transmission (spec §4.2's `push_frame`).
    pub fn push_frame(&self, bytes: Vec<u8>) -> Result<(), RtcError> {
        let frame_len = bytes.len();
        self.sender.push_frame(bytes)?;
        if let Some(rtcp) = &self.rtcp {
            rtcp.note_local_send(frame_len);
        }
        Ok(())
    }

    pub fn push_frame_with_timestamp(&self, bytes: Vec<u8>, timestamp: u32) -> Result<(), RtcError> {
        let frame_len = bytes.len();
        self.sender.push_frame_with_timestamp(bytes, timestamp)?;
        if let Some(rtcp) = &self.rtcp {
            rtcp.note_local_send(frame_len);
        }
        Ok(())
    }

    pub fn install_dealloc_hook(&self, hook: Box<dyn Fn() + Send>) {
        self.sender.install_dealloc_hook(hook);
    }

    /// Blocking pull of the next reassembled frame (spec §4.3).
    pub fn pull_frame(&self) -> Option<Vec<u8>> {
        self.receiver.pull_frame()
    }

    pub fn install_recv_hook(&self, hook: Box<dyn Fn(&[u8]) + Send>) {
        self.receiver.install_recv_hook(hook);
    }

    pub fn dropped_frame_count(&self) -> u64 {
        self.receiver.dropped_frame_count()
    }

    /// Signals and joins every worker, emitting a final BYE first if RTCP
    /// is enabled (spec §4.4/§8's "at most one BYE per termination"). Safe
    /// to call more than once (explicit call followed by `Drop` is an
    /// ordinary usage pattern): the BYE only goes out on the first call.
    pub fn terminate(&mut self) -> Result<(), RtcError> {
        if !self.bye_sent {
            if let Some(rtcp) = &self.rtcp {
                rtcp.send_bye(None)?;
            }
            self.bye_sent = true;
        }
        if let Some(rtcp) = &mut self.rtcp {
            rtcp.terminate()?;
        }
        self.sender.terminate();
        self.receiver.terminate()?;
        Ok(())
    }
}

impl Drop for MediaStream {
    fn drop(&mut self) {
        let _ = self.terminate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::NoopLogSink;
    use crate::rtcp::RtcpPacket;
    use std::time::Duration;

    fn stream_cfg(local_port: u16, remote_addr: SocketAddr, ssrc: u32) -> MediaStreamConfig {
        MediaStreamConfig {
            local_port,
            remote_addr,
            local_ssrc: ssrc,
            payload_type: 96,
            timestamp_increment: 3000,
            clock_rate_hz: crate::rtp::config::DEFAULT_CLOCK_RATE_HZ,
            cname: format!("stream-{ssrc}@test"),
        }
    }

    #[test]
    fn echo_round_trip_between_two_streams() {
        let mut ctx_cfg = ContextConfig::default();
        ctx_cfg.enable_rtcp = false;

        let a = MediaStream::new(
            stream_cfg(0, "127.0.0.1:1".parse().unwrap(), 1),
            &ctx_cfg,
            Arc::new(NoopLogSink),
        )
        .unwrap();
        let a_addr = a.local_addr().unwrap();

        let b = MediaStream::new(
            stream_cfg(0, a_addr, 2),
            &ctx_cfg,
            Arc::new(NoopLogSink),
        )
        .unwrap();
        let b_addr = b.local_addr().unwrap();

        // `a`'s socket was bound before `b` existed, so reconnect it at `b`'s
        // real ephemeral port.
        a.reconnect(b_addr);

        a.push_frame(vec![1, 2, 3, 4]).unwrap();
        let got = b.pull_frame();
        assert_eq!(got, Some(vec![1, 2, 3, 4]));
    }

    #[test]
    fn terminate_sends_exactly_one_bye_across_repeated_calls_and_drop() {
        let observer = Socket::bind(0, false, Arc::new(NoopLogSink)).unwrap();
        let observer_addr = observer.local_addr().unwrap();
        // Point this stream's RTCP remote (local RTP port + 1) at the
        // observer by giving it a remote RTP port one below the observer's.
        let rtcp_peer = SocketAddr::new(observer_addr.ip(), observer_addr.port() - 1);

        let mut ctx_cfg = ContextConfig::default();
        ctx_cfg.enable_rtcp = true;

        let mut stream = MediaStream::new(
            stream_cfg(0, rtcp_peer, 7),
            &ctx_cfg,
            Arc::new(NoopLogSink),
        )
        .unwrap();

        stream.terminate().unwrap();
        stream.terminate().unwrap();
        drop(stream);

        let mut bye_count = 0;
        let mut buf = vec![0u8; 1500];
        loop {
            match observer.recv_timeout(&mut buf, Duration::from_millis(300)) {
                Ok(Some((n, _))) => {
                    let packets = RtcpPacket::decode_compound(&buf[..n]).unwrap();
                    if packets.iter().any(|p| matches!(p, RtcpPacket::Bye(_))) {
                        bye_count += 1;
                    }
                }
                Ok(None) => break,
                Err(e) => panic!("observer recv failed: {e:?}"),
            }
        }
        assert_eq!(bye_count, 1);
    }
}
