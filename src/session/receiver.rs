//! Receive path: one dedicated worker thread blocking in socket reads,
//! reassembling frames and delivering them either through a bounded pull
//! ring or a synchronous hook (spec §4.3/§5).
//! Grounded on `rtp_session/rtp_recv_stream.rs`'s SSRC-learning, replacing
//! its jitter-buffer-by-sequence-number with the payload-format
//! depacketizer (the spec's reorder/flush rules live in `crate::payload`,
//! not in the receive stream itself). Inbound packets are also forwarded
//! to the stream's `RtcpHandle`, if any, for RFC 3550 Appendix A.8 jitter
//! tracking against the remote sender's report blocks.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::Duration;

use crate::error::RtcError;
use crate::log::log_sink::LogSink;
use crate::payload::PayloadFormat;
use crate::rtp::time::ntp_now;
use crate::rtp::RtpPacket;
use crate::session::config::ReceiverConfig;
use crate::session::rtcp_worker::RtcpHandle;
use crate::sink_trace;
use crate::socket::{Socket, DEFAULT_RECV_TIMEOUT};

type RecvHook = Arc<Mutex<Option<Box<dyn Fn(&[u8]) + Send>>>>;

struct FrameRing {
    queue: Mutex<VecDeque<Vec<u8>>>,
    not_empty: Condvar,
    capacity: usize,
    dropped: Mutex<u64>,
}

impl FrameRing {
    fn new(capacity: usize) -> Self {
        Self {
            queue: Mutex::new(VecDeque::with_capacity(capacity.min(64))),
            not_empty: Condvar::new(),
            capacity,
            dropped: Mutex::new(0),
        }
    }

    fn push(&self, frame: Vec<u8>) {
        let mut q = self.queue.lock().unwrap();
        if q.len() >= self.capacity {
            q.pop_front();
            *self.dropped.lock().unwrap() += 1;
        }
        q.push_back(frame);
        self.not_empty.notify_one();
    }

    fn pop_blocking(&self, active: &AtomicBool) -> Option<Vec<u8>> {
        let mut q = self.queue.lock().unwrap();
        loop {
            if let Some(frame) = q.pop_front() {
                return Some(frame);
            }
            if !active.load(Ordering::SeqCst) {
                return None;
            }
            let (guard, _timeout) = self
                .not_empty
                .wait_timeout(q, Duration::from_millis(100))
                .unwrap();
            q = guard;
        }
    }

    fn dropped_count(&self) -> u64 {
        *self.dropped.lock().unwrap()
    }
}

/// Reassembles and delivers frames received on a `Socket`.
pub struct Receiver {
    active: Arc<AtomicBool>,
    socket: Arc<Socket>,
    ring: Arc<FrameRing>,
    hook: RecvHook,
    worker: Option<thread::JoinHandle<()>>,
}

impl Receiver {
    /// `rtcp_handle`, when the stream has RTCP enabled, feeds every inbound
    /// RTP packet's sequence/timestamp into the same per-remote-SSRC
    /// tracker the RTCP worker uses to build report blocks (spec §4.4).
    pub fn new(
        cfg: ReceiverConfig,
        socket: Arc<Socket>,
        rtcp_handle: Option<RtcpHandle>,
        logger: Arc<dyn LogSink>,
    ) -> Self {
        let active = Arc::new(AtomicBool::new(true));
        let ring = Arc::new(FrameRing::new(cfg.max_queued_frames.max(1)));
        let hook: RecvHook = Arc::new(Mutex::new(None));

        let worker_active = active.clone();
        let worker_socket = socket.clone();
        let worker_ring = ring.clone();
        let worker_hook = hook.clone();
        let worker = thread::spawn(move || {
            recv_worker(
                cfg,
                worker_socket,
                worker_active,
                worker_ring,
                worker_hook,
                rtcp_handle,
                logger,
            );
        });

        Self {
            active,
            socket,
            ring,
            hook,
            worker: Some(worker),
        }
    }

    /// Blocking pull of the next reassembled frame. Returns `None` once a
    /// hook has been installed, or after shutdown.
    pub fn pull_frame(&self) -> Option<Vec<u8>> {
        if self.hook.lock().unwrap().is_some() {
            return None;
        }
        self.ring.pop_blocking(&self.active)
    }

    /// Registers a callback invoked once per reassembled frame. Once
    /// installed, `pull_frame` stops returning data.
    pub fn install_recv_hook(&self, hook: Box<dyn Fn(&[u8]) + Send>) {
        *self.hook.lock().unwrap() = Some(hook);
    }

    /// Frames dropped from the pull ring due to the consumer falling
    /// behind (spec §4.3's bounded-ring overflow counter).
    pub fn dropped_frame_count(&self) -> u64 {
        self.ring.dropped_count()
    }

    pub fn terminate(&mut self) -> Result<(), RtcError> {
        self.active.store(false, Ordering::SeqCst);
        self.socket.kick();
        if let Some(handle) = self.worker.take() {
            handle.join().map_err(|_| RtcError::GenericError)?;
        }
        Ok(())
    }
}

impl Drop for Receiver {
    fn drop(&mut self) {
        let _ = self.terminate();
    }
}

/// Scales the current wall-clock time into RTP timestamp units at
/// `clock_rate_hz`, truncating to 32 bits the same way an RTP timestamp
/// wraps, so `RxTracker::on_rtp`'s transit-time subtraction (RFC 3550
/// Appendix A.8) behaves the same as it would against a real sender clock.
fn ntp_now_as_rtp_units(clock_rate_hz: u32) -> u32 {
    let (secs, frac) = ntp_now();
    let rate = clock_rate_hz as u64;
    let whole = (secs as u64).wrapping_mul(rate);
    let fractional = ((frac as u64) * rate) >> 32;
    whole.wrapping_add(fractional) as u32
}

fn recv_worker(
    cfg: ReceiverConfig,
    socket: Arc<Socket>,
    active: Arc<AtomicBool>,
    ring: Arc<FrameRing>,
    hook: RecvHook,
    rtcp_handle: Option<RtcpHandle>,
    logger: Arc<dyn LogSink>,
) {
    let mut format = if cfg.use_fragmenting_formatter {
        PayloadFormat::fragmenting(cfg.reorder_window)
    } else {
        PayloadFormat::Opaque
    };
    let mut remote_ssrc = cfg.expected_ssrc;
    let mut buf = vec![0u8; 65536];

    while active.load(Ordering::SeqCst) {
        let (n, _from) = match socket.recv_timeout(&mut buf, DEFAULT_RECV_TIMEOUT) {
            Ok(Some(got)) => got,
            Ok(None) => continue,
            Err(e) => {
                sink_trace!(logger, "recv error: {:?}", e);
                continue;
            }
        };

        let packet = match RtpPacket::decode(&buf[..n]) {
            Ok(p) => p,
            Err(e) => {
                sink_trace!(logger, "dropping malformed rtp packet: {:?}", e);
                continue;
            }
        };

        if let Some(expected) = remote_ssrc {
            if expected != packet.header.ssrc {
                continue;
            }
        } else {
            remote_ssrc = Some(packet.header.ssrc);
        }

        if let Some(handle) = &rtcp_handle {
            let arrival_rtp_units = ntp_now_as_rtp_units(cfg.clock_rate_hz);
            handle.note_remote_rtp(
                packet.header.ssrc,
                packet.header.sequence_number,
                packet.header.timestamp,
                arrival_rtp_units,
            );
        }

        if let Some(frame) = format.depacketize(
            &packet.payload,
            packet.header.marker,
            packet.header.timestamp,
            packet.header.sequence_number,
        ) {
            if let Some(h) = hook.lock().unwrap().as_deref() {
                h(&frame);
            } else {
                ring.push(frame);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::NoopLogSink;

    #[test]
    fn pull_frame_returns_none_after_terminate() {
        let socket = Arc::new(Socket::bind(0, false, Arc::new(NoopLogSink)).unwrap());
        let mut receiver = Receiver::new(ReceiverConfig::default(), socket, None, Arc::new(NoopLogSink));
        receiver.terminate().unwrap();
        assert!(receiver.pull_frame().is_none());
    }

    #[test]
    fn opaque_round_trip_through_socket() {
        let recv_sock = Arc::new(Socket::bind(0, false, Arc::new(NoopLogSink)).unwrap());
        let recv_addr = recv_sock.local_addr().unwrap();
        let send_sock = Arc::new(Socket::bind(0, false, Arc::new(NoopLogSink)).unwrap());
        send_sock.connect(recv_addr);

        let receiver = Receiver::new(ReceiverConfig::default(), recv_sock, None, Arc::new(NoopLogSink));

        let packet = RtpPacket::simple(96, true, 1, 1000, 0xAABBCCDD, vec![1, 2, 3, 4]);
        send_sock.send(&packet.encode().unwrap()).unwrap();

        let got = receiver.pull_frame();
        assert_eq!(got, Some(vec![1, 2, 3, 4]));
    }
}
