//! Dedicated RTCP worker thread: owns a second datagram socket (spec §4.4/
//! §5, conventionally RTP port + 1) and drives `RtcpRunner`'s self-scheduled
//! reporting loop plus inbound SR/RR/SDES/BYE dispatch.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::error::RtcError;
use crate::log::log_sink::LogSink;
use crate::rtcp::runner::RtcpRunner;
use crate::rtcp::RtcpPacket;
use crate::rtp::time::ntp_now;
use crate::rtp_session::rx_tracker::RxTracker;
use crate::rtp_session::tx_tracker::{ntp_to_compact, TxTracker};
use crate::sink_warn;
use crate::socket::Socket;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

struct Shared {
    runner: Mutex<RtcpRunner>,
    rx_trackers: Mutex<HashMap<u32, RxTracker>>,
    tx_tracker: Mutex<TxTracker>,
    local_ssrc: u32,
}

pub struct RtcpWorker {
    socket: Arc<Socket>,
    active: Arc<AtomicBool>,
    shared: Arc<Shared>,
    thread: Option<JoinHandle<()>>,
}

/// Cheap, cloneable handle onto a running `RtcpWorker`'s shared state, so a
/// stream's `Receiver` can feed inbound RTP arrivals into the same report
/// blocks the worker builds (spec §4.4's per-remote-SSRC jitter/loss data).
#[derive(Clone)]
pub struct RtcpHandle {
    shared: Arc<Shared>,
}

impl RtcpHandle {
    /// Call once per inbound RTP packet, keyed by the packet's RTP
    /// timestamp and an arrival time expressed in the same clock's units.
    pub fn note_remote_rtp(&self, remote_ssrc: u32, seq: u16, rtp_ts: u32, arrival_rtp_units: u32) {
        let now = Instant::now();
        self.shared.runner.lock().unwrap().note_activity(remote_ssrc, now);
        self.shared
            .rx_trackers
            .lock()
            .unwrap()
            .entry(remote_ssrc)
            .or_default()
            .on_rtp(seq, rtp_ts, arrival_rtp_units);
    }
}

impl RtcpWorker {
    pub fn new(
        local_ssrc: u32,
        cname: impl Into<String>,
        rtcp_bw_bytes_per_sec: f64,
        socket: Arc<Socket>,
        logger: Arc<dyn LogSink>,
    ) -> Self {
        let active = Arc::new(AtomicBool::new(true));
        let shared = Arc::new(Shared {
            runner: Mutex::new(RtcpRunner::new(
                local_ssrc,
                cname,
                rtcp_bw_bytes_per_sec,
                Instant::now(),
            )),
            rx_trackers: Mutex::new(HashMap::new()),
            tx_tracker: Mutex::new(TxTracker::default()),
            local_ssrc,
        });

        let worker_socket = Arc::clone(&socket);
        let worker_active = Arc::clone(&active);
        let worker_shared = Arc::clone(&shared);
        let worker_logger = Arc::clone(&logger);
        let thread = thread::spawn(move || {
            rtcp_worker_loop(worker_socket, worker_active, worker_shared, worker_logger)
        });

        Self {
            socket,
            active,
            shared,
            thread: Some(thread),
        }
    }

    /// Call once per outbound RTP packet on this stream, so the RTCP side
    /// can report correct sender packet/octet counts and `we_sent`.
    pub fn note_local_send(&self, packet_bytes: usize) {
        self.shared.runner.lock().unwrap().note_local_send(packet_bytes);
    }

    /// Call once per inbound RTP packet on this stream, keyed by the
    /// packet's RTP timestamp expressed in the payload clock's units.
    pub fn note_remote_rtp(&self, remote_ssrc: u32, seq: u16, rtp_ts: u32, arrival_rtp_units: u32) {
        self.handle().note_remote_rtp(remote_ssrc, seq, rtp_ts, arrival_rtp_units);
    }

    /// A cloneable handle usable from another thread (e.g. a `Receiver`'s
    /// recv worker) to feed this worker the same inbound-RTP bookkeeping.
    pub fn handle(&self) -> RtcpHandle {
        RtcpHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Sends a BYE immediately, bypassing the scheduler (spec §4.4's
    /// `terminate()` contract: at most one BYE per session teardown).
    pub fn send_bye(&self, reason: Option<String>) -> Result<(), RtcError> {
        let pkt = self.shared.runner.lock().unwrap().generate_bye(reason);
        let buf = RtcpPacket::encode_compound(&[pkt])?;
        self.socket.send(&buf)?;
        Ok(())
    }

    pub fn terminate(&mut self) -> Result<(), RtcError> {
        self.active.store(false, Ordering::SeqCst);
        self.socket.kick();
        if let Some(handle) = self.thread.take() {
            handle.join().map_err(|_| RtcError::GenericError)?;
        }
        Ok(())
    }
}

impl Drop for RtcpWorker {
    fn drop(&mut self) {
        let _ = self.terminate();
    }
}

fn rtcp_worker_loop(
    socket: Arc<Socket>,
    active: Arc<AtomicBool>,
    shared: Arc<Shared>,
    logger: Arc<dyn LogSink>,
) {
    let mut buf = vec![0u8; 1500];
    while active.load(Ordering::SeqCst) {
        match socket.recv_timeout(&mut buf, POLL_INTERVAL) {
            Ok(Some((n, _from))) => handle_incoming(&buf[..n], &shared, &logger),
            Ok(None) => {}
            Err(e) => {
                sink_warn!(logger, "rtcp recv failed: {e}");
            }
        }
        if !active.load(Ordering::SeqCst) {
            break;
        }
        maybe_send_report(&socket, &shared, &logger);
    }
}

fn handle_incoming(buf: &[u8], shared: &Arc<Shared>, logger: &Arc<dyn LogSink>) {
    let packets = match RtcpPacket::decode_compound(buf) {
        Ok(p) => p,
        Err(e) => {
            sink_warn!(logger, "dropping malformed rtcp compound packet: {e}");
            return;
        }
    };
    let now = Instant::now();
    let arrival_ntp = ntp_now();
    let arrival_compact = ntp_to_compact(arrival_ntp.0, arrival_ntp.1);

    for pkt in packets {
        match pkt {
            RtcpPacket::Sr(sr) => {
                shared.runner.lock().unwrap().note_activity(sr.ssrc, now);
                for rb in &sr.reports {
                    if rb.ssrc == shared.local_ssrc {
                        shared
                            .tx_tracker
                            .lock()
                            .unwrap()
                            .on_report_block(rb, arrival_compact);
                    }
                }
                shared
                    .rx_trackers
                    .lock()
                    .unwrap()
                    .entry(sr.ssrc)
                    .or_default()
                    .on_sr_received(sr.info.ntp_msw, sr.info.ntp_lsw, arrival_ntp);
            }
            RtcpPacket::Rr(rr) => {
                shared.runner.lock().unwrap().note_activity(rr.ssrc, now);
                for rb in &rr.reports {
                    if rb.ssrc == shared.local_ssrc {
                        shared
                            .tx_tracker
                            .lock()
                            .unwrap()
                            .on_report_block(rb, arrival_compact);
                    }
                }
            }
            RtcpPacket::Bye(bye) => {
                let mut runner = shared.runner.lock().unwrap();
                for ssrc in &bye.sources {
                    runner.note_bye(*ssrc, now);
                }
            }
            RtcpPacket::Sdes(sdes) => {
                for chunk in &sdes.chunks {
                    shared.runner.lock().unwrap().note_activity(chunk.ssrc, now);
                }
            }
            RtcpPacket::App(_) | RtcpPacket::Nack(_) | RtcpPacket::Pli(_) => {}
        }
    }
}

fn maybe_send_report(socket: &Arc<Socket>, shared: &Arc<Shared>, logger: &Arc<dyn LogSink>) {
    let now = Instant::now();
    let mut runner = shared.runner.lock().unwrap();
    if !runner.due(now) {
        return;
    }
    runner.prune_timed_out(now, Duration::from_secs(5 * 5));

    let report_blocks: Vec<_> = shared
        .rx_trackers
        .lock()
        .unwrap()
        .iter_mut()
        .map(|(ssrc, tracker)| tracker.build_report_block(*ssrc))
        .collect();

    let (ntp_msw, ntp_lsw) = ntp_now();
    let rtp_ts = ntp_msw;
    let packets = runner.generate_report(report_blocks, ntp_msw, ntp_lsw, rtp_ts);
    if let Ok(buf) = RtcpPacket::encode_compound(&packets) {
        runner.record_packet_size(buf.len());
        if let Err(e) = socket.send(&buf) {
            sink_warn!(logger, "rtcp send failed: {e}");
        } else {
            shared.tx_tracker.lock().unwrap().mark_sr_sent(ntp_msw, ntp_lsw);
        }
    }
    runner.schedule_next(now);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::NoopLogSink;

    #[test]
    fn terminate_joins_cleanly() {
        let socket = Arc::new(Socket::bind(0, false, Arc::new(NoopLogSink)).unwrap());
        let mut worker = RtcpWorker::new(42, "test@example.com", 800.0, socket, Arc::new(NoopLogSink));
        worker.terminate().unwrap();
    }

    #[test]
    fn note_remote_rtp_accumulates_jitter_for_tracked_ssrc() {
        let socket = Arc::new(Socket::bind(0, false, Arc::new(NoopLogSink)).unwrap());
        let mut worker = RtcpWorker::new(5, "jitter@test", 800.0, socket, Arc::new(NoopLogSink));

        // rtp_ts advances evenly but arrival time doesn't track it 1:1,
        // producing a non-zero transit-time delta (RFC 3550 Appendix A.8).
        worker.note_remote_rtp(0xA, 1, 1000, 2000);
        worker.note_remote_rtp(0xA, 2, 1100, 2300);
        worker.note_remote_rtp(0xA, 3, 1200, 2900);

        let jitter = worker
            .shared
            .rx_trackers
            .lock()
            .unwrap()
            .get_mut(&0xA)
            .unwrap()
            .build_report_block(0xA)
            .interarrival_jitter;
        assert!(jitter > 0, "expected jitter to accumulate from varying transit times");

        worker.terminate().unwrap();
    }

    #[test]
    fn note_local_send_marks_we_sent() {
        let socket = Arc::new(Socket::bind(0, false, Arc::new(NoopLogSink)).unwrap());
        let mut worker = RtcpWorker::new(1, "a@b", 800.0, socket, Arc::new(NoopLogSink));
        worker.note_local_send(200);
        assert!(worker.shared.runner.lock().unwrap().member_count() >= 1);
        worker.terminate().unwrap();
    }
}
