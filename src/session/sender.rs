//! Send path: one dedicated worker thread per stream draining a
//! single-producer/single-consumer frame queue (spec §4.2/§5).
//! Grounded on `rtp_session/rtp_send_stream.rs`'s SSRC/seq/timestamp
//! bookkeeping, generalized onto the `Socket`/`PayloadFormat` abstractions
//! instead of a raw `UdpSocket` + hardcoded simple-packet encode.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::RtcError;
use crate::log::log_sink::LogSink;
use crate::payload::PayloadFormat;
use crate::rtp::RtpPacket;
use crate::session::config::SenderConfig;
use crate::sink_warn;
use crate::socket::Socket;

struct QueuedFrame {
    bytes: Vec<u8>,
    timestamp_override: Option<u32>,
}

type DeallocHook = Arc<Mutex<Option<Box<dyn Fn() + Send>>>>;

/// Enqueues application frames, packetizes and transmits them on a
/// dedicated worker thread.
pub struct Sender {
    queue: mpsc::Sender<QueuedFrame>,
    active: Arc<AtomicBool>,
    socket: Arc<Socket>,
    dealloc_hook: DeallocHook,
    worker: Option<thread::JoinHandle<()>>,
}

impl Sender {
    pub fn new(cfg: SenderConfig, socket: Arc<Socket>, logger: Arc<dyn LogSink>) -> Self {
        let (queue, rx) = mpsc::channel::<QueuedFrame>();
        let active = Arc::new(AtomicBool::new(true));
        let dealloc_hook: DeallocHook = Arc::new(Mutex::new(None));

        let worker_socket = socket.clone();
        let worker_active = active.clone();
        let worker_hook = dealloc_hook.clone();
        let worker = thread::spawn(move || {
            send_worker(cfg, rx, worker_socket, worker_active, worker_hook, logger);
        });

        Self {
            queue,
            active,
            socket,
            dealloc_hook,
            worker: Some(worker),
        }
    }

    /// Enqueues `bytes` for transmission, using the stream's default
    /// per-frame timestamp increment.
    pub fn push_frame(&self, bytes: Vec<u8>) -> Result<(), RtcError> {
        self.push_frame_inner(bytes, None)
    }

    /// Enqueues `bytes`, overriding the RTP timestamp for this frame.
    pub fn push_frame_with_timestamp(&self, bytes: Vec<u8>, timestamp: u32) -> Result<(), RtcError> {
        self.push_frame_inner(bytes, Some(timestamp))
    }

    fn push_frame_inner(&self, bytes: Vec<u8>, timestamp_override: Option<u32>) -> Result<(), RtcError> {
        if bytes.is_empty() {
            return Err(RtcError::InvalidValue);
        }
        self.queue
            .send(QueuedFrame {
                bytes,
                timestamp_override,
            })
            .map_err(|_| RtcError::SendError)
    }

    /// Registers a callback invoked once per frame after its last fragment
    /// has left the socket.
    pub fn install_dealloc_hook(&self, hook: Box<dyn Fn() + Send>) {
        *self.dealloc_hook.lock().unwrap() = Some(hook);
    }

    pub fn terminate(&mut self) {
        self.active.store(false, Ordering::SeqCst);
        self.socket.kick();
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Sender {
    fn drop(&mut self) {
        self.terminate();
    }
}

fn send_worker(
    cfg: SenderConfig,
    rx: mpsc::Receiver<QueuedFrame>,
    socket: Arc<Socket>,
    active: Arc<AtomicBool>,
    dealloc_hook: DeallocHook,
    logger: Arc<dyn LogSink>,
) {
    let mut seq: u16 = OsRng.next_u32() as u16;
    let mut ts: u32 = OsRng.next_u32();
    let format = if cfg.use_fragmenting_formatter {
        PayloadFormat::fragmenting(crate::rtp::config::DEFAULT_REORDER_WINDOW)
    } else {
        PayloadFormat::Opaque
    };

    while active.load(Ordering::SeqCst) {
        let frame = match rx.recv_timeout(Duration::from_millis(100)) {
            Ok(f) => f,
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        };

        if let Some(ts_override) = frame.timestamp_override {
            ts = ts_override;
        }

        let chunks = match format.packetize(&frame.bytes, cfg.ceiling) {
            Ok(c) => c,
            Err(e) => {
                sink_warn!(logger, "dropping oversized frame: {:?}", e);
                continue;
            }
        };

        for chunk in &chunks {
            let packet = RtpPacket::simple(
                cfg.payload_type,
                chunk.marker,
                seq,
                ts,
                cfg.local_ssrc,
                chunk.bytes.clone(),
            );
            match packet.encode() {
                Ok(bytes) => {
                    if let Err(e) = socket.send(&bytes) {
                        sink_warn!(logger, "rtp send failed: {:?}", e);
                    }
                }
                Err(e) => sink_warn!(logger, "rtp encode failed: {:?}", e),
            }
            seq = seq.wrapping_add(1);
        }

        if frame.timestamp_override.is_none() {
            ts = ts.wrapping_add(cfg.timestamp_increment);
        }

        if let Some(hook) = dealloc_hook.lock().unwrap().as_deref() {
            hook();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::NoopLogSink;

    #[test]
    fn push_frame_rejects_empty() {
        let socket = Arc::new(Socket::bind(0, false, Arc::new(NoopLogSink)).unwrap());
        let sender = Sender::new(SenderConfig::default(), socket, Arc::new(NoopLogSink));
        assert_eq!(sender.push_frame(vec![]).unwrap_err(), RtcError::InvalidValue);
    }

    #[test]
    fn push_frame_after_terminate_errors() {
        let socket = Arc::new(Socket::bind(0, false, Arc::new(NoopLogSink)).unwrap());
        let mut sender = Sender::new(SenderConfig::default(), socket, Arc::new(NoopLogSink));
        sender.terminate();
        assert!(sender.push_frame(vec![1]).is_err());
    }
}
