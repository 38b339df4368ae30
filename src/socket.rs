//! Datagram socket abstraction shared by a `MediaStream`'s send and receive
//! workers (spec §5/§6). Grounded on the teacher's `dtls/buffered_udp_channel.rs`
//! (peer framing, logging) and `dtls/socket_blocking_guard.rs` (the
//! RAII blocking-with-timeout pattern), generalized from a DTLS transport
//! shim into a plain send/recv datagram port — this crate has no DTLS
//! handshake to carry.

use std::net::{SocketAddr, UdpSocket};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::RtcError;
use crate::log::log_sink::LogSink;
use crate::sink_warn;

/// Default timeout the receive worker blocks for before re-checking its
/// shutdown flag (spec §5).
pub const DEFAULT_RECV_TIMEOUT: Duration = Duration::from_millis(100);

/// RAII guard leaving the socket in blocking mode with a read timeout for
/// its lifetime, restoring non-blocking on drop. Ported from the teacher's
/// `SocketBlockingGuard` verbatim.
struct BlockingGuard {
    sock: Arc<UdpSocket>,
}

impl BlockingGuard {
    fn new(sock: Arc<UdpSocket>, timeout: Option<Duration>) -> std::io::Result<Self> {
        sock.set_read_timeout(timeout)?;
        sock.set_nonblocking(false)?;
        Ok(Self { sock })
    }
}

impl Drop for BlockingGuard {
    fn drop(&mut self) {
        let _ = self.sock.set_nonblocking(true);
        let _ = self.sock.set_read_timeout(None);
    }
}

pub struct Socket {
    sock: Arc<UdpSocket>,
    remote: Mutex<Option<SocketAddr>>,
    send_lock: Mutex<()>,
    logger: Arc<dyn LogSink>,
}

impl Socket {
    /// Binds the wildcard address on `local_port` (0 lets the OS choose).
    /// `allow_reuseaddr` corresponds to `configure_ctx("allow-reuseaddr")`;
    /// see DESIGN.md for why this crate cannot actually honor it without a
    /// `socket2` dependency the teacher never carried.
    pub fn bind(
        local_port: u16,
        allow_reuseaddr: bool,
        logger: Arc<dyn LogSink>,
    ) -> Result<Self, RtcError> {
        let addr = SocketAddr::from(([0, 0, 0, 0], local_port));
        let sock = UdpSocket::bind(addr)?;
        sock.set_nonblocking(true)?;
        if allow_reuseaddr {
            sink_warn!(
                logger,
                "allow-reuseaddr requested but std::net::UdpSocket has no SO_REUSEADDR knob; binding without it"
            );
        }
        Ok(Self {
            sock: Arc::new(sock),
            remote: Mutex::new(None),
            send_lock: Mutex::new(()),
            logger,
        })
    }

    pub fn connect(&self, remote: SocketAddr) {
        *self.remote.lock().unwrap() = Some(remote);
    }

    pub fn local_addr(&self) -> Result<SocketAddr, RtcError> {
        self.sock.local_addr().map_err(RtcError::from)
    }

    pub fn send(&self, buf: &[u8]) -> Result<usize, RtcError> {
        let remote = self.remote.lock().unwrap().ok_or(RtcError::NotReady)?;
        let _guard = self.send_lock.lock().unwrap();
        self.sock.send_to(buf, remote).map_err(RtcError::from)
    }

    pub fn send_to(&self, buf: &[u8], addr: SocketAddr) -> Result<usize, RtcError> {
        let _guard = self.send_lock.lock().unwrap();
        self.sock.send_to(buf, addr).map_err(RtcError::from)
    }

    /// Blocks up to `timeout` for one datagram. Returns `Ok(None)` on
    /// timeout so the receive worker can re-check its shutdown flag.
    pub fn recv_timeout(
        &self,
        buf: &mut [u8],
        timeout: Duration,
    ) -> Result<Option<(usize, SocketAddr)>, RtcError> {
        let _guard = BlockingGuard::new(self.sock.clone(), Some(timeout))?;
        match self.sock.recv_from(buf) {
            Ok((n, from)) => Ok(Some((n, from))),
            Err(e)
                if e.kind() == std::io::ErrorKind::WouldBlock
                    || e.kind() == std::io::ErrorKind::TimedOut =>
            {
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Wakes a thread parked in `recv_timeout` by sending a zero-length
    /// datagram to our own bound port (spec §5's "shutdown kick").
    pub fn kick(&self) {
        if let Ok(addr) = self.local_addr() {
            let wake = SocketAddr::from(([127, 0, 0, 1], addr.port()));
            let _ = self.sock.send_to(&[], wake);
        }
    }
}
