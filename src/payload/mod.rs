//! Payload formatters: the per-frame framing rules sitting above the RTP
//! packet framer (`crate::rtp`). Two disciplines are recognized, matching
//! the closed-enum-over-variants texture `rtcp::RtcpPacket` already uses
//! rather than a trait-object formatter registry.

pub mod config;
pub mod fragmenting;
pub mod opaque;

use crate::error::RtcError;
use fragmenting::{Defragmenter, Fragmenter};

/// One outbound RTP payload chunk plus whether it carries the frame-final
/// marker bit.
#[derive(Debug, Clone)]
pub struct PayloadChunk {
    pub bytes: Vec<u8>,
    pub marker: bool,
}

/// The payload-format dispatch tag. `Fragmenting` carries its own
/// reassembly state per stream.
pub enum PayloadFormat {
    Opaque,
    Fragmenting(Defragmenter),
}

impl PayloadFormat {
    pub fn fragmenting(reorder_window: u16) -> Self {
        PayloadFormat::Fragmenting(Defragmenter::new(reorder_window))
    }

    /// Splits one application frame into wire-ready payload chunks.
    pub fn packetize(&self, frame: &[u8], ceiling: usize) -> Result<Vec<PayloadChunk>, RtcError> {
        match self {
            PayloadFormat::Opaque => opaque::packetize(frame, ceiling),
            PayloadFormat::Fragmenting(_) => Ok(Fragmenter::new(ceiling).fragment(frame, 0)),
        }
    }

    /// Feeds one inbound RTP payload through depacketization, returning a
    /// completed frame when reassembly finishes.
    pub fn depacketize(
        &mut self,
        payload: &[u8],
        marker: bool,
        timestamp: u32,
        seq: u16,
    ) -> Option<Vec<u8>> {
        match self {
            PayloadFormat::Opaque => opaque::depacketize(payload, marker),
            PayloadFormat::Fragmenting(d) => d.push(payload, marker, timestamp, seq),
        }
    }
}
