//! The Opaque discipline: one application frame maps to exactly one RTP
//! packet, marker bit always set. Grounded on spec §4.1's first formatter;
//! there is no fragmentation state to carry, so this module is plain
//! functions rather than a struct.

use crate::error::RtcError;
use crate::payload::PayloadChunk;

pub fn packetize(frame: &[u8], ceiling: usize) -> Result<Vec<PayloadChunk>, RtcError> {
    if frame.len() > ceiling {
        return Err(RtcError::PayloadTooBig);
    }
    Ok(vec![PayloadChunk {
        bytes: frame.to_vec(),
        marker: true,
    }])
}

pub fn depacketize(payload: &[u8], marker: bool) -> Option<Vec<u8>> {
    if marker { Some(payload.to_vec()) } else { None }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_within_ceiling_round_trips() {
        let frame = vec![1u8, 2, 3, 4];
        let chunks = packetize(&frame, 1400).unwrap();
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].marker);
        let back = depacketize(&chunks[0].bytes, chunks[0].marker).unwrap();
        assert_eq!(back, frame);
    }

    #[test]
    fn oversize_frame_errors() {
        let frame = vec![0u8; 64];
        assert_eq!(packetize(&frame, 32).unwrap_err(), RtcError::PayloadTooBig);
    }

    #[test]
    fn missing_marker_yields_nothing() {
        assert!(depacketize(&[1, 2, 3], false).is_none());
    }
}
