//! The Fragmenting discipline (spec §4.1): frames larger than a configured
//! ceiling are split into multiple RTP payload chunks, each carrying a
//! 2-octet fragment header in the RFC 6184 FU-A layout — outer
//! (F:1, NRI:2, Type:5) then inner (S:1, E:1, R:1, Type:5) — generalized
//! here to an arbitrary `unit_type` rather than an H.264 NAL type.
//!
//! Grounded on the teacher's `h264_packetizer.rs`/`h264_depacketizer.rs`,
//! stripped of Annex-B/NAL-unit awareness (this discipline fragments one
//! opaque frame, not a sequence of access-unit NAL units) and extended with
//! out-of-order reassembly within a bounded reorder window, per spec §4.1's
//! "reorder within window" and "reorder beyond window discards" rules.

use std::collections::HashMap;

use crate::payload::config::{FRAGMENT_HEADER_LEN, FRAGMENT_UNIT_TYPE};
use crate::payload::PayloadChunk;
use crate::rtp::config::DEFAULT_REORDER_WINDOW;

pub struct Fragmenter {
    ceiling: usize,
}

impl Fragmenter {
    pub fn new(ceiling: usize) -> Self {
        Self { ceiling }
    }

    /// Splits `frame` into one or more payload chunks. `unit_type` is
    /// carried in the low 5 bits of both the single-unit and the
    /// fragment-header bytes; callers with no notion of a unit type pass 0.
    pub fn fragment(&self, frame: &[u8], unit_type: u8) -> Vec<PayloadChunk> {
        if frame.is_empty() {
            return Vec::new();
        }
        if frame.len() <= self.ceiling {
            return vec![PayloadChunk {
                bytes: frame.to_vec(),
                marker: true,
            }];
        }

        let frag_budget = self.ceiling.saturating_sub(FRAGMENT_HEADER_LEN);
        if frag_budget == 0 {
            // Degenerate ceiling; nothing sane to emit.
            return Vec::new();
        }

        let indicator = FRAGMENT_UNIT_TYPE & 0x1F;
        let header_base = unit_type & 0x1F;

        let mut out = Vec::new();
        let mut offset = 0usize;
        let n = frame.len();
        while offset < n {
            let take = (n - offset).min(frag_budget);
            let start = offset == 0;
            let end = offset + take == n;
            let s_bit = if start { 0x80 } else { 0x00 };
            let e_bit = if end { 0x40 } else { 0x00 };
            let fu_header = s_bit | e_bit | header_base;

            let mut bytes = Vec::with_capacity(FRAGMENT_HEADER_LEN + take);
            bytes.push(indicator);
            bytes.push(fu_header);
            bytes.extend_from_slice(&frame[offset..offset + take]);

            out.push(PayloadChunk { bytes, marker: end });
            offset += take;
        }
        out
    }
}

fn is_fragment(payload: &[u8]) -> bool {
    payload.first().is_some_and(|b| b & 0x1F == FRAGMENT_UNIT_TYPE)
}

/// Signed distance `a - b` over 16-bit wrapping sequence space; valid for
/// gaps smaller than 2^15, which the reorder window (default 128) is.
fn seq_diff(a: u16, b: u16) -> i32 {
    (a.wrapping_sub(b) as i16) as i32
}

struct Slot {
    timestamp: u32,
    fragments: HashMap<u16, Vec<u8>>,
    start_seq: Option<u16>,
    end_seq: Option<u16>,
    highest_seq: u16,
    seen_any: bool,
}

impl Slot {
    fn new(timestamp: u32) -> Self {
        Self {
            timestamp,
            fragments: HashMap::new(),
            start_seq: None,
            end_seq: None,
            highest_seq: 0,
            seen_any: false,
        }
    }

    fn touch_highest(&mut self, seq: u16) {
        if !self.seen_any || seq_diff(seq, self.highest_seq) > 0 {
            self.highest_seq = seq;
        }
        self.seen_any = true;
    }

    fn is_complete(&self) -> bool {
        let (Some(s), Some(e)) = (self.start_seq, self.end_seq) else {
            return false;
        };
        let mut seq = s;
        loop {
            if !self.fragments.contains_key(&seq) {
                return false;
            }
            if seq == e {
                return true;
            }
            seq = seq.wrapping_add(1);
        }
    }

    fn assemble(&self) -> Vec<u8> {
        let mut out = Vec::new();
        let mut seq = self.start_seq.expect("checked by is_complete");
        let end = self.end_seq.expect("checked by is_complete");
        loop {
            out.extend_from_slice(&self.fragments[&seq]);
            if seq == end {
                break;
            }
            seq = seq.wrapping_add(1);
        }
        out
    }
}

/// Reassembles fragmented frames, one reassembly slot per RTP timestamp.
/// Completion is triggered by the end-flagged fragment or by the arrival of
/// a higher timestamp (flush-on-advance), whichever comes first.
pub struct Defragmenter {
    reorder_window: u16,
    slot: Option<Slot>,
}

impl Defragmenter {
    pub fn new(reorder_window: u16) -> Self {
        Self {
            reorder_window,
            slot: None,
        }
    }

    pub fn with_default_window() -> Self {
        Self::new(DEFAULT_REORDER_WINDOW)
    }

    /// Feeds one inbound RTP payload. Returns the reassembled frame once
    /// complete (on the end fragment, or flushed out by a timestamp
    /// advance that leaves the previous slot incomplete — which is
    /// reported as dropped, i.e. returns `None` for that advance).
    pub fn push(&mut self, payload: &[u8], marker: bool, timestamp: u32, seq: u16) -> Option<Vec<u8>> {
        if self.slot.as_ref().is_some_and(|s| s.timestamp != timestamp) {
            // flush-on-advance: a new timestamp arrived before the old slot
            // finished: the old partial frame is discarded.
            self.slot = None;
        }
        if self.slot.is_none() {
            self.slot = Some(Slot::new(timestamp));
        }

        if !is_fragment(payload) {
            // Single-unit packet sharing this path (ceiling not exceeded).
            self.slot = None;
            return if marker && !payload.is_empty() {
                Some(payload.to_vec())
            } else {
                None
            };
        }

        let slot = self.slot.as_mut().expect("just ensured Some");
        slot.touch_highest(seq);

        if seq_diff(slot.highest_seq, seq) > self.reorder_window as i32 {
            // Too far behind the window; drop this fragment silently.
            return None;
        }
        if payload.len() < FRAGMENT_HEADER_LEN {
            return None;
        }

        let fu_header = payload[1];
        let start = fu_header & 0x80 != 0;
        let end = fu_header & 0x40 != 0;

        if start {
            slot.start_seq = Some(seq);
        }
        if end {
            slot.end_seq = Some(seq);
        }
        slot.fragments.insert(seq, payload[FRAGMENT_HEADER_LEN..].to_vec());

        // Completion depends only on having every fragment from start_seq to
        // end_seq, not on whether the fragment that just arrived happened to
        // carry the marker bit: the end fragment can arrive before a missing
        // middle one.
        if slot.is_complete() {
            let frame = slot.assemble();
            self.slot = None;
            return Some(frame);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(ceiling: usize, frame: &[u8], seq_start: u16) -> Option<Vec<u8>> {
        let chunks = Fragmenter::new(ceiling).fragment(frame, 0);
        let mut d = Defragmenter::new(128);
        let mut seq = seq_start;
        let mut out = None;
        for ch in chunks {
            let r = d.push(&ch.bytes, ch.marker, 1000, seq);
            if r.is_some() {
                out = r;
            }
            seq = seq.wrapping_add(1);
        }
        out
    }

    #[test]
    fn small_frame_single_chunk() {
        let frame = vec![1, 2, 3];
        let chunks = Fragmenter::new(1400).fragment(&frame, 0);
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].marker);
        assert_eq!(chunks[0].bytes, frame);
    }

    #[test]
    fn large_frame_fragments_and_reassembles() {
        let frame: Vec<u8> = (0u32..4000).map(|x| x as u8).collect();
        let out = round_trip(600, &frame, 1000).expect("must reassemble");
        assert_eq!(out, frame);
    }

    #[test]
    fn out_of_order_within_window_still_reassembles() {
        let frame: Vec<u8> = (0u32..4000).map(|x| x as u8).collect();
        let chunks = Fragmenter::new(600).fragment(&frame, 0);
        assert!(chunks.len() >= 5);

        let mut order: Vec<usize> = (0..chunks.len()).collect();
        order.swap(2, 4);

        let mut d = Defragmenter::new(128);
        let seq_start = 7000u16;
        let mut out = None;
        for idx in order {
            let seq = seq_start.wrapping_add(idx as u16);
            let r = d.push(&chunks[idx].bytes, chunks[idx].marker, 5000, seq);
            if r.is_some() {
                out = r;
            }
        }
        assert_eq!(out.unwrap(), frame);
    }

    #[test]
    fn end_fragment_before_middle_still_reassembles() {
        let frame: Vec<u8> = (0u32..2000).map(|x| x as u8).collect();
        let chunks = Fragmenter::new(600).fragment(&frame, 0);
        assert!(chunks.len() >= 3, "need at least start/middle/end fragments");

        let mut d = Defragmenter::new(128);
        let seq_start = 500u16;
        let last = chunks.len() - 1;

        // Deliver the marker-bearing end fragment first; the slot is still
        // missing earlier fragments so it must not complete yet.
        let out_on_end = d.push(
            &chunks[last].bytes,
            chunks[last].marker,
            4000,
            seq_start + last as u16,
        );
        assert!(out_on_end.is_none());

        // Deliver every remaining fragment (all marker=false); the frame
        // must complete as soon as the last missing piece lands, without
        // needing another marker-bearing packet.
        let mut out = None;
        for idx in 0..last {
            let seq = seq_start + idx as u16;
            let r = d.push(&chunks[idx].bytes, chunks[idx].marker, 4000, seq);
            if r.is_some() {
                out = r;
            }
        }
        assert_eq!(out.unwrap(), frame);
    }

    #[test]
    fn fragment_beyond_reorder_window_is_dropped() {
        let frame: Vec<u8> = (0u32..4000).map(|x| x as u8).collect();
        let chunks = Fragmenter::new(600).fragment(&frame, 0);
        assert!(chunks.len() >= 3);

        let mut d = Defragmenter::new(2);
        let seq_start = 1u16;
        // Deliver the last fragment first with a far seq number to push
        // highest_seq forward, then deliver fragment 0 far behind the window.
        d.push(
            &chunks[chunks.len() - 1].bytes,
            chunks[chunks.len() - 1].marker,
            9000,
            seq_start + 200,
        );
        let r = d.push(&chunks[0].bytes, chunks[0].marker, 9000, seq_start);
        assert!(r.is_none());
    }

    #[test]
    fn timestamp_advance_discards_incomplete_frame() {
        let frame: Vec<u8> = (0u32..4000).map(|x| x as u8).collect();
        let chunks = Fragmenter::new(600).fragment(&frame, 0);
        let mut d = Defragmenter::new(128);
        // push only the first fragment for ts=1, then advance to ts=2
        let r1 = d.push(&chunks[0].bytes, chunks[0].marker, 1, 10);
        assert!(r1.is_none());
        let r2 = d.push(&chunks[0].bytes, chunks[0].marker, 2, 20);
        assert!(r2.is_none());
    }
}
