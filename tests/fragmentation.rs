//! End-to-end fragmentation: a frame larger than the fragmenting ceiling
//! crosses real UDP sockets as multiple RTP packets and reassembles intact
//! on the far side (spec §4.1/§8).

use std::sync::Arc;

use mediapath::config::ContextConfig;
use mediapath::log::NoopLogSink;
use mediapath::media_stream::{MediaStream, MediaStreamConfig};

fn stream_cfg(ssrc: u32) -> MediaStreamConfig {
    MediaStreamConfig {
        local_port: 0,
        remote_addr: "127.0.0.1:1".parse().unwrap(),
        local_ssrc: ssrc,
        payload_type: 97,
        timestamp_increment: 3000,
        clock_rate_hz: mediapath::rtp::config::DEFAULT_CLOCK_RATE_HZ,
        cname: format!("stream-{ssrc}@test"),
    }
}

#[test]
fn oversized_frame_is_fragmented_and_reassembled() {
    let mut ctx_cfg = ContextConfig::default();
    ctx_cfg.enable_rtcp = false;
    ctx_cfg.use_fragmenting_formatter = true;

    let sender_stream = MediaStream::new(stream_cfg(1), &ctx_cfg, Arc::new(NoopLogSink)).unwrap();
    let recv_stream = MediaStream::new(stream_cfg(2), &ctx_cfg, Arc::new(NoopLogSink)).unwrap();

    sender_stream.reconnect(recv_stream.local_addr().unwrap());
    recv_stream.reconnect(sender_stream.local_addr().unwrap());

    // Well over the 1400-byte fragmenting ceiling; must cross as several
    // RTP packets and reassemble bit-for-bit.
    let frame: Vec<u8> = (0..5000u32).map(|x| (x % 256) as u8).collect();
    sender_stream.push_frame(frame.clone()).unwrap();

    let got = recv_stream.pull_frame().expect("frame must reassemble");
    assert_eq!(got, frame);
}

#[test]
fn small_frame_under_ceiling_crosses_as_single_packet() {
    let mut ctx_cfg = ContextConfig::default();
    ctx_cfg.enable_rtcp = false;
    ctx_cfg.use_fragmenting_formatter = true;

    let sender_stream = MediaStream::new(stream_cfg(3), &ctx_cfg, Arc::new(NoopLogSink)).unwrap();
    let recv_stream = MediaStream::new(stream_cfg(4), &ctx_cfg, Arc::new(NoopLogSink)).unwrap();

    sender_stream.reconnect(recv_stream.local_addr().unwrap());
    recv_stream.reconnect(sender_stream.local_addr().unwrap());

    sender_stream.push_frame(vec![7, 7, 7]).unwrap();
    assert_eq!(recv_stream.pull_frame(), Some(vec![7, 7, 7]));
}
