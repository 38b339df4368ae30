//! End-to-end echo between two `Context`-issued sessions over real UDP
//! sockets on loopback (spec §8's "basic echo" scenario).

use std::sync::Arc;

use mediapath::context::Context;
use mediapath::log::NoopLogSink;

#[test]
fn sessions_exchange_frames_both_directions() {
    let ctx = Context::new(Arc::new(NoopLogSink));
    ctx.configure_bool("allow-reuseaddr").unwrap();

    let alice = ctx.create_session();
    let idx_alice = alice
        .add_media_stream(0, "127.0.0.1:1".parse().unwrap(), 96, 160, "alice@test")
        .unwrap();

    let bob = ctx.create_session();
    let idx_bob = bob
        .add_media_stream(0, "127.0.0.1:1".parse().unwrap(), 96, 160, "bob@test")
        .unwrap();

    let bob_addr = bob.stream_local_addr(idx_bob).unwrap();
    let alice_addr = alice.stream_local_addr(idx_alice).unwrap();
    alice.reconnect_stream(idx_alice, bob_addr).unwrap();
    bob.reconnect_stream(idx_bob, alice_addr).unwrap();

    // Spec §8 scenario 1: a run of same-size frames crosses byte-for-byte
    // and in order.
    const FRAME_COUNT: u8 = 20;
    for i in 0..FRAME_COUNT {
        let frame = vec![i; 800];
        alice.push_frame(idx_alice, frame.clone()).unwrap();
        assert_eq!(bob.pull_frame(idx_bob), Some(frame));
    }

    bob.push_frame(idx_bob, b"hello alice".to_vec()).unwrap();
    assert_eq!(alice.pull_frame(idx_alice), Some(b"hello alice".to_vec()));

    assert_ne!(alice.local_ssrc(), bob.local_ssrc());
}

#[test]
fn media_stream_reconnect_enables_echo() {
    use mediapath::config::ContextConfig;
    use mediapath::media_stream::{MediaStream, MediaStreamConfig};

    let mut ctx_cfg = ContextConfig::default();
    ctx_cfg.enable_rtcp = false;

    let alice = MediaStream::new(
        MediaStreamConfig {
            local_port: 0,
            remote_addr: "127.0.0.1:1".parse().unwrap(),
            local_ssrc: 0x1111_1111,
            payload_type: 96,
            timestamp_increment: 160,
            clock_rate_hz: 8_000,
            cname: "alice@test".into(),
        },
        &ctx_cfg,
        Arc::new(NoopLogSink),
    )
    .unwrap();

    let bob = MediaStream::new(
        MediaStreamConfig {
            local_port: 0,
            remote_addr: "127.0.0.1:1".parse().unwrap(),
            local_ssrc: 0x2222_2222,
            payload_type: 96,
            timestamp_increment: 160,
            clock_rate_hz: 8_000,
            cname: "bob@test".into(),
        },
        &ctx_cfg,
        Arc::new(NoopLogSink),
    )
    .unwrap();

    alice.reconnect(bob.local_addr().unwrap());
    bob.reconnect(alice.local_addr().unwrap());

    alice.push_frame(b"ping".to_vec()).unwrap();
    assert_eq!(bob.pull_frame(), Some(b"ping".to_vec()));

    bob.push_frame(b"pong".to_vec()).unwrap();
    assert_eq!(alice.pull_frame(), Some(b"pong".to_vec()));
}
