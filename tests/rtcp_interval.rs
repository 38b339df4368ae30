//! End-to-end RTCP scheduling: a worker left alone past its self-scheduled
//! deadline emits a well-formed compound report carrying its CNAME (spec
//! §4.4/§8, RFC 3550 §6.3).

use std::sync::Arc;
use std::time::Duration;

use mediapath::log::NoopLogSink;
use mediapath::rtcp::config::{DEFAULT_RTCP_BANDWIDTH_FRACTION, DEFAULT_SESSION_BANDWIDTH_BPS};
use mediapath::rtcp::RtcpPacket;
use mediapath::session::RtcpWorker;
use mediapath::socket::Socket;

#[test]
fn worker_emits_compound_report_carrying_cname_within_a_few_intervals() {
    let observer = Socket::bind(0, false, Arc::new(NoopLogSink)).unwrap();
    let observer_addr = observer.local_addr().unwrap();

    let worker_socket = Arc::new(Socket::bind(0, false, Arc::new(NoopLogSink)).unwrap());
    worker_socket.connect(observer_addr);

    let mut worker = RtcpWorker::new(
        0xCAFEBABE,
        "reporter@test",
        DEFAULT_SESSION_BANDWIDTH_BPS / 8.0 * DEFAULT_RTCP_BANDWIDTH_FRACTION,
        worker_socket,
        Arc::new(NoopLogSink),
    );
    worker.note_local_send(160);

    let mut buf = vec![0u8; 1500];
    let mut received = None;
    for _ in 0..10 {
        match observer.recv_timeout(&mut buf, Duration::from_millis(500)) {
            Ok(Some((n, _))) => {
                received = Some(buf[..n].to_vec());
                break;
            }
            Ok(None) => continue,
            Err(e) => panic!("observer recv failed: {e:?}"),
        }
    }

    let packets = RtcpPacket::decode_compound(&received.expect("a report must arrive")).unwrap();
    assert!(packets.iter().any(|p| matches!(p, RtcpPacket::Sr(_))));
    assert!(packets.iter().any(|p| matches!(p, RtcpPacket::Sdes(sdes)
        if sdes.chunks.iter().any(|c| c.ssrc == 0xCAFEBABE))));

    worker.terminate().unwrap();
}

#[test]
fn send_bye_bypasses_the_scheduler() {
    let observer = Socket::bind(0, false, Arc::new(NoopLogSink)).unwrap();
    let observer_addr = observer.local_addr().unwrap();

    let worker_socket = Arc::new(Socket::bind(0, false, Arc::new(NoopLogSink)).unwrap());
    worker_socket.connect(observer_addr);

    let mut worker = RtcpWorker::new(
        0xABCDEF01,
        "bye-test@test",
        DEFAULT_SESSION_BANDWIDTH_BPS / 8.0 * DEFAULT_RTCP_BANDWIDTH_FRACTION,
        worker_socket,
        Arc::new(NoopLogSink),
    );

    worker.send_bye(Some("done".into())).unwrap();

    let mut buf = vec![0u8; 1500];
    let (n, _) = observer
        .recv_timeout(&mut buf, Duration::from_secs(1))
        .unwrap()
        .expect("bye must arrive immediately");
    let packets = RtcpPacket::decode_compound(&buf[..n]).unwrap();
    assert!(packets
        .iter()
        .any(|p| matches!(p, RtcpPacket::Bye(bye) if bye.sources.contains(&0xABCDEF01))));

    worker.terminate().unwrap();
}
