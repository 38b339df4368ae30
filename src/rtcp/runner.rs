//! Self-rescheduling RTCP reporting timer (RFC 3550 §6.3).
//!
//! `RtcpRunner` owns membership bookkeeping and the randomized interval
//! computation; it does not itself block or sleep. A caller polls
//! `due`/`next_deadline` from its own timer loop and calls `generate_report`
//! when the interval elapses, supplying the report blocks a receiver-side
//! tracker has already computed.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use rand::Rng;

use super::bye::Bye;
use super::config::{
    RTCP_COMPENSATION, RTCP_MIN_INITIAL_INTERVAL_SECS, RTCP_MIN_INTERVAL_SECS,
    SENDER_BANDWIDTH_FRACTION,
};
use super::receiver_report::ReceiverReport;
use super::report_block::ReportBlock;
use super::rtcp::RtcpPacket;
use super::sdes::Sdes;
use super::sender_info::SenderInfo;
use super::sender_report::SenderReport;

#[derive(Debug, Clone)]
struct Participant {
    is_sender: bool,
    last_active: Instant,
}

pub struct RtcpRunner {
    local_ssrc: u32,
    cname: String,
    members: HashMap<u32, Participant>,
    pmembers: usize,
    senders: usize,
    we_sent: bool,
    initial: bool,
    avg_rtcp_size: f64,
    rtcp_bw: f64,
    tp: Instant,
    tn: Instant,
    sent_packets: u32,
    sent_octets: u32,
}

impl RtcpRunner {
    /// `rtcp_bw` is the RTCP bandwidth share in bytes/sec, already scaled by
    /// whatever fraction of session bandwidth the caller allots to RTCP.
    pub fn new(local_ssrc: u32, cname: impl Into<String>, rtcp_bw: f64, now: Instant) -> Self {
        Self {
            local_ssrc,
            cname: cname.into(),
            members: HashMap::new(),
            pmembers: 1,
            senders: 0,
            we_sent: false,
            initial: true,
            avg_rtcp_size: 200.0,
            rtcp_bw,
            tp: now,
            tn: now + Duration::from_secs_f64(RTCP_MIN_INITIAL_INTERVAL_SECS),
            sent_packets: 0,
            sent_octets: 0,
        }
    }

    pub fn add_participant(&mut self, ssrc: u32, now: Instant) {
        self.members.entry(ssrc).or_insert(Participant {
            is_sender: false,
            last_active: now,
        });
    }

    pub fn note_activity(&mut self, ssrc: u32, now: Instant) {
        let entry = self.members.entry(ssrc).or_insert(Participant {
            is_sender: false,
            last_active: now,
        });
        entry.last_active = now;
    }

    pub fn note_sender_packet(&mut self, ssrc: u32, now: Instant) {
        let was_sender;
        {
            let entry = self.members.entry(ssrc).or_insert(Participant {
                is_sender: false,
                last_active: now,
            });
            was_sender = entry.is_sender;
            entry.is_sender = true;
            entry.last_active = now;
        }
        if !was_sender {
            self.senders += 1;
        }
    }

    /// RFC 3550 §6.3.4: on receiving a BYE, remove the member and, if the
    /// group has shrunk since the last scheduling pass, pull the next
    /// transmission forward proportionally instead of waiting out an
    /// interval sized for the old, larger membership.
    pub fn note_bye(&mut self, ssrc: u32, now: Instant) {
        if let Some(p) = self.members.remove(&ssrc) {
            if p.is_sender {
                self.senders = self.senders.saturating_sub(1);
            }
        }
        let members = self.members.len() + 1;
        if members < self.pmembers && self.pmembers > 0 {
            let remaining = self.tn.saturating_duration_since(now);
            let scaled = remaining.mul_f64(members as f64 / self.pmembers as f64);
            self.tn = now + scaled;
            self.pmembers = members;
        }
    }

    /// RFC 3550 §6.3.5: drop members that have gone silent for `timeout`
    /// (the recommended value is 5 reporting intervals).
    pub fn prune_timed_out(&mut self, now: Instant, timeout: Duration) {
        self.members
            .retain(|_, p| now.duration_since(p.last_active) < timeout);
        let members = self.members.len() + 1;
        if members < self.pmembers {
            self.pmembers = members;
        }
    }

    fn interval(&self) -> Duration {
        let members = self.members.len() + 1;
        let n = if self.we_sent
            && self.senders < ((members as f64) * SENDER_BANDWIDTH_FRACTION) as usize
        {
            self.senders.max(1)
        } else {
            members
        };
        let rtcp_min = if self.initial {
            RTCP_MIN_INITIAL_INTERVAL_SECS
        } else {
            RTCP_MIN_INTERVAL_SECS
        };
        let t = (self.avg_rtcp_size * n as f64 / self.rtcp_bw).max(rtcp_min);
        let factor = rand::thread_rng().gen_range(0.5..1.5);
        Duration::from_secs_f64((t * factor / RTCP_COMPENSATION).max(0.0))
    }

    /// Call after each report is sent to arm the next deadline.
    pub fn schedule_next(&mut self, now: Instant) {
        self.tp = now;
        self.tn = now + self.interval();
        self.pmembers = self.members.len() + 1;
    }

    pub fn due(&self, now: Instant) -> bool {
        now >= self.tn
    }

    pub fn next_deadline(&self) -> Instant {
        self.tn
    }

    pub fn last_sent(&self) -> Instant {
        self.tp
    }

    /// Updates the running average packet size used by the interval formula
    /// (RFC 3550 §6.3.3's exponential moving average, weight 1/16).
    pub fn record_packet_size(&mut self, bytes: usize) {
        self.avg_rtcp_size = (1.0 / 16.0) * bytes as f64 + (15.0 / 16.0) * self.avg_rtcp_size;
        self.initial = false;
    }

    pub fn note_local_send(&mut self, packet_bytes: usize) {
        self.we_sent = true;
        self.sent_packets += 1;
        self.sent_octets = self.sent_octets.saturating_add(packet_bytes as u32);
    }

    /// Builds the compound report (SR if this endpoint has sent media since
    /// the last report, RR otherwise, plus a CNAME SDES chunk).
    pub fn generate_report(
        &self,
        report_blocks: Vec<ReportBlock>,
        ntp_msw: u32,
        ntp_lsw: u32,
        rtp_ts: u32,
    ) -> Vec<RtcpPacket> {
        let mut pkts = Vec::with_capacity(2);
        if self.we_sent {
            let info = SenderInfo {
                ntp_msw,
                ntp_lsw,
                rtp_ts,
                packet_count: self.sent_packets,
                octet_count: self.sent_octets,
            };
            pkts.push(RtcpPacket::Sr(SenderReport::new(
                self.local_ssrc,
                info,
                report_blocks,
            )));
        } else {
            pkts.push(RtcpPacket::Rr(ReceiverReport::new(
                self.local_ssrc,
                report_blocks,
            )));
        }
        pkts.push(RtcpPacket::Sdes(Sdes::cname(self.local_ssrc, self.cname.clone())));
        pkts
    }

    pub fn generate_bye(&self, reason: Option<String>) -> RtcpPacket {
        RtcpPacket::Bye(Bye::single(self.local_ssrc, reason))
    }

    pub fn member_count(&self) -> usize {
        self.members.len() + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_respects_initial_minimum() {
        let now = Instant::now();
        let runner = RtcpRunner::new(1, "test@example.com", 800.0, now);
        assert!(runner.interval() >= Duration::from_secs_f64(0.0));
    }

    #[test]
    fn reverse_reconsideration_pulls_tn_forward() {
        let now = Instant::now();
        let mut runner = RtcpRunner::new(1, "a", 800.0, now);
        for ssrc in 2..=10 {
            runner.add_participant(ssrc, now);
        }
        runner.schedule_next(now);
        let far_future = runner.next_deadline();
        assert!(far_future > now);

        for ssrc in 2..=9 {
            runner.note_bye(ssrc, now + Duration::from_millis(10));
        }
        let pulled_in = runner.next_deadline();
        assert!(pulled_in <= far_future);
        assert_eq!(runner.member_count(), 2);
    }

    #[test]
    fn sender_packet_marks_we_sent() {
        let now = Instant::now();
        let mut runner = RtcpRunner::new(1, "a", 800.0, now);
        runner.note_local_send(200);
        assert!(runner.we_sent);
        let pkts = runner.generate_report(vec![], 0, 0, 0);
        assert!(matches!(pkts[0], RtcpPacket::Sr(_)));
    }
}
