//! Retransmission timing per RFC 6189 §5.8: T1 doubles up to a ceiling
//! until either an ack arrives or the phase's total timeout expires.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
pub struct RetransmitPolicy {
    pub t1: Duration,
    pub ceiling: Duration,
    pub total_timeout: Duration,
}

impl RetransmitPolicy {
    pub const HELLO: RetransmitPolicy = RetransmitPolicy {
        t1: Duration::from_millis(50),
        ceiling: Duration::from_millis(200),
        total_timeout: Duration::from_secs(3),
    };

    pub const OTHER: RetransmitPolicy = RetransmitPolicy {
        t1: Duration::from_millis(50),
        ceiling: Duration::from_millis(1200),
        total_timeout: Duration::from_secs(10),
    };
}

/// Drives one message's exponential-backoff retransmission schedule.
pub struct RetransmitTimer {
    policy: RetransmitPolicy,
    started_at: Instant,
    next_at: Instant,
    current_interval: Duration,
}

impl RetransmitTimer {
    pub fn start(policy: RetransmitPolicy, now: Instant) -> Self {
        Self {
            policy,
            started_at: now,
            next_at: now + policy.t1,
            current_interval: policy.t1,
        }
    }

    /// Returns `true` if the phase's total timeout has elapsed.
    pub fn timed_out(&self, now: Instant) -> bool {
        now.duration_since(self.started_at) >= self.policy.total_timeout
    }

    /// Returns `true` and advances the schedule if a retransmit is due.
    pub fn due(&mut self, now: Instant) -> bool {
        if now < self.next_at {
            return false;
        }
        self.current_interval = (self.current_interval * 2).min(self.policy.ceiling);
        self.next_at = now + self.current_interval;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doubles_up_to_ceiling() {
        let start = Instant::now();
        let mut timer = RetransmitTimer::start(RetransmitPolicy::HELLO, start);
        assert_eq!(timer.current_interval, Duration::from_millis(50));
        timer.due(start + Duration::from_millis(50));
        assert_eq!(timer.current_interval, Duration::from_millis(100));
        timer.due(start + Duration::from_millis(150));
        assert_eq!(timer.current_interval, Duration::from_millis(200));
        timer.due(start + Duration::from_millis(350));
        assert_eq!(timer.current_interval, Duration::from_millis(200));
    }

    #[test]
    fn total_timeout_respected() {
        let start = Instant::now();
        let timer = RetransmitTimer::start(RetransmitPolicy::HELLO, start);
        assert!(!timer.timed_out(start + Duration::from_secs(2)));
        assert!(timer.timed_out(start + Duration::from_secs(4)));
    }
}
