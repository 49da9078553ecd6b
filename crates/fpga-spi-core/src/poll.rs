//! Status polling policy

/// Default delay between status reads
pub const DEFAULT_POLL_INTERVAL_US: u32 = 8;

/// How long to wait for a STATUS flag
///
/// With no timeout the wait blocks until the flag appears, matching the
/// behaviour of the hardware library. A timeout turns a stuck peripheral into
/// [`Error::Timeout`](crate::Error::Timeout) instead of a hang.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Give up after this many microseconds (`None` waits forever)
    pub timeout_us: Option<u32>,
    /// Delay between reads in microseconds
    pub interval_us: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::blocking()
    }
}

impl PollPolicy {
    /// Wait without a timeout
    pub const fn blocking() -> Self {
        Self {
            timeout_us: None,
            interval_us: DEFAULT_POLL_INTERVAL_US,
        }
    }

    /// Wait at most `timeout_us` microseconds
    pub const fn with_timeout_us(timeout_us: u32) -> Self {
        Self {
            timeout_us: Some(timeout_us),
            interval_us: DEFAULT_POLL_INTERVAL_US,
        }
    }

    /// Set the delay between reads
    pub const fn interval_us(mut self, interval_us: u32) -> Self {
        self.interval_us = interval_us;
        self
    }
}

/// Remaining budget of a single wait
#[derive(Debug, Clone, Copy)]
pub(crate) struct Deadline {
    remaining_us: Option<u32>,
}

impl Deadline {
    pub(crate) fn new(policy: &PollPolicy) -> Self {
        Self {
            remaining_us: policy.timeout_us,
        }
    }

    pub(crate) fn expired(&self) -> bool {
        self.remaining_us == Some(0)
    }

    pub(crate) fn consume(&mut self, us: u32) {
        if let Some(remaining) = self.remaining_us.as_mut() {
            // a zero interval still has to make progress towards the timeout
            *remaining = remaining.saturating_sub(us.max(1));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocking_never_expires() {
        let mut deadline = Deadline::new(&PollPolicy::blocking());
        for _ in 0..1000 {
            deadline.consume(u32::MAX);
        }
        assert!(!deadline.expired());
    }

    #[test]
    fn test_timeout_expires() {
        let policy = PollPolicy::with_timeout_us(20).interval_us(8);
        let mut deadline = Deadline::new(&policy);
        deadline.consume(policy.interval_us);
        deadline.consume(policy.interval_us);
        assert!(!deadline.expired());
        deadline.consume(policy.interval_us);
        assert!(deadline.expired());
    }

    #[test]
    fn test_zero_interval_still_times_out() {
        let policy = PollPolicy::with_timeout_us(3).interval_us(0);
        let mut deadline = Deadline::new(&policy);
        for _ in 0..3 {
            deadline.consume(policy.interval_us);
        }
        assert!(deadline.expired());
    }
}
