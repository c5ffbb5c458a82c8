use std::time::Duration;

/// Exponential backoff schedule for rate limited completion
/// requests. The delay doubles after each retry with no jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_delay: Duration::from_millis(2000),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, initial_delay: Duration) -> Self {
        Self {
            max_retries,
            initial_delay,
        }
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn initial_delay(&self) -> Duration {
        self.initial_delay
    }

    /// Waits before each retry, in order
    pub fn delays(&self) -> Delays {
        Delays {
            remaining: self.max_retries,
            next: self.initial_delay,
        }
    }

    /// Worst case time spent waiting before giving up
    pub fn max_total_delay(&self) -> Duration {
        self.delays()
            .fold(Duration::ZERO, |total, d| total.saturating_add(d))
    }
}

#[derive(Debug, Clone)]
pub struct Delays {
    remaining: u32,
    next: Duration,
}

impl Iterator for Delays {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let delay = self.next;
        self.next = self.next.saturating_mul(2);
        Some(delay)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining as usize;
        (n, Some(n))
    }
}

impl ExactSizeIterator for Delays {}
