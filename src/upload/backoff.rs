use std::time::Duration;

pub const DEFAULT_INITIAL: Duration = Duration::from_millis(1000);
pub const DEFAULT_MAX: Duration = Duration::from_millis(5000);

/// Delay between status polls: starts at `initial`, doubles after every
/// non-terminal tick, never exceeds `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    max: Duration,
    next: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(DEFAULT_INITIAL, DEFAULT_MAX)
    }
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        let initial = initial.min(max);
        Self { max, next: initial }
    }

    pub fn next_delay(&mut self) -> Duration {
        let delay = self.next;
        self.next = self.next.saturating_mul(2).min(self.max);
        delay
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doubles_up_to_the_cap() {
        let mut backoff = Backoff::default();
        let delays: Vec<u128> = (0..6).map(|_| backoff.next_delay().as_millis()).collect();
        assert_eq!(delays, vec![1000, 2000, 4000, 5000, 5000, 5000]);
    }

    #[test]
    fn initial_above_max_is_clamped() {
        let mut backoff = Backoff::new(Duration::from_secs(10), Duration::from_secs(3));
        assert_eq!(backoff.next_delay(), Duration::from_secs(3));
        assert_eq!(backoff.next_delay(), Duration::from_secs(3));
    }
}
