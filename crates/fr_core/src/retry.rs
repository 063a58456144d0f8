//! Shared retry pacing for page fetches and inference calls.

use backoff::ExponentialBackoff;
use std::time::Duration;

/// Doubling delays starting at `initial` and capped at `max_interval`, with no
/// jitter and no elapsed-time limit. Callers bound the attempt count themselves.
pub fn exponential_backoff(initial: Duration, max_interval: Duration) -> ExponentialBackoff {
    ExponentialBackoff {
        current_interval: initial,
        initial_interval: initial,
        max_interval,
        multiplier: 2.0,
        randomization_factor: 0.0,
        max_elapsed_time: None,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backoff::backoff::Backoff;

    #[test]
    fn test_delays_double_until_cap() {
        let mut backoff = exponential_backoff(Duration::from_secs(1), Duration::from_secs(10));
        let delays: Vec<u128> = (0..6)
            .map(|_| backoff.next_backoff().unwrap().as_millis())
            .collect();
        assert_eq!(delays, vec![1_000, 2_000, 4_000, 8_000, 10_000, 10_000]);
    }

    #[test]
    fn test_never_gives_up_on_its_own() {
        let mut backoff = exponential_backoff(Duration::from_millis(1), Duration::from_millis(2));
        assert!((0..50).all(|_| backoff.next_backoff().is_some()));
    }
}
