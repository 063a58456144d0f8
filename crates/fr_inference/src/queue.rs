use fr_core::{Error, Result};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};
use tokio::time::Instant;
use tracing::debug;

pub const RATE_WINDOW: Duration = Duration::from_secs(60);

/// Admission control for inference calls: a semaphore caps calls in flight
/// and a rolling window caps calls started per `window`.
#[derive(Debug, Clone)]
pub struct DispatchQueue {
    permits: Arc<Semaphore>,
    started: Arc<Mutex<VecDeque<Instant>>>,
    max_per_window: usize,
    window: Duration,
}

impl DispatchQueue {
    pub fn new(concurrency: usize, requests_per_minute: usize) -> Self {
        Self::with_window(concurrency, requests_per_minute, RATE_WINDOW)
    }

    pub fn with_window(concurrency: usize, max_per_window: usize, window: Duration) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(concurrency.max(1))),
            started: Arc::new(Mutex::new(VecDeque::new())),
            max_per_window: max_per_window.max(1),
            window,
        }
    }

    /// Waits for an in-flight slot. The slot is held until the permit drops.
    pub async fn acquire(&self) -> Result<OwnedSemaphorePermit> {
        self.permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| Error::External(e.into()))
    }

    /// Waits until the rolling window has room, then records a call start.
    pub async fn throttle(&self) {
        loop {
            let wait_until = {
                let mut started = self.started.lock().await;
                let now = Instant::now();
                while let Some(oldest) = started.front() {
                    if now.duration_since(*oldest) >= self.window {
                        started.pop_front();
                    } else {
                        break;
                    }
                }
                if started.len() < self.max_per_window {
                    started.push_back(now);
                    return;
                }
                match started.front() {
                    Some(oldest) => *oldest + self.window,
                    None => return,
                }
            };
            debug!("⏳ Request window full, waiting {:?}", wait_until - Instant::now());
            tokio::time::sleep_until(wait_until).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_window_suspends_until_oldest_ages_out() {
        let queue = DispatchQueue::new(4, 2);
        let start = Instant::now();

        queue.throttle().await;
        queue.throttle().await;
        assert!(start.elapsed() < Duration::from_secs(1));

        queue.throttle().await;
        assert!(start.elapsed() >= RATE_WINDOW);
    }

    #[tokio::test]
    async fn test_permits_bound_concurrency() {
        let queue = DispatchQueue::new(2, 100);
        let first = queue.acquire().await.unwrap();
        let _second = queue.acquire().await.unwrap();
        assert_eq!(queue.permits.available_permits(), 0);

        drop(first);
        assert_eq!(queue.permits.available_permits(), 1);
    }
}
