//! Request pacing for the enrichment stage.
//!
//! External generation services rate-limit aggressively, so batches are
//! spaced out by a fixed interval. [`Pacer`] is a small fixed-window
//! limiter decoupled from batch boundaries: callers acquire a slot before
//! each unit of work, and the first acquisition is always immediate, so
//! nothing ever blocks after the final unit.

use std::time::Duration;
use tokio::time::Instant;

/// Default spacing between enrichment batches.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

/// Fixed-interval pacer: consecutive [`acquire`](Pacer::acquire) calls are
/// spaced at least `interval` apart.
#[derive(Debug)]
pub struct Pacer {
    interval: Duration,
    last: Option<Instant>,
}

impl Pacer {
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Waits until the current window has elapsed, then claims the next
    /// one. The first call returns immediately.
    pub async fn acquire(&mut self) {
        if let Some(last) = self.last {
            let elapsed = last.elapsed();
            if elapsed < self.interval {
                tokio::time::sleep(self.interval - elapsed).await;
            }
        }
        self.last = Some(Instant::now());
    }
}

impl Default for Pacer {
    fn default() -> Self {
        Self::new(DEFAULT_INTERVAL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn first_acquire_is_immediate() {
        let mut pacer = Pacer::new(Duration::from_secs(5));
        let before = Instant::now();
        pacer.acquire().await;
        assert_eq!(before.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn consecutive_acquires_are_spaced() {
        let mut pacer = Pacer::new(Duration::from_secs(1));
        let start = Instant::now();
        pacer.acquire().await;
        pacer.acquire().await;
        pacer.acquire().await;
        assert!(start.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_work_consumes_the_window() {
        let mut pacer = Pacer::new(Duration::from_secs(1));
        pacer.acquire().await;
        tokio::time::sleep(Duration::from_secs(3)).await;
        let before = Instant::now();
        pacer.acquire().await;
        assert_eq!(before.elapsed(), Duration::ZERO);
    }
}
