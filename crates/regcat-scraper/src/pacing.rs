//! Request pacing for the upstream catalog and image hosts.
//!
//! A [`Pacer`] enforces a minimum interval between consecutive outbound
//! requests. It is shared (`Arc<Pacer>`) by the catalog client and the image
//! relocator so the cap holds across both. Tests use [`Pacer::disabled`].

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

#[derive(Debug)]
pub struct Pacer {
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl Pacer {
    #[must_use]
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }

    /// A pacer that never sleeps.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    #[must_use]
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Waits until at least `min_interval` has passed since the previous
    /// call returned, then records the current instant.
    ///
    /// The first call never waits.
    pub async fn wait(&self) {
        if self.min_interval.is_zero() {
            return;
        }

        let mut last = self.last_request.lock().await;
        if let Some(prev) = *last {
            let ready_at = prev + self.min_interval;
            let now = Instant::now();
            if ready_at > now {
                tracing::trace!(
                    wait_ms = u64::try_from((ready_at - now).as_millis()).unwrap_or(u64::MAX),
                    "pacing upstream request"
                );
                tokio::time::sleep_until(ready_at).await;
            }
        }
        *last = Some(Instant::now());
    }
}

impl Default for Pacer {
    fn default() -> Self {
        Self::disabled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn first_wait_returns_immediately() {
        let pacer = Pacer::from_millis(1000);
        let start = Instant::now();
        pacer.wait().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn second_wait_sleeps_for_remaining_interval() {
        let pacer = Pacer::from_millis(1000);
        pacer.wait().await;
        let start = Instant::now();
        tokio::time::advance(Duration::from_millis(300)).await;
        pacer.wait().await;
        assert!(
            start.elapsed() >= Duration::from_millis(1000),
            "elapsed {:?}",
            start.elapsed()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn no_sleep_once_interval_has_passed() {
        let pacer = Pacer::from_millis(500);
        pacer.wait().await;
        tokio::time::advance(Duration::from_millis(800)).await;
        let start = Instant::now();
        pacer.wait().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn disabled_pacer_never_sleeps() {
        let pacer = Pacer::disabled();
        let start = Instant::now();
        for _ in 0..5 {
            pacer.wait().await;
        }
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert!(pacer.min_interval().is_zero());
    }
}
