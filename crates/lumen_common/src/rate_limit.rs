//! Minimum-interval rate limiter for outbound search requests.
//!
//! A request arriving sooner than `min_interval` after the previous one waits
//! out the remainder before firing. Slots are reserved under the lock so
//! concurrent callers line up instead of bursting.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};
use tracing::debug;

pub struct RateLimiter {
    min_interval: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            next_slot: Mutex::new(None),
        }
    }

    /// One request per second
    pub fn per_second() -> Self {
        Self::new(Duration::from_secs(1))
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Wait until a request may fire, then reserve the following slot.
    pub async fn acquire(&self) {
        let fire_at = {
            let mut next = self.next_slot.lock().await;
            let now = Instant::now();
            let fire_at = match *next {
                Some(slot) if slot > now => slot,
                _ => now,
            };
            *next = Some(fire_at + self.min_interval);
            fire_at
        };

        if fire_at > Instant::now() {
            debug!(
                "rate limiter: waiting {}ms",
                fire_at.saturating_duration_since(Instant::now()).as_millis()
            );
            sleep_until(fire_at).await;
        }
    }
}
