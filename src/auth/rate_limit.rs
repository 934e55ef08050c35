use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Keyed token bucket. Buckets refill continuously; a request that finds no
/// token is refused rather than queued.
#[derive(Debug)]
pub struct RateLimiter {
    capacity: f64,
    period_secs: f64,
    // each key models a bucket by the time of last refill and the current tokens
    buckets: Mutex<HashMap<String, (f64, Instant)>>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, period: Duration) -> Self {
        Self {
            capacity: max_requests as f64,
            period_secs: period.as_secs_f64(),
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// Take one token from the key's bucket. Returns false when the bucket
    /// is empty.
    pub async fn try_acquire(&self, key: &str) -> bool {
        let mut buckets = self.buckets.lock().await;
        let now = Instant::now();
        let entry = buckets
            .entry(key.to_string())
            .or_insert((self.capacity, now));
        let (ref mut tokens, ref mut last) = *entry;

        let elapsed = now.duration_since(*last).as_secs_f64();
        let refill_rate = self.capacity / self.period_secs; // tokens per second
        *tokens = (*tokens + elapsed * refill_rate).min(self.capacity);
        *last = now;

        if *tokens >= 1.0 {
            *tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// One bucket set per auth endpoint, keyed by login.
#[derive(Debug)]
pub struct AuthRateLimits {
    pub register: RateLimiter,
    pub send_verification: RateLimiter,
    pub verify: RateLimiter,
    pub login: RateLimiter,
    pub refresh: RateLimiter,
    pub reset_password: RateLimiter,
}

impl Default for AuthRateLimits {
    fn default() -> Self {
        Self {
            register: RateLimiter::new(5, Duration::from_secs(60 * 60)),
            send_verification: RateLimiter::new(3, Duration::from_secs(15 * 60)),
            verify: RateLimiter::new(3, Duration::from_secs(15 * 60)),
            login: RateLimiter::new(5, Duration::from_secs(15 * 60)),
            refresh: RateLimiter::new(5, Duration::from_secs(15 * 60)),
            reset_password: RateLimiter::new(3, Duration::from_secs(60 * 60)),
        }
    }
}
