//! Shared token-bucket rate limiter for outgoing provider requests

use tokio::sync::Mutex;
use tokio::time::{sleep, Duration, Instant};
use tracing::debug;

/// Token bucket shared by all concurrent dispatchers of a service.
///
/// Refills continuously at `rate` tokens per second with a burst
/// capacity of one second's worth of tokens. `acquire` suspends the
/// caller until a token is available, so no more than `rate` requests
/// leave the process per second.
#[derive(Debug)]
pub struct RateLimiter {
    rate: f64,
    capacity: f64,
    state: Mutex<BucketState>,
}

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

impl RateLimiter {
    /// Create a limiter allowing `rate` requests per second
    pub fn new(rate: f64) -> Self {
        let rate = rate.max(0.001);
        Self {
            rate,
            capacity: rate.max(1.0),
            state: Mutex::new(BucketState {
                tokens: rate.max(1.0),
                last_refill: Instant::now(),
            }),
        }
    }

    /// Wait until a request token is available, then consume it
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut state = self.state.lock().await;
                let now = Instant::now();
                let elapsed = now.duration_since(state.last_refill).as_secs_f64();
                state.tokens = (state.tokens + elapsed * self.rate).min(self.capacity);
                state.last_refill = now;

                if state.tokens >= 1.0 {
                    state.tokens -= 1.0;
                    return;
                }
                Duration::from_secs_f64((1.0 - state.tokens) / self.rate)
            };

            debug!("Rate limiter throttling for {:?}", wait);
            sleep(wait).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_burst_within_capacity_is_immediate() {
        let limiter = RateLimiter::new(5.0);
        let start = Instant::now();
        for _ in 0..5 {
            limiter.acquire().await;
        }
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_bucket_throttles() {
        let limiter = RateLimiter::new(2.0);
        let start = Instant::now();
        for _ in 0..4 {
            limiter.acquire().await;
        }
        // Two tokens of burst, then two refills at 0.5s each
        assert!(start.elapsed() >= Duration::from_millis(900));
    }
}
