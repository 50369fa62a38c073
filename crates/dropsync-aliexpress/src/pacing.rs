//! Token-bucket pacing for gateway calls.
//!
//! The gateway enforces per-app call quotas and bans bursty clients, so
//! every call site acquires a token before sending. The bucket allows a
//! configured burst and then settles to the sustained rate; waiting is done
//! on the tokio clock, so tests with a paused runtime stay deterministic.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

/// Token-bucket rate limiter.
#[derive(Debug)]
pub struct RequestPacer {
    capacity: f64,
    refill_per_sec: f64,
    state: Mutex<BucketState>,
}

impl RequestPacer {
    /// Creates a pacer allowing bursts of `burst` requests and a sustained
    /// rate of `requests_per_sec`.
    ///
    /// Non-positive or non-finite inputs are clamped to a minimal sane
    /// configuration (1 request burst, one request per 10 seconds) rather
    /// than panicking; config validation happens upstream.
    #[must_use]
    pub fn new(requests_per_sec: f64, burst: u32) -> Self {
        let refill_per_sec = if requests_per_sec.is_finite() && requests_per_sec > 0.0 {
            requests_per_sec
        } else {
            0.1
        };
        let capacity = f64::from(burst.max(1));
        Self {
            capacity,
            refill_per_sec,
            state: Mutex::new(BucketState {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
        }
    }

    /// Waits until a request token is available and consumes it.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut state = self.state.lock().await;
                let now = Instant::now();
                let elapsed = now.duration_since(state.last_refill).as_secs_f64();
                state.tokens = (state.tokens + elapsed * self.refill_per_sec).min(self.capacity);
                state.last_refill = now;

                if state.tokens >= 1.0 {
                    state.tokens -= 1.0;
                    return;
                }
                // Time until one full token accrues.
                Duration::from_secs_f64((1.0 - state.tokens) / self.refill_per_sec)
            };
            tokio::time::sleep(wait).await;
        }
    }
}
