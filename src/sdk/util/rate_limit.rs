use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use std::sync::Arc;
use std::time::Duration;

pub type Limiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Builds a limiter that lets one request through per `spacing`.
///
/// Returns `None` for a zero spacing, meaning requests are not throttled.
pub fn spacing_limiter(spacing: Duration) -> Option<Limiter> {
    Quota::with_period(spacing).map(|quota| Arc::new(RateLimiter::direct(quota)))
}

/// Waits for the limiter, if there is one.
pub async fn wait(limiter: Option<&Limiter>) {
    if let Some(limiter) = limiter {
        limiter.until_ready().await;
    }
}
