// * Pacing for everything that touches the remote site
// * Browser steps sleep a randomized interval; image downloads go through a
// * token-bucket limiter so a bounded worker pool cannot burst.

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter as GovernorLimiter};
use nonzero_ext::nonzero;
use rand::Rng;
use std::num::NonZeroU32;
use std::time::Duration;
use tracing::debug;

use crate::config::Jitter;

impl Jitter {
    /// Draws one delay: base plus a uniform extra in [min_extra, max_extra]
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        let lo = self.min_extra.as_millis() as u64;
        let hi = self.max_extra.as_millis() as u64;
        let extra = if hi > lo { rng.gen_range(lo..=hi) } else { lo };
        self.base + Duration::from_millis(extra)
    }
}

/// Sleeps for a randomized interval. Zero-length jitters return immediately.
pub async fn pause(jitter: &Jitter, reason: &'static str) {
    let delay = jitter.sample(&mut rand::thread_rng());
    if delay.is_zero() {
        return;
    }
    debug!(reason = reason, delay_ms = delay.as_millis() as u64, "Pausing");
    tokio::time::sleep(delay).await;
}

/// Direct (un-keyed) limiter shared by all download workers
pub struct DownloadThrottle {
    limiter: GovernorLimiter<NotKeyed, InMemoryState, DefaultClock>,
}

impl DownloadThrottle {
    /// `per_second == 0` falls back to one request per second
    pub fn per_second(per_second: u32) -> Self {
        let rate = NonZeroU32::new(per_second).unwrap_or(nonzero!(1u32));
        Self {
            limiter: GovernorLimiter::direct(Quota::per_second(rate)),
        }
    }

    /// Waits until a request may be sent
    pub async fn acquire(&self) {
        self.limiter.until_ready().await;
    }
}
