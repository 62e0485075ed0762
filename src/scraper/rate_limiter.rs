//! Politeness delay between tournaments.

use rand::Rng;
use tokio::time::Duration;
use tracing::debug;

use crate::config::CollectorConfig;

/// Sleeps a random whole number of seconds in `[min, max)`
pub struct RateLimiter {
    min_secs: u64,
    max_secs: u64,
}

impl RateLimiter {
    /// Create a limiter; bounds are reordered if given backwards
    pub fn new(min_secs: u64, max_secs: u64) -> Self {
        Self {
            min_secs: min_secs.min(max_secs),
            max_secs: max_secs.max(min_secs),
        }
    }

    pub fn from_config(config: &CollectorConfig) -> Self {
        Self::new(config.min_delay_secs, config.max_delay_secs)
    }

    /// Pick the next delay
    pub fn next_delay(&self) -> Duration {
        let secs = if self.max_secs > self.min_secs {
            rand::thread_rng().gen_range(self.min_secs..self.max_secs)
        } else {
            self.min_secs
        };
        Duration::from_secs(secs)
    }

    /// Sleep for a freshly picked delay
    pub async fn wait(&self) {
        let delay = self.next_delay();
        debug!("sleeping {:?}", delay);
        tokio::time::sleep(delay).await;
    }
}
