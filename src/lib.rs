use std::sync::Arc;

use cache::ResponseCache;
use config::Config;
use rate_limit::RateLimiter;
use sweeper::Sweeper;

pub mod cache;
pub mod config;
pub mod error;
pub mod middleware;
pub mod rate_limit;
pub mod router;
pub mod routes;
pub mod sweeper;
pub mod utils;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub cache: Arc<ResponseCache>,
    pub limiter: Arc<RateLimiter>,
}

impl AppState {
    /// Fresh, empty cache and limiter for the given configuration.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            cache: Arc::new(ResponseCache::new()),
            limiter: Arc::new(RateLimiter::new()),
        }
    }

    /// Starts the periodic purges of stale cache entries and rate-limit
    /// windows. Dropping or shutting down the returned handles stops them.
    pub fn spawn_sweepers(&self) -> Vec<Sweeper> {
        let cache = Arc::clone(&self.cache);
        let limiter = Arc::clone(&self.limiter);
        let grace = self.config.rate_limit_sweep_grace();

        vec![
            Sweeper::spawn("cache", self.config.cache_sweep_interval(), move || {
                cache.cleanup()
            }),
            Sweeper::spawn(
                "rate-limit",
                self.config.rate_limit_sweep_interval(),
                move || limiter.sweep(grace),
            ),
        ]
    }
}
