mod handler;
mod model;

pub use handler::{
    cache_stats, clear_rate_limits, invalidate_cache, rate_limit_stats, reset_client,
};
pub use model::{InvalidateCacheQuery, RemovedResponse};
