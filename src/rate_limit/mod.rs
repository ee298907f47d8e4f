//! Fixed-window rate limiting keyed by client identifier.

pub mod client_ip;
pub mod models;
pub mod operations;

pub use client_ip::{UNKNOWN_CLIENT, client_identifier};
pub use models::{ClientUsage, RateLimitDecision, RateLimitStats, RateRecord};
pub use operations::{RateLimiter, route_identifier};
