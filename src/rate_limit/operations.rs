use std::collections::HashMap;
use std::time::Duration;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::time::Instant;

use super::models::{ClientUsage, RateLimitDecision, RateLimitStats, RateRecord};
use crate::config::RateLimitRule;

const ROUTE_SEPARATOR: char = '#';
const TOP_CLIENTS: usize = 10;

/// Counter key for a client on a given route rule. Routes never contain
/// the separator; client identifiers come from request headers and may.
pub fn route_identifier(client: &str, route: &str) -> String {
    format!("{}{}{}", client, ROUTE_SEPARATOR, route)
}

fn client_of(identifier: &str) -> &str {
    identifier
        .rsplit_once(ROUTE_SEPARATOR)
        .map_or(identifier, |(client, _)| client)
}

/// Fixed-window request counter, one record per identifier.
///
/// A client can spend a full quota at the end of one window and another
/// right after the reset; that burst is inherent to fixed windows.
#[derive(Debug, Default)]
pub struct RateLimiter {
    records: DashMap<String, RateRecord>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one request for `identifier` and reports whether it fits
    /// within `rule`. Requests over the limit are still counted.
    pub fn check(&self, identifier: &str, rule: &RateLimitRule) -> RateLimitDecision {
        let now = Instant::now();
        let limit = rule.max_requests();

        // The shard lock is held for the whole read-modify-write.
        match self.records.entry(identifier.to_string()) {
            Entry::Vacant(vacant) => {
                let record = RateRecord::open(now, rule.window());
                let reset_at = record.reset_at;
                vacant.insert(record);
                RateLimitDecision {
                    allowed: true,
                    limit,
                    remaining: limit - 1,
                    reset_at,
                }
            }
            Entry::Occupied(mut occupied) => {
                let record = occupied.get_mut();
                if record.is_elapsed(now) {
                    *record = RateRecord::open(now, rule.window());
                    return RateLimitDecision {
                        allowed: true,
                        limit,
                        remaining: limit - 1,
                        reset_at: record.reset_at,
                    };
                }

                record.count = record.count.saturating_add(1);
                let allowed = record.count <= limit;
                RateLimitDecision {
                    allowed,
                    limit,
                    remaining: if allowed { limit - record.count } else { 0 },
                    reset_at: record.reset_at,
                }
            }
        }
    }

    /// Forgets `identifier` entirely.
    pub fn reset(&self, identifier: &str) {
        self.records.remove(identifier);
    }

    /// Forgets every record of `client`, across all route rules.
    pub fn reset_client(&self, client: &str) -> usize {
        self.retain_counting(|identifier, _| client_of(identifier) != client)
    }

    pub fn clear(&self) -> usize {
        let removed = self.records.len();
        self.records.clear();
        removed
    }

    /// Drops records whose window ended more than `grace` ago.
    pub fn sweep(&self, grace: Duration) -> usize {
        let now = Instant::now();
        self.retain_counting(|_, record| now <= record.reset_at + grace)
    }

    pub fn stats(&self) -> RateLimitStats {
        let now = Instant::now();
        let mut identifiers = Vec::with_capacity(self.records.len());
        let mut active_windows = 0;
        let mut per_client: HashMap<String, u64> = HashMap::new();

        for entry in self.records.iter() {
            let (identifier, record) = entry.pair();
            if record.age(now) <= record.window() {
                active_windows += 1;
            }
            *per_client.entry(client_of(identifier).to_string()).or_default() +=
                u64::from(record.count);
            identifiers.push(identifier.clone());
        }
        identifiers.sort();

        let mut top_clients: Vec<ClientUsage> = per_client
            .into_iter()
            .map(|(client_id, request_count)| ClientUsage {
                client_id,
                request_count,
            })
            .collect();
        top_clients.sort_by(|a, b| {
            b.request_count
                .cmp(&a.request_count)
                .then_with(|| a.client_id.cmp(&b.client_id))
        });
        top_clients.truncate(TOP_CLIENTS);

        RateLimitStats {
            tracked_identifiers: identifiers.len(),
            expired_windows: identifiers.len() - active_windows,
            identifiers,
            active_windows,
            top_clients,
        }
    }

    fn retain_counting<F>(&self, mut keep: F) -> usize
    where
        F: FnMut(&str, &RateRecord) -> bool,
    {
        let mut removed = 0;
        self.records.retain(|identifier, record| {
            let kept = keep(identifier, record);
            if !kept {
                removed += 1;
            }
            kept
        });
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(max: u32, window_ms: u64) -> RateLimitRule {
        RateLimitRule::new(max, window_ms).unwrap()
    }

    #[test]
    fn test_allows_up_to_limit_then_blocks() {
        let limiter = RateLimiter::new();
        let rule = rule(5, 60_000);

        for expected in [4, 3, 2, 1, 0] {
            let decision = limiter.check("192.168.1.1", &rule);
            assert!(decision.allowed);
            assert_eq!(decision.remaining, expected);
            assert_eq!(decision.limit, 5);
        }

        let decision = limiter.check("192.168.1.1", &rule);
        assert!(!decision.allowed);
        assert_eq!(decision.remaining, 0);
    }

    #[test]
    fn test_blocked_requests_keep_counting() {
        let limiter = RateLimiter::new();
        let rule = rule(2, 60_000);
        for _ in 0..5 {
            limiter.check("192.168.1.1", &rule);
        }
        let stats = limiter.stats();
        assert_eq!(stats.top_clients[0].request_count, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_resets_after_elapsing() {
        let limiter = RateLimiter::new();
        let rule = rule(5, 1000);

        for _ in 0..5 {
            limiter.check("192.168.1.1", &rule);
        }
        assert!(!limiter.check("192.168.1.1", &rule).allowed);

        tokio::time::advance(Duration::from_millis(1100)).await;

        let decision = limiter.check("192.168.1.1", &rule);
        assert!(decision.allowed);
        assert_eq!(decision.remaining, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_still_open_at_reset_instant() {
        let limiter = RateLimiter::new();
        let rule = rule(1, 1000);

        limiter.check("a", &rule);
        tokio::time::advance(Duration::from_millis(1000)).await;
        assert!(!limiter.check("a", &rule).allowed);

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(limiter.check("a", &rule).allowed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_at_is_fixed_within_window() {
        let limiter = RateLimiter::new();
        let rule = rule(5, 60_000);

        let first = limiter.check("a", &rule);
        tokio::time::advance(Duration::from_secs(10)).await;
        let second = limiter.check("a", &rule);
        assert_eq!(first.reset_at, second.reset_at);
        assert_eq!(second.retry_after_secs(Instant::now()), 50);
    }

    #[test]
    fn test_identifiers_are_independent() {
        let limiter = RateLimiter::new();
        let rule = rule(2, 60_000);

        limiter.check("192.168.1.1", &rule);
        limiter.check("192.168.1.1", &rule);
        assert!(!limiter.check("192.168.1.1", &rule).allowed);

        assert!(limiter.check("192.168.1.2", &rule).allowed);
    }

    #[test]
    fn test_reset_restarts_count() {
        let limiter = RateLimiter::new();
        let rule = rule(5, 60_000);
        for _ in 0..5 {
            limiter.check("192.168.1.1", &rule);
        }

        limiter.reset("192.168.1.1");

        let decision = limiter.check("192.168.1.1", &rule);
        assert!(decision.allowed);
        assert_eq!(decision.remaining, 4);
    }

    #[test]
    fn test_reset_client_spans_routes() {
        let limiter = RateLimiter::new();
        let rule = rule(5, 60_000);
        limiter.check(&route_identifier("10.0.0.1", "/api/auth"), &rule);
        limiter.check(&route_identifier("10.0.0.1", "/api/rating"), &rule);
        limiter.check(&route_identifier("10.0.0.2", "/api/auth"), &rule);

        assert_eq!(limiter.reset_client("10.0.0.1"), 2);
        assert_eq!(
            limiter.stats().identifiers,
            vec![route_identifier("10.0.0.2", "/api/auth")]
        );
    }

    #[test]
    fn test_reset_client_handles_ipv6() {
        let limiter = RateLimiter::new();
        let rule = rule(5, 60_000);
        limiter.check(&route_identifier("2001:db8::1", "*"), &rule);
        limiter.check(&route_identifier("2001:db8::2", "*"), &rule);

        assert_eq!(limiter.reset_client("2001:db8::1"), 1);
        assert_eq!(limiter.stats().tracked_identifiers, 1);
    }

    #[test]
    fn test_client_with_separator_in_identifier() {
        let limiter = RateLimiter::new();
        let rule = rule(5, 60_000);
        limiter.check(&route_identifier("evil#x", "*"), &rule);
        limiter.check(&route_identifier("evil#x", "/api/auth"), &rule);
        limiter.check(&route_identifier("evil", "*"), &rule);

        let stats = limiter.stats();
        assert_eq!(stats.top_clients[0].client_id, "evil#x");
        assert_eq!(stats.top_clients[0].request_count, 2);

        assert_eq!(limiter.reset_client("evil#x"), 2);
        assert_eq!(limiter.stats().identifiers, vec![route_identifier("evil", "*")]);
    }

    #[test]
    fn test_clear() {
        let limiter = RateLimiter::new();
        let rule = rule(5, 60_000);
        limiter.check("a", &rule);
        limiter.check("b", &rule);
        assert_eq!(limiter.clear(), 2);
        assert_eq!(limiter.stats().tracked_identifiers, 0);
    }

    #[test]
    fn test_stats() {
        let limiter = RateLimiter::new();
        let rule = rule(5, 60_000);
        limiter.check("192.168.1.1", &rule);
        limiter.check("192.168.1.2", &rule);
        limiter.check("192.168.1.2", &rule);

        let stats = limiter.stats();
        assert_eq!(stats.tracked_identifiers, 2);
        assert!(stats.identifiers.contains(&"192.168.1.1".to_string()));
        assert!(stats.identifiers.contains(&"192.168.1.2".to_string()));
        assert_eq!(stats.active_windows, 2);
        assert_eq!(stats.expired_windows, 0);
        assert_eq!(stats.top_clients[0].client_id, "192.168.1.2");
        assert_eq!(stats.top_clients[0].request_count, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stats_classifies_windows_by_age() {
        let limiter = RateLimiter::new();
        limiter.check("a", &rule(5, 1000));
        limiter.check("b", &rule(5, 5000));

        tokio::time::advance(Duration::from_secs(1)).await;
        let stats = limiter.stats();
        assert_eq!(stats.active_windows, 2);
        assert_eq!(stats.expired_windows, 0);

        tokio::time::advance(Duration::from_millis(1)).await;
        let stats = limiter.stats();
        assert_eq!(stats.active_windows, 1);
        assert_eq!(stats.expired_windows, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_respects_grace_period() {
        let limiter = RateLimiter::new();
        limiter.check("short", &rule(5, 1000));
        limiter.check("long", &rule(5, 600_000));

        tokio::time::advance(Duration::from_secs(30)).await;
        assert_eq!(limiter.sweep(Duration::from_secs(60)), 0);
        assert_eq!(limiter.stats().expired_windows, 1);

        tokio::time::advance(Duration::from_secs(32)).await;
        assert_eq!(limiter.sweep(Duration::from_secs(60)), 1);
        assert_eq!(limiter.stats().identifiers, vec!["long".to_string()]);
    }
}
