use std::time::Duration;

use serde::Serialize;

use crate::error::ConfigError;

const DEFAULT_MAX_REQUESTS: u32 = 100;
const DEFAULT_WINDOW_MS: u64 = 60_000;

/// Fixed-window limit: at most `max_requests` per `window`.
///
/// Both values are validated on construction, so a rule held anywhere in the
/// process is always usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateLimitRule {
    max_requests: u32,
    window_ms: u64,
}

impl RateLimitRule {
    pub fn new(max_requests: u32, window_ms: u64) -> Result<Self, ConfigError> {
        if max_requests == 0 {
            return Err(ConfigError::NotPositive("max_requests"));
        }
        if window_ms == 0 {
            return Err(ConfigError::NotPositive("window_ms"));
        }
        Ok(Self {
            max_requests,
            window_ms,
        })
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}

impl Default for RateLimitRule {
    fn default() -> Self {
        Self {
            max_requests: DEFAULT_MAX_REQUESTS,
            window_ms: DEFAULT_WINDOW_MS,
        }
    }
}

/// Per-route overrides of the default rule.
///
/// A request path matches an entry exactly, or else the longest entry that
/// is a path-segment prefix of it (`/api/auth` covers `/api/auth/login`).
#[derive(Debug, Clone, Default)]
pub struct EndpointRules {
    entries: Vec<(String, RateLimitRule)>,
}

impl EndpointRules {
    /// Route limits for the scorekeeping API mounted at `base`.
    pub fn builtin(base: &str) -> Self {
        let minute = |max| RateLimitRule {
            max_requests: max,
            window_ms: DEFAULT_WINDOW_MS,
        };
        Self::from_entries(
            [
                ("auth", 10),
                ("rating", 60),
                ("players", 60),
                ("games", 60),
                ("day-stats", 30),
                ("day-games", 30),
                ("version", 200),
            ]
            .map(|(route, max)| {
                let path = format!("{}/{}", base.trim_end_matches('/'), route);
                (path, minute(max))
            }),
        )
    }

    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, RateLimitRule)>,
        S: Into<String>,
    {
        let mut rules = Self::default();
        for (route, rule) in entries {
            rules.insert(route, rule);
        }
        rules
    }

    /// Parses `path=max[/windowMs],…`. A missing window inherits the
    /// default rule's window.
    pub fn parse(raw: &str, default: RateLimitRule) -> Result<Self, ConfigError> {
        let mut rules = Self::default();
        for item in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let bad = || ConfigError::EndpointEntry(item.to_string());
            let (route, limit) = item.split_once('=').ok_or_else(bad)?;
            let route = route.trim();
            if !route.starts_with('/') || route.contains('#') {
                return Err(bad());
            }
            let (max, window_ms) = match limit.split_once('/') {
                Some((max, window)) => (max, window.trim().parse().map_err(|_| bad())?),
                None => (limit, default.window_ms),
            };
            let max = max.trim().parse().map_err(|_| bad())?;
            rules.insert(route, RateLimitRule::new(max, window_ms)?);
        }
        Ok(rules)
    }

    pub fn insert(&mut self, route: impl Into<String>, rule: RateLimitRule) {
        let route = route.into();
        match self.entries.iter_mut().find(|(r, _)| *r == route) {
            Some(entry) => entry.1 = rule,
            None => self.entries.push((route, rule)),
        }
    }

    /// Exact lookup by configured route.
    pub fn get(&self, route: &str) -> Option<&RateLimitRule> {
        self.entries.iter().find(|(r, _)| r == route).map(|(_, rule)| rule)
    }

    /// Resolves the rule governing `path`, returning the matched route so
    /// callers can partition counters by it.
    pub fn resolve(&self, path: &str) -> Option<(&str, &RateLimitRule)> {
        if let Some((route, rule)) = self.entries.iter().find(|(r, _)| r == path) {
            return Some((route.as_str(), rule));
        }
        self.entries
            .iter()
            .filter(|(route, _)| {
                path.strip_prefix(route.as_str())
                    .is_some_and(|rest| rest.starts_with('/'))
            })
            .max_by_key(|(route, _)| route.len())
            .map(|(route, rule)| (route.as_str(), rule))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
