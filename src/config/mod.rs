use std::env;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use crate::error::ConfigError;

mod rules;

pub use rules::{EndpointRules, RateLimitRule};

/// Process configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub api_base_uri: String,
    pub rate_limit_default: RateLimitRule,
    pub rate_limit_endpoints: EndpointRules,
    pub rate_limit_sweep_interval_secs: u64,
    pub rate_limit_sweep_grace_secs: u64,
    pub cache_ttl_secs: u64,
    pub cache_sweep_interval_secs: u64,
    pub allowed_origins: Vec<String>,
    pub admin_token: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    /// Missing variables fall back to their defaults; present but malformed
    /// ones are rejected.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let max_requests = parse_or(&var, "RATE_LIMIT_MAX_REQUESTS", 100u32)?;
        let window_ms = parse_or(&var, "RATE_LIMIT_WINDOW_MS", 60_000u64)?;
        let rate_limit_default = RateLimitRule::new(max_requests, window_ms)?;

        let api_base_uri = var("API_BASE_URI").unwrap_or_else(|| "/api".into());
        let rate_limit_endpoints = match var("RATE_LIMIT_ENDPOINTS") {
            Some(raw) => EndpointRules::parse(&raw, rate_limit_default)?,
            None => EndpointRules::builtin(&api_base_uri),
        };

        let config = Config {
            server_host: var("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            server_port: parse_or(&var, "SERVER_PORT", 3000u16)?,
            api_base_uri,
            rate_limit_default,
            rate_limit_endpoints,
            rate_limit_sweep_interval_secs: parse_or(&var, "RATE_LIMIT_SWEEP_INTERVAL_SECS", 60)?,
            rate_limit_sweep_grace_secs: parse_or(&var, "RATE_LIMIT_SWEEP_GRACE_SECS", 60)?,
            cache_ttl_secs: parse_or(&var, "CACHE_TTL_SECS", 60)?,
            cache_sweep_interval_secs: parse_or(&var, "CACHE_SWEEP_INTERVAL_SECS", 300)?,
            allowed_origins: var("ALLOWED_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|o| !o.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default(),
            admin_token: var("ADMIN_TOKEN"),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("CACHE_TTL_SECS", self.cache_ttl_secs),
            ("CACHE_SWEEP_INTERVAL_SECS", self.cache_sweep_interval_secs),
            (
                "RATE_LIMIT_SWEEP_INTERVAL_SECS",
                self.rate_limit_sweep_interval_secs,
            ),
        ] {
            if value == 0 {
                return Err(ConfigError::NotPositive(name));
            }
        }
        // nested routers cannot be mounted at the root or with a trailing slash
        let base = &self.api_base_uri;
        if !base.starts_with('/') || base.len() < 2 || base.ends_with('/') {
            return Err(ConfigError::Invalid {
                key: "API_BASE_URI",
                value: self.api_base_uri.clone(),
            });
        }
        self.socket_addr().map(|_| ())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self.server_host.parse().map_err(|_| ConfigError::Invalid {
            key: "SERVER_HOST",
            value: self.server_host.clone(),
        })?;
        Ok(SocketAddr::new(ip, self.server_port))
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn cache_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.cache_sweep_interval_secs)
    }

    pub fn rate_limit_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.rate_limit_sweep_interval_secs)
    }

    pub fn rate_limit_sweep_grace(&self) -> Duration {
        Duration::from_secs(self.rate_limit_sweep_grace_secs)
    }
}

fn parse_or<T, F>(var: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            key,
            value: raw,
        }),
        None => Ok(default),
    }
}
