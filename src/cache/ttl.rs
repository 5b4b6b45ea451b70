//! Centralized TTL constants for cached snapshots,
//! with environment variable overrides.

use std::env;
use std::time::Duration;

// Defaults in seconds
pub const TTL_LIST: u64 = 3600; // accommodations/invoices/users lists: 60 minutes
pub const TTL_ROOMS: u64 = 600; // room lists change often: 10 minutes
pub const TTL_STATUSES: u64 = 3600; // occupancy windows: 60 minutes
pub const TTL_BENEFITS: u64 = 86400; // reference data: 24 hours
pub const TTL_REVENUE: u64 = 300; // revenue rollups: bounded staleness after payments
pub const TTL_LAST_FILTERS: u64 = 1800; // chat filter state: 30 minutes

/// Get a TTL with an environment variable override.
pub fn ttl_with_env(env_key: &str, default_secs: u64) -> Duration {
    let secs = env::var(env_key)
        .map(|val| val.parse::<u64>().unwrap_or(default_secs))
        .unwrap_or(default_secs);
    Duration::from_secs(secs)
}

pub fn list_ttl() -> Duration {
    ttl_with_env("TTL_LIST_SECONDS", TTL_LIST)
}

pub fn rooms_ttl() -> Duration {
    ttl_with_env("TTL_ROOMS_SECONDS", TTL_ROOMS)
}

pub fn statuses_ttl() -> Duration {
    ttl_with_env("TTL_STATUSES_SECONDS", TTL_STATUSES)
}

pub fn benefits_ttl() -> Duration {
    ttl_with_env("TTL_BENEFITS_SECONDS", TTL_BENEFITS)
}

pub fn revenue_ttl() -> Duration {
    ttl_with_env("TTL_REVENUE_SECONDS", TTL_REVENUE)
}

pub fn last_filters_ttl() -> Duration {
    ttl_with_env("TTL_LAST_FILTERS_SECONDS", TTL_LAST_FILTERS)
}
