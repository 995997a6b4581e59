use chrono::{DateTime, Duration, Utc};
use std::net::IpAddr;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::EndpointConfig;
use crate::error::HealthError;
use crate::store::CounterStore;

const KEY_PREFIX: &str = "health_check_";

// Rate limit entry - tracks requests per client within one lockout window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateCounter {
    pub count: u32,
    pub expires_at: DateTime<Utc>,
}

impl RateCounter {
    pub fn fresh(now: DateTime<Utc>, lockout: Duration) -> Self {
        Self {
            count: 1,
            expires_at: now + lockout,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Whole seconds until the window closes, rounded up.
    pub fn retry_after(&self, now: DateTime<Utc>) -> u64 {
        let millis = (self.expires_at - now).num_milliseconds().max(0) as u64;
        millis.div_ceil(1000)
    }
}

/// Outcome of counting one request against a client's window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hit {
    Allowed(RateCounter),
    Blocked(RateCounter),
}

impl Hit {
    /// Applies one request to the current entry. Expired entries count as absent.
    pub fn decide(
        current: Option<RateCounter>,
        limit: u32,
        lockout: Duration,
        now: DateTime<Utc>,
    ) -> Self {
        match current {
            Some(entry) if !entry.is_expired(now) => {
                if entry.count < limit {
                    Hit::Allowed(RateCounter {
                        count: entry.count + 1,
                        expires_at: entry.expires_at,
                    })
                } else {
                    Hit::Blocked(entry)
                }
            }
            _ => Hit::Allowed(RateCounter::fresh(now, lockout)),
        }
    }

    pub fn counter(&self) -> RateCounter {
        match self {
            Hit::Allowed(c) | Hit::Blocked(c) => *c,
        }
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, Hit::Allowed(_))
    }
}

/// Fixed-window per-client limiter over a shared [`CounterStore`].
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn CounterStore>,
    limit: u32,
    lockout: Duration,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn CounterStore>, config: &EndpointConfig) -> Self {
        Self {
            store,
            limit: config.rate_limit,
            lockout: config.lockout(),
        }
    }

    /// Counts a request from `client_id`. Store failures fail open: the
    /// request is treated as the first of a new window.
    pub fn check(&self, client_id: &str, now: DateTime<Utc>) -> Result<RateCounter, HealthError> {
        let key = format!("{KEY_PREFIX}{client_id}");

        let hit = match self.store.hit(&key, self.limit, self.lockout, now) {
            Ok(hit) => hit,
            Err(e) => {
                warn!(client = client_id, error = %e, "counter store failed, allowing request");
                Hit::Allowed(RateCounter::fresh(now, self.lockout))
            }
        };

        match hit {
            Hit::Allowed(counter) => {
                debug!(client = client_id, count = counter.count, limit = self.limit, "health check allowed");
                Ok(counter)
            }
            Hit::Blocked(counter) => Err(HealthError::RateLimitExceeded {
                retry_after: counter.retry_after(now),
            }),
        }
    }
}

/// Turns a remote address into a safe store key: IPv4-mapped IPv6 is folded
/// to IPv4, then anything outside `[a-z0-9_-]` becomes `-`.
pub fn client_key(ip: IpAddr) -> String {
    let ip = match ip {
        IpAddr::V6(v6) => v6.to_ipv4_mapped().map(IpAddr::V4).unwrap_or(IpAddr::V6(v6)),
        v4 => v4,
    };
    sanitize_key(&ip.to_string())
}

pub fn sanitize_key(raw: &str) -> String {
    raw.chars()
        .map(|c| c.to_ascii_lowercase())
        .map(|c| match c {
            'a'..='z' | '0'..='9' | '_' | '-' => c,
            _ => '-',
        })
        .collect()
}
