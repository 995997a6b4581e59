use clap::Parser;
use md5::{Digest, Md5};
use std::time::Duration;

use crate::error::StartupError;

/// Slug served when none is configured.
pub const DEFAULT_SLUG: &str = "health-check-site-status";

// CLI argument structure
#[derive(Parser, Debug, Clone)]
#[command(name = "site-status")]
#[command(about = "Rate limited health check endpoint")]
pub struct Args {
    /// Address to bind the server on
    #[arg(long, env = "SITE_STATUS_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to run the server on
    #[arg(short, long, env = "SITE_STATUS_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Path segment of the health check endpoint
    #[arg(short, long, env = "SITE_STATUS_SLUG")]
    pub slug: Option<String>,

    /// Serve the endpoint at the MD5 hex digest of the slug
    #[arg(long, env = "SITE_STATUS_SLUG_HASH", default_value_t = false)]
    pub slug_hash: bool,

    /// Max health check requests per client per window
    #[arg(long, env = "SITE_STATUS_RATE_LIMIT", default_value_t = 5,
          value_parser = clap::value_parser!(u32).range(1..))]
    pub rate_limit: u32,

    /// Lockout window in seconds, counted from the first request
    #[arg(long, env = "SITE_STATUS_LOCKOUT_SECONDS", default_value_t = 60,
          value_parser = clap::value_parser!(u64).range(1..))]
    pub lockout_seconds: u64,

    /// Upstream URL probed on every allowed request
    #[arg(long, env = "SITE_STATUS_PROBE_URL")]
    pub probe_url: Option<String>,

    /// Upstream probe timeout in milliseconds
    #[arg(long, env = "SITE_STATUS_PROBE_TIMEOUT_MS", default_value_t = 2000)]
    pub probe_timeout_ms: u64,

    /// Expose prometheus metrics on /metrics
    #[arg(long, env = "SITE_STATUS_METRICS", default_value_t = false)]
    pub metrics: bool,
}

impl Args {
    pub fn endpoint(&self) -> Result<EndpointConfig, StartupError> {
        if !self.slug_hash {
            if let Some(slug) = self.slug.as_deref() {
                validate_slug(slug.trim())?;
            }
        }
        Ok(EndpointConfig::new(
            self.slug.as_deref(),
            self.slug_hash,
            self.rate_limit,
            self.lockout_seconds,
        ))
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Endpoint settings, resolved once at startup and shared read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointConfig {
    /// Route path segment, without surrounding slashes.
    pub slug: String,
    pub rate_limit: u32,
    pub lockout_seconds: u64,
}

impl EndpointConfig {
    pub fn new(slug: Option<&str>, hash: bool, rate_limit: u32, lockout_seconds: u64) -> Self {
        Self {
            slug: resolve_slug(slug, hash),
            rate_limit,
            lockout_seconds,
        }
    }

    pub fn lockout(&self) -> chrono::Duration {
        // capped so `now + lockout` cannot overflow
        chrono::Duration::seconds(self.lockout_seconds.min(u64::from(u32::MAX)) as i64)
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self::new(None, false, 5, 60)
    }
}

/// Picks the route slug: trimmed of slashes, falling back to
/// [`DEFAULT_SLUG`] when blank, and optionally replaced by its MD5 hex.
pub fn resolve_slug(raw: Option<&str>, hash: bool) -> String {
    let slug = raw
        .map(|s| s.trim().trim_matches('/'))
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_SLUG);

    if hash {
        hash_slug(slug)
    } else {
        slug.to_string()
    }
}

/// Requests are matched on the raw, still percent-encoded path, so an
/// unhashed slug must only use characters that travel unencoded.
pub fn validate_slug(slug: &str) -> Result<(), StartupError> {
    match slug
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | '~' | '/')))
    {
        Some(c) => Err(StartupError::Slug {
            slug: slug.to_string(),
            reason: format!("character {c:?} is not allowed unencoded in a path, use --slug-hash"),
        }),
        None => Ok(()),
    }
}

pub fn hash_slug(slug: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(slug.as_bytes());
    format!("{:x}", hasher.finalize())
}
