use std::sync::Arc;

use crate::config::EndpointConfig;
use crate::connectivity::{AlwaysUp, ConnectivityCheck};
use crate::rate_limit::RateLimiter;
use crate::route::RouteMatcher;
use crate::store::{CounterStore, MemoryStore};

// app's shared state
pub struct AppState {
    pub config: EndpointConfig,
    pub matcher: RouteMatcher,
    pub rate_limiter: RateLimiter,
    pub connectivity: Arc<dyn ConnectivityCheck>,
}

impl AppState {
    pub fn new(
        config: EndpointConfig,
        store: Arc<dyn CounterStore>,
        connectivity: Arc<dyn ConnectivityCheck>,
    ) -> Self {
        Self {
            matcher: RouteMatcher::new(&config.slug),
            rate_limiter: RateLimiter::new(store, &config),
            connectivity,
            config,
        }
    }

    /// In-memory counters and the always-up check.
    pub fn in_memory(config: EndpointConfig) -> Self {
        Self::new(config, Arc::new(MemoryStore::new()), Arc::new(AlwaysUp))
    }
}
