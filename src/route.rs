use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::debug;

use crate::handlers::health;
use crate::rate_limit::client_key;
use crate::state::AppState;

const UNKNOWN_CLIENT: &str = "unknown";

/// Decides whether a request path targets the health check slug.
#[derive(Debug, Clone)]
pub struct RouteMatcher {
    slug: String,
}

impl RouteMatcher {
    pub fn new(slug: &str) -> Self {
        Self {
            slug: slug.trim_matches('/').to_string(),
        }
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn path(&self) -> String {
        format!("/{}", self.slug)
    }

    /// Exact match on the slug, one leading and one trailing slash optional.
    pub fn matches(&self, path: &str) -> bool {
        let path = path.strip_prefix('/').unwrap_or(path);
        let path = path.strip_suffix('/').unwrap_or(path);
        path == self.slug
    }
}

/// Answers matching requests with the health check, forwards the rest.
pub async fn health_check_layer(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    if !state.matcher.matches(request.uri().path()) {
        return next.run(request).await;
    }

    let client_id = match request.extensions().get::<ConnectInfo<SocketAddr>>() {
        Some(ConnectInfo(addr)) => client_key(addr.ip()),
        None => {
            debug!("no peer address on request, using shared key");
            UNKNOWN_CLIENT.to_string()
        }
    };

    health::handle(&state, &client_id, Utc::now()).await
}
