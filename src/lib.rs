pub mod config;
pub mod connectivity;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod rate_limit;
pub mod route;
pub mod shutdown;
pub mod state;
pub mod store;

use axum::{Router, http::StatusCode, middleware, routing::get};
use std::sync::Arc;

use crate::handlers::metrics_handler;
use crate::route::health_check_layer;
use crate::state::AppState;

/// Builds the router. The health check sits in front of every route,
/// so it answers its slug whatever else is registered.
pub fn app(state: Arc<AppState>, expose_metrics: bool) -> Router {
    let mut router: Router<Arc<AppState>> = Router::new();
    if expose_metrics {
        router = router.route("/metrics", get(metrics_handler));
    }

    router
        .fallback(|| async { (StatusCode::NOT_FOUND, "Not Found") })
        .layer(middleware::from_fn_with_state(
            state.clone(),
            health_check_layer,
        ))
        .with_state(state)
}
