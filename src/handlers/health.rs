use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::error::HealthError;
use crate::metrics::{ALLOWED_TOTAL, DENIED_TOTAL, PROBE_FAILURES, REQUEST_TOTAL};
use crate::models::StatusBody;
use crate::state::AppState;

/// Rate limits `client_id`, then runs the connectivity check.
///
/// A denial short-circuits: nothing after the limiter runs and the 429
/// carries only the fixed message.
pub async fn handle(state: &AppState, client_id: &str, now: DateTime<Utc>) -> Response {
    REQUEST_TOTAL.inc();

    match respond(state, client_id, now).await {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn respond(
    state: &AppState,
    client_id: &str,
    now: DateTime<Utc>,
) -> Result<StatusBody, HealthError> {
    if let Err(e) = state.rate_limiter.check(client_id, now) {
        DENIED_TOTAL.inc();
        info!(client = client_id, "health check rate limited");
        return Err(e);
    }
    ALLOWED_TOTAL.inc();

    state.connectivity.check().await.inspect_err(|e| {
        PROBE_FAILURES.inc();
        warn!(client = client_id, error = %e, "connectivity check failed");
    })?;

    Ok(StatusBody::ok())
}
