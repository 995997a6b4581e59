use lazy_static::lazy_static;
use prometheus::{IntCounter, register_int_counter};

lazy_static! {
    pub static ref REQUEST_TOTAL: IntCounter =
        register_int_counter!("site_status_requests_total", "Total health check requests").unwrap();
    pub static ref ALLOWED_TOTAL: IntCounter =
        register_int_counter!("site_status_allowed_total", "Health checks let through by the rate limiter").unwrap();
    pub static ref DENIED_TOTAL: IntCounter =
        register_int_counter!("site_status_denied_total", "Health checks rejected with 429").unwrap();
    pub static ref PROBE_FAILURES: IntCounter =
        register_int_counter!("site_status_probe_failures_total", "Failed connectivity checks").unwrap();
}
