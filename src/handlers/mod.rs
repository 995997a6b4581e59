pub mod health;
mod metrics;

pub use metrics::metrics_handler;
