use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

use site_status::config::Args;
use site_status::connectivity::{AlwaysUp, ConnectivityCheck, HttpProbe};
use site_status::error::StartupError;
use site_status::state::AppState;
use site_status::store::MemoryStore;
use site_status::{app, logging, shutdown};

#[tokio::main]
async fn main() {
    // parse cli arguments
    let args = Args::parse();

    if let Err(e) = run(args).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), StartupError> {
    logging::init()?;

    let connectivity = connectivity_check(&args)?;
    let state = Arc::new(AppState::new(
        args.endpoint()?,
        Arc::new(MemoryStore::new()),
        connectivity,
    ));
    let app = app(state.clone(), args.metrics);

    let addr = args.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|source| StartupError::Bind {
            addr: addr.clone(),
            source,
        })?;

    info!(addr = %addr, path = %state.matcher.path(), "health check listening");
    info!(
        rate_limit = state.config.rate_limit,
        lockout_seconds = state.config.lockout_seconds,
        "rate limit configured"
    );
    if args.metrics {
        info!("metrics exposed on /metrics");
    }

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown::signal())
    .await
    .map_err(StartupError::Serve)?;

    info!("server stopped");
    Ok(())
}

fn connectivity_check(args: &Args) -> Result<Arc<dyn ConnectivityCheck>, StartupError> {
    let Some(raw) = args.probe_url.as_deref() else {
        return Ok(Arc::new(AlwaysUp));
    };

    let url = reqwest::Url::parse(raw).map_err(|e| StartupError::ProbeUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    let client = reqwest::Client::builder()
        .build()
        .map_err(StartupError::HttpClient)?;

    let probe = HttpProbe::new(client, url, args.probe_timeout());
    info!(url = %probe.url(), timeout_ms = args.probe_timeout_ms, "upstream probe enabled");
    Ok(Arc::new(probe))
}
