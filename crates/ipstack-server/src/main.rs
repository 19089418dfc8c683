use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use ipstack_server::state::{build_provider, AppState};

/// `ipstack health`: liveness probe for Docker HEALTHCHECK.
///
/// Calls `GET http://localhost:$IPSTACK_PORT/health`.
/// Exits 0 if the server responds with HTTP 200, exits 1 otherwise.
fn run_health_check() -> ! {
    let port = std::env::var("IPSTACK_PORT").unwrap_or_else(|_| "3000".to_string());
    let url = format!("http://localhost:{}/health", port);
    match ureq::get(&url).call() {
        Ok(resp) if resp.status() == 200 => std::process::exit(0),
        _ => std::process::exit(1),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.get(1).map(|s| s.as_str()) == Some("health") {
        run_health_check();
    }
    // Structured JSON logging. Level controlled via RUST_LOG env var.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("ipstack=info".parse()?),
        )
        .json()
        .init();

    let cfg = ipstack_core::config::Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    info!(
        endpoint = %cfg.endpoint,
        cache_ttl_secs = ?cfg.cache_ttl_secs,
        ip_attribute = ?cfg.ip_attribute,
        language = ?cfg.language,
        "ipstack provider configured"
    );

    let provider = build_provider(&cfg);
    let state = Arc::new(AppState::new(provider, cfg.clone()));

    let addr = format!("0.0.0.0:{}", cfg.port);
    let app = ipstack_server::app::build_app(Arc::clone(&state));

    info!(port = cfg.port, "ipstack listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        tokio::signal::ctrl_c().await.ok();
    })
    .await?;

    Ok(())
}
