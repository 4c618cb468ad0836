use clap::Parser;
use hit_limiter::{AppState, Args, Limiter, handlers, store};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("hit_limiter=info")),
        )
        .init();

    // parse cli arguments
    let args = Args::parse();

    if let Err(e) = run(args).await {
        error!(error = %e, "hit limiter exited with an error");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = args.limiter_config()?;
    let store_kind = args.store_kind()?;

    let store = store::open(&store_kind).await?;
    let limiter = Limiter::new(config, store)?;

    // a limiter without a schema can't do anything, so this one is fatal
    limiter.init().await?;

    let state = Arc::new(AppState::new(limiter.clone()));
    let app = handlers::router(state);

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        port = args.port,
        store = %args.store,
        limit = config.limit,
        interval_secs = config.interval.as_secs(),
        "hit limiter listening"
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    limiter.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
