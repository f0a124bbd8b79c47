use std::net::SocketAddr;

use anyhow::{Context, Result};
use dotenvy::dotenv;
use icapture::{AppState, config::ServerConfig, web};
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    dotenv().ok();
    init_tracing();

    if let Err(err) = app_main().await {
        error!(?err, "application error");
        std::process::exit(1);
    }
}

async fn app_main() -> Result<()> {
    let config = ServerConfig::from_env().context("invalid server configuration")?;
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    let state = AppState::new(config).await?;
    let app = web::router::build_router(state);

    info!(%addr, "listening");
    let listener = TcpListener::bind(addr)
        .await
        .context("failed to bind listener")?;
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}
