use std::{net::SocketAddr, sync::Arc};

use flixy::{common::AnyResult, common::logger, configs::Config, server::AppState, transport};
use tracing::info;

#[tokio::main]
async fn main() -> AnyResult<()> {
    let config = Config::load()?;
    logger::init(config.logging.as_ref());

    let address = config.address();
    let shared_state = Arc::new(AppState::new(config));
    let app = transport::router(shared_state.clone());

    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!("flixy listening on {}", listener.local_addr()?);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!(
        "Shut down with {} live session(s)",
        shared_state.registry.session_count()
    );
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
