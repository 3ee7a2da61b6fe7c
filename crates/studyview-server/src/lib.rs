//! studyview-server: Axum web server exposing studies and EDF figures over REST.

pub mod api;
pub mod state;

use axum::Router;
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

pub use state::{AppState, DashboardRegistration, ServerConfig};

/// Build the Axum router with all routes.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api", api::router())
        .with_state(state)
        .layer(cors)
}

/// Shared state for a server started with `config`.
///
/// With an artifact directory the studies directory is registered as the
/// dashboard storage, so it is created first.
pub fn prepare_state(config: &ServerConfig) -> anyhow::Result<AppState> {
    let state = AppState::new(config.base_dir.clone());
    if let Some(artifacts) = &config.artifact_dir {
        studyview_core::storage::ensure_dir(&config.base_dir)?;
        state.register(&config.base_dir.to_string_lossy(), &artifacts.to_string_lossy())?;
    }
    Ok(state)
}

/// Start the server on the given address.
pub async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    let app = build_router(prepare_state(&config)?);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("studyview dashboard at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
