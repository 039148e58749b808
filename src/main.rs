//! Server binary: loads settings from env, wires the connection cache into
//! shared state, mounts common and ingestion routes.

use axum::Router;
use evently::{common_routes, event_routes, AppState, Settings};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("evently=info".parse()?))
        .init();

    // Missing MONGODB_URI fails here, before the listener is bound.
    let settings = Settings::from_env()?;
    let state = AppState::new(&settings);

    let app = Router::new()
        .merge(common_routes(state.clone()))
        .nest("/api", event_routes(state));

    let listener = TcpListener::bind(settings.bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
