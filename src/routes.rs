//! Routers: event ingestion plus common health/readiness/version routes.

use crate::handlers::create_event;
use crate::state::AppState;
use axum::{extract::State, routing::get, routing::post, Json, Router};
use mongodb::bson::doc;
use serde::Serialize;
use tower_http::limit::RequestBodyLimitLayer;

/// Form bodies are flat field/value pairs; anything larger is abuse.
const MAX_BODY_BYTES: usize = 32 * 1024;

#[derive(Serialize)]
struct HealthBody {
    status: &'static str,
}

#[derive(Serialize)]
struct ReadyBody {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    database: Option<&'static str>,
}

async fn health() -> Json<HealthBody> {
    Json(HealthBody { status: "ok" })
}

/// Readiness acquires through the cache (establishing on first call) and
/// pings, so it reports the same path requests will take.
async fn ready(
    State(state): State<AppState>,
) -> Result<Json<ReadyBody>, (axum::http::StatusCode, Json<ReadyBody>)> {
    let degraded = (
        axum::http::StatusCode::SERVICE_UNAVAILABLE,
        Json(ReadyBody {
            status: "degraded",
            database: Some("unavailable"),
        }),
    );
    let db = state.cache.acquire().await.map_err(|_| degraded)?;
    if db.run_command(doc! { "ping": 1 }).await.is_err() {
        return Err((
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadyBody {
                status: "degraded",
                database: Some("unavailable"),
            }),
        ));
    }
    Ok(Json(ReadyBody {
        status: "ok",
        database: Some("ok"),
    }))
}

async fn version() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Common routes: GET /health, GET /ready, GET /version.
pub fn common_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/version", get(version))
        .with_state(state)
}

/// Ingestion routes, mounted under /api by the binary.
pub fn event_routes(state: AppState) -> Router {
    Router::new()
        .route("/events", post(create_event))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .with_state(state)
}
