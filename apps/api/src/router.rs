use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde_json::{json, Value};

use appointment_cell::router::appointment_routes;
use availability_cell::router::availability_routes;
use shared_database::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/health/db", get(health_db))
        .with_state(state.clone());

    Router::new()
        .route("/", get(|| async { "MediBook API is running!" }))
        .merge(health_routes)
        .nest("/doctors", availability_routes(state.clone()))
        .nest("/appointments", appointment_routes(state))
}

async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    let db_connected = state.db.ping().await.is_ok();
    Json(json!({
        "ok": true,
        "db": { "connected": db_connected }
    }))
}

async fn health_db(State(state): State<Arc<AppState>>) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    match state.db.ping().await {
        Ok(()) => Ok(Json(json!({ "connected": true }))),
        Err(e) => Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "connected": false, "error": e.to_string() })),
        )),
    }
}
