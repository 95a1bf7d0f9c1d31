// libs/availability-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::get,
    Router,
};

use shared_database::AppState;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn availability_routes(state: Arc<AppState>) -> Router {
    // Schedule management requires a doctor's token
    let protected_routes = Router::new()
        .route(
            "/me/availability",
            get(handlers::get_my_schedule).post(handlers::save_my_schedule),
        )
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Patients browse slots without an account
    let public_routes = Router::new()
        .route("/{doctor_id}/availability", get(handlers::get_free_slots));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
