// libs/appointment-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};

use shared_database::AppState;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn appointment_routes(state: Arc<AppState>) -> Router {
    // Every appointment operation acts on behalf of a signed-in user
    let protected_routes = Router::new()
        .route("/", post(handlers::create_appointment))
        .route("/mine", get(handlers::get_my_appointments))
        .route("/doctor", get(handlers::get_doctor_appointments))
        .route("/{appointment_id}/status", patch(handlers::set_appointment_status))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
