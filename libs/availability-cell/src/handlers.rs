// libs/availability-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_database::AppState;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{ScheduleError, WeeklyAvailability, WeeklyScheduleEntry};
use crate::services::schedule::ScheduleService;
use crate::services::slots::SlotResolver;

#[derive(Debug, Deserialize)]
pub struct SlotsQuery {
    pub date: String,
}

fn map_schedule_error(e: ScheduleError) -> AppError {
    match e {
        ScheduleError::Validation(msg) => AppError::ValidationError(msg),
        ScheduleError::Database(msg) => AppError::Database(msg),
    }
}

fn require_doctor(user: &User) -> Result<Uuid, AppError> {
    if !user.is_doctor() {
        return Err(AppError::Forbidden("Doctor account required".to_string()));
    }
    Uuid::parse_str(&user.id).map_err(|_| AppError::Auth("Invalid user id in token".to_string()))
}

/// Public booking-page endpoint: the free slots for one doctor and date.
#[axum::debug_handler]
pub async fn get_free_slots(
    State(state): State<Arc<AppState>>,
    Path(doctor_id): Path<Uuid>,
    Query(query): Query<SlotsQuery>,
) -> Result<Json<Vec<String>>, AppError> {
    let resolver = SlotResolver::new(&state.db);

    let slots = resolver
        .resolve_free_slots(doctor_id, &query.date)
        .await
        .map_err(map_schedule_error)?;

    Ok(Json(slots))
}

#[axum::debug_handler]
pub async fn get_my_schedule(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<WeeklyAvailability>>, AppError> {
    let doctor_id = require_doctor(&user)?;

    let service = ScheduleService::new(&state.db);

    let week = service
        .get_week(doctor_id)
        .await
        .map_err(map_schedule_error)?;

    Ok(Json(week))
}

#[axum::debug_handler]
pub async fn save_my_schedule(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Json(entries): Json<Vec<WeeklyScheduleEntry>>,
) -> Result<Json<Value>, AppError> {
    let doctor_id = require_doctor(&user)?;

    let service = ScheduleService::new(&state.db);

    service
        .save_week(doctor_id, entries)
        .await
        .map_err(map_schedule_error)?;

    Ok(Json(json!({ "ok": true })))
}
