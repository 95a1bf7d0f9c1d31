// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use shared_database::AppState;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{
    Appointment, AppointmentError, CreateAppointmentRequest, DoctorAppointment,
    DoctorAppointmentsQuery, PatientAppointment, StatusUpdateRequest,
};
use crate::services::booking::BookingService;
use crate::services::lifecycle::LifecycleService;

fn map_appointment_error(e: AppointmentError) -> AppError {
    match e {
        AppointmentError::SlotConflict => {
            AppError::Conflict("Slot already taken".to_string())
        }
        AppointmentError::NotFound => AppError::NotFound("Appointment not found".to_string()),
        AppointmentError::UnknownParticipant => {
            AppError::NotFound("Doctor or patient not found".to_string())
        }
        AppointmentError::Validation(msg) => AppError::ValidationError(msg),
        AppointmentError::Database(msg) => AppError::Database(msg),
    }
}

fn require_patient(user: &User) -> Result<Uuid, AppError> {
    if !user.is_patient() {
        return Err(AppError::Forbidden("Patient account required".to_string()));
    }
    Uuid::parse_str(&user.id).map_err(|_| AppError::Auth("Invalid user id in token".to_string()))
}

fn require_doctor(user: &User) -> Result<Uuid, AppError> {
    if !user.is_doctor() {
        return Err(AppError::Forbidden("Doctor account required".to_string()));
    }
    Uuid::parse_str(&user.id).map_err(|_| AppError::Auth("Invalid user id in token".to_string()))
}

/// Book a slot. Succeeds with 201 or fails with 409 when the slot was
/// taken in the meantime; the client is expected to re-fetch free slots.
#[axum::debug_handler]
pub async fn create_appointment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateAppointmentRequest>,
) -> Result<(StatusCode, Json<Appointment>), AppError> {
    let patient_id = require_patient(&user)?;

    let booking_service = BookingService::new(&state.db);

    let appointment = booking_service
        .create_appointment(patient_id, request)
        .await
        .map_err(map_appointment_error)?;

    Ok((StatusCode::CREATED, Json(appointment)))
}

#[axum::debug_handler]
pub async fn get_my_appointments(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<PatientAppointment>>, AppError> {
    let patient_id = require_patient(&user)?;

    let booking_service = BookingService::new(&state.db);

    let appointments = booking_service
        .list_for_patient(patient_id)
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(appointments))
}

#[axum::debug_handler]
pub async fn get_doctor_appointments(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Query(query): Query<DoctorAppointmentsQuery>,
) -> Result<Json<Vec<DoctorAppointment>>, AppError> {
    let doctor_id = require_doctor(&user)?;

    let booking_service = BookingService::new(&state.db);

    let appointments = booking_service
        .list_for_doctor(doctor_id, query)
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(appointments))
}

/// Confirm or reject a pending appointment. Only the owning doctor may
/// transition it; repeating a terminal transition is harmless.
#[axum::debug_handler]
pub async fn set_appointment_status(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<StatusUpdateRequest>,
) -> Result<Json<Appointment>, AppError> {
    let doctor_id = require_doctor(&user)?;

    let lifecycle_service = LifecycleService::new(&state.db);

    let appointment = lifecycle_service
        .set_status(appointment_id, doctor_id, request.status)
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(appointment))
}
