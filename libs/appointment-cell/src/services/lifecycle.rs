use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use shared_database::Database;

use crate::models::{Appointment, AppointmentDecision, AppointmentError, AppointmentStatus};
use crate::services::booking::map_write_error;

/// Applies the doctor-side status transitions. `pending` moves to
/// `confirmed` or `rejected`; re-applying a terminal status is a no-op
/// rather than an error.
pub struct LifecycleService {
    db: Database,
}

impl LifecycleService {
    pub fn new(db: &Database) -> Self {
        Self { db: db.clone() }
    }

    /// Transition an appointment owned by `doctor_id`. A missing id and an
    /// appointment belonging to another doctor are indistinguishable to the
    /// caller: both come back as `NotFound`.
    pub async fn set_status(
        &self,
        appointment_id: Uuid,
        doctor_id: Uuid,
        decision: AppointmentDecision,
    ) -> Result<Appointment, AppointmentError> {
        let status: AppointmentStatus = decision.into();

        debug!(
            "Doctor {} setting appointment {} to {}",
            doctor_id, appointment_id, status
        );

        let updated = sqlx::query_as::<_, Appointment>(
            "UPDATE appointments SET status = ?, updated_at = ? \
             WHERE id = ? AND doctor_id = ? \
             RETURNING id, doctor_id, patient_id, date, time, description, status, \
             created_at, updated_at",
        )
        .bind(status)
        .bind(Utc::now())
        .bind(appointment_id)
        .bind(doctor_id)
        .fetch_optional(self.db.pool())
        .await
        .map_err(|e| map_write_error(e, doctor_id))?;

        updated.ok_or(AppointmentError::NotFound)
    }
}
