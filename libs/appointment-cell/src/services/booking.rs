use chrono::Utc;
use tracing::{debug, warn};
use uuid::Uuid;

use shared_database::Database;
use shared_utils::timeslot::{parse_date_param, parse_time_param};

use crate::models::{
    Appointment, AppointmentError, CreateAppointmentRequest, DoctorAppointment,
    DoctorAppointmentsQuery, PatientAppointment,
};

const APPOINTMENT_COLUMNS: &str =
    "id, doctor_id, patient_id, date, time, description, status, created_at, updated_at";

/// Creates appointments and serves both sides' listings. Slot exclusivity
/// is enforced by the storage layer: a partial unique index over
/// (doctor, date, time) admits at most one non-rejected row, so of two
/// racing bookings exactly one succeeds.
pub struct BookingService {
    db: Database,
}

impl BookingService {
    pub fn new(db: &Database) -> Self {
        Self { db: db.clone() }
    }

    /// Book a slot for a patient. The slot is not re-checked against the
    /// resolver's output - a stale client may race ahead - the uniqueness
    /// constraint alone decides who gets the slot.
    pub async fn create_appointment(
        &self,
        patient_id: Uuid,
        request: CreateAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        let date = parse_date_param(&request.date).map_err(AppointmentError::Validation)?;
        let time = parse_time_param(&request.time).map_err(AppointmentError::Validation)?;

        debug!(
            "Creating appointment for patient {} with doctor {} at {} {}",
            patient_id, request.doctor_id, date, time
        );

        let now = Utc::now();

        let sql = format!(
            "INSERT INTO appointments \
             (id, doctor_id, patient_id, date, time, description, status, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, 'pending', ?, ?) \
             RETURNING {}",
            APPOINTMENT_COLUMNS
        );

        let appointment = sqlx::query_as::<_, Appointment>(&sql)
            .bind(Uuid::new_v4())
            .bind(request.doctor_id)
            .bind(patient_id)
            .bind(date)
            .bind(time)
            .bind(request.description)
            .bind(now)
            .bind(now)
            .fetch_one(self.db.pool())
            .await
            .map_err(|e| map_write_error(e, request.doctor_id))?;

        debug!("Appointment {} created in state pending", appointment.id);

        Ok(appointment)
    }

    /// A patient's own appointments, newest first.
    pub async fn list_for_patient(
        &self,
        patient_id: Uuid,
    ) -> Result<Vec<PatientAppointment>, AppointmentError> {
        sqlx::query_as::<_, PatientAppointment>(
            "SELECT a.id, a.doctor_id, a.date, a.time, a.description, a.status, \
             a.created_at, a.updated_at, d.first_name, d.last_name, d.field, d.location \
             FROM appointments a \
             JOIN doctors d ON d.id = a.doctor_id \
             WHERE a.patient_id = ? \
             ORDER BY a.date DESC, a.time DESC",
        )
        .bind(patient_id)
        .fetch_all(self.db.pool())
        .await
        .map_err(|e| AppointmentError::Database(e.to_string()))
    }

    /// A doctor's appointments with optional status and date-range filters,
    /// oldest first.
    pub async fn list_for_doctor(
        &self,
        doctor_id: Uuid,
        query: DoctorAppointmentsQuery,
    ) -> Result<Vec<DoctorAppointment>, AppointmentError> {
        let from = query
            .from
            .as_deref()
            .map(parse_date_param)
            .transpose()
            .map_err(AppointmentError::Validation)?;
        let to = query
            .to
            .as_deref()
            .map(parse_date_param)
            .transpose()
            .map_err(AppointmentError::Validation)?;

        let mut sql = String::from(
            "SELECT a.id, a.patient_id, a.date, a.time, a.description, a.status, \
             a.created_at, a.updated_at, p.user_name, p.email AS patient_email \
             FROM appointments a \
             JOIN patients p ON p.id = a.patient_id \
             WHERE a.doctor_id = ?",
        );
        if query.status.is_some() {
            sql.push_str(" AND a.status = ?");
        }
        if from.is_some() {
            sql.push_str(" AND a.date >= ?");
        }
        if to.is_some() {
            sql.push_str(" AND a.date <= ?");
        }
        sql.push_str(" ORDER BY a.date ASC, a.time ASC");

        let mut q = sqlx::query_as::<_, DoctorAppointment>(&sql).bind(doctor_id);
        if let Some(status) = query.status {
            q = q.bind(status);
        }
        if let Some(from) = from {
            q = q.bind(from);
        }
        if let Some(to) = to {
            q = q.bind(to);
        }

        q.fetch_all(self.db.pool())
            .await
            .map_err(|e| AppointmentError::Database(e.to_string()))
    }
}

pub(crate) fn map_write_error(e: sqlx::Error, doctor_id: Uuid) -> AppointmentError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            warn!("Slot conflict for doctor {}", doctor_id);
            AppointmentError::SlotConflict
        }
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            AppointmentError::UnknownParticipant
        }
        _ => AppointmentError::Database(e.to_string()),
    }
}
