use chrono::NaiveTime;
use tracing::debug;
use uuid::Uuid;

use shared_database::Database;
use shared_utils::timeslot::parse_time_param;

use crate::models::{
    ScheduleError, WeeklyAvailability, WeeklyScheduleEntry, MAX_SLOT_MINUTES, MIN_SLOT_MINUTES,
};

/// Manages a doctor's recurring weekly availability rules.
pub struct ScheduleService {
    db: Database,
}

struct ParsedEntry {
    weekday: i32,
    start_time: NaiveTime,
    end_time: NaiveTime,
    slot_minutes: i32,
    is_active: bool,
}

impl ParsedEntry {
    fn validate(entry: &WeeklyScheduleEntry) -> Result<Self, ScheduleError> {
        if !(0..=6).contains(&entry.weekday) {
            return Err(ScheduleError::Validation(format!(
                "Weekday must be between 0 (Sunday) and 6 (Saturday), got {}",
                entry.weekday
            )));
        }

        if !(MIN_SLOT_MINUTES..=MAX_SLOT_MINUTES).contains(&entry.slot_minutes) {
            return Err(ScheduleError::Validation(format!(
                "Slot duration must be between {} and {} minutes, got {}",
                MIN_SLOT_MINUTES, MAX_SLOT_MINUTES, entry.slot_minutes
            )));
        }

        let start_time = parse_time_param(&entry.start_time).map_err(ScheduleError::Validation)?;
        let end_time = parse_time_param(&entry.end_time).map_err(ScheduleError::Validation)?;

        if entry.is_active && start_time >= end_time {
            return Err(ScheduleError::Validation(
                "Start time must be before end time".to_string(),
            ));
        }

        Ok(Self {
            weekday: entry.weekday,
            start_time,
            end_time,
            slot_minutes: entry.slot_minutes,
            is_active: entry.is_active,
        })
    }
}

impl ScheduleService {
    pub fn new(db: &Database) -> Self {
        Self { db: db.clone() }
    }

    /// A doctor's saved weekly rules, ordered by weekday.
    pub async fn get_week(&self, doctor_id: Uuid) -> Result<Vec<WeeklyAvailability>, ScheduleError> {
        sqlx::query_as::<_, WeeklyAvailability>(
            "SELECT id, doctor_id, weekday, start_time, end_time, slot_minutes, is_active \
             FROM doctor_availability WHERE doctor_id = ? ORDER BY weekday ASC",
        )
        .bind(doctor_id)
        .fetch_all(self.db.pool())
        .await
        .map_err(|e| ScheduleError::Database(e.to_string()))
    }

    /// Upsert the submitted weekdays in one transaction. Each submitted row
    /// replaces the existing rule for its weekday; weekdays absent from the
    /// payload are left untouched. A failure anywhere rolls the whole save
    /// back, so a week is never half-written.
    pub async fn save_week(
        &self,
        doctor_id: Uuid,
        entries: Vec<WeeklyScheduleEntry>,
    ) -> Result<(), ScheduleError> {
        debug!("Saving {} weekly rule(s) for doctor {}", entries.len(), doctor_id);

        // Validate the full payload before touching storage.
        let mut parsed = Vec::with_capacity(entries.len());
        for entry in &entries {
            parsed.push(ParsedEntry::validate(entry)?);
        }

        let mut tx = self
            .db
            .pool()
            .begin()
            .await
            .map_err(|e| ScheduleError::Database(e.to_string()))?;

        for row in &parsed {
            // delete then insert per weekday to keep a single row
            sqlx::query("DELETE FROM doctor_availability WHERE doctor_id = ? AND weekday = ?")
                .bind(doctor_id)
                .bind(row.weekday)
                .execute(&mut *tx)
                .await
                .map_err(|e| ScheduleError::Database(e.to_string()))?;

            sqlx::query(
                "INSERT INTO doctor_availability \
                 (id, doctor_id, weekday, start_time, end_time, slot_minutes, is_active) \
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(Uuid::new_v4())
            .bind(doctor_id)
            .bind(row.weekday)
            .bind(row.start_time)
            .bind(row.end_time)
            .bind(row.slot_minutes)
            .bind(row.is_active)
            .execute(&mut *tx)
            .await
            .map_err(|e| ScheduleError::Database(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| ScheduleError::Database(e.to_string()))
    }
}
