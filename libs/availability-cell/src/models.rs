// libs/availability-cell/src/models.rs
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const MIN_SLOT_MINUTES: i32 = 5;
pub const MAX_SLOT_MINUTES: i32 = 240;

/// One recurring weekly booking window for a doctor. At most one row
/// exists per (doctor, weekday); saving a weekday replaces its row
/// wholesale rather than merging.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct WeeklyAvailability {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub weekday: i32,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub slot_minutes: i32,
    pub is_active: bool,
}

/// One row of the doctor's "save my week" payload. Times arrive as raw
/// `HH:MM` strings and are parsed once at the boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklyScheduleEntry {
    pub weekday: i32,
    pub start_time: String,
    pub end_time: String,
    #[serde(default = "default_slot_minutes")]
    pub slot_minutes: i32,
    #[serde(default = "default_is_active")]
    pub is_active: bool,
}

fn default_slot_minutes() -> i32 {
    30
}

fn default_is_active() -> bool {
    true
}

#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),
}
