use std::collections::{BTreeSet, HashSet};

use chrono::{DateTime, NaiveTime, Timelike, Utc};
use tracing::debug;
use uuid::Uuid;

use shared_database::Database;
use shared_utils::timeslot::{
    expand_window, format_slot, parse_date_param, starts_too_soon, weekday_index,
};

use crate::models::ScheduleError;

/// Turns a doctor's weekly rules into the concrete free slots for one
/// calendar date. Read-only; every call recomputes from current data.
pub struct SlotResolver {
    db: Database,
}

#[derive(sqlx::FromRow)]
struct RuleRow {
    start_time: NaiveTime,
    end_time: NaiveTime,
    slot_minutes: i64,
}

#[derive(sqlx::FromRow)]
struct TakenRow {
    time: NaiveTime,
}

impl SlotResolver {
    pub fn new(db: &Database) -> Self {
        Self { db: db.clone() }
    }

    /// Free `HH:MM` slots for (doctor, date), ascending. An unknown doctor
    /// or a weekday without an active rule yields an empty list, not an
    /// error; a malformed date is rejected up front.
    pub async fn resolve_free_slots(
        &self,
        doctor_id: Uuid,
        date: &str,
    ) -> Result<Vec<String>, ScheduleError> {
        self.resolve_free_slots_at(doctor_id, date, Utc::now()).await
    }

    /// Same as [`resolve_free_slots`](Self::resolve_free_slots) with the
    /// clock passed in, so same-day buffering is deterministic under test.
    pub async fn resolve_free_slots_at(
        &self,
        doctor_id: Uuid,
        date: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<String>, ScheduleError> {
        let date = parse_date_param(date).map_err(ScheduleError::Validation)?;
        let weekday = weekday_index(date);

        debug!("Resolving slots for doctor {} on {} (weekday {})", doctor_id, date, weekday);

        // Both reads run inside one transaction so a booking landing between
        // them cannot show up as a free slot.
        let mut tx = self
            .db
            .pool()
            .begin()
            .await
            .map_err(|e| ScheduleError::Database(e.to_string()))?;

        let rules: Vec<RuleRow> = sqlx::query_as(
            "SELECT start_time, end_time, slot_minutes FROM doctor_availability \
             WHERE doctor_id = ? AND weekday = ? AND is_active = 1 ORDER BY start_time ASC",
        )
        .bind(doctor_id)
        .bind(weekday)
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| ScheduleError::Database(e.to_string()))?;

        let taken: Vec<TakenRow> = sqlx::query_as(
            "SELECT time FROM appointments \
             WHERE doctor_id = ? AND date = ? AND status IN ('pending', 'confirmed')",
        )
        .bind(doctor_id)
        .bind(date)
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| ScheduleError::Database(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| ScheduleError::Database(e.to_string()))?;

        // Slot identity is minute-granular; stored times may carry seconds.
        let taken: HashSet<NaiveTime> = taken
            .into_iter()
            .map(|row| truncate_to_minute(row.time))
            .collect();

        let mut candidates: BTreeSet<NaiveTime> = BTreeSet::new();
        for rule in &rules {
            let step = u32::try_from(rule.slot_minutes).unwrap_or(0);
            candidates.extend(expand_window(rule.start_time, rule.end_time, step));
        }

        let today = now.date_naive();
        let free: Vec<String> = candidates
            .into_iter()
            .filter(|slot| !taken.contains(slot))
            .filter(|slot| date != today || !starts_too_soon(date, *slot, now))
            .map(format_slot)
            .collect();

        debug!("Found {} free slot(s) for doctor {} on {}", free.len(), doctor_id, date);

        Ok(free)
    }
}

fn truncate_to_minute(t: NaiveTime) -> NaiveTime {
    NaiveTime::from_hms_opt(t.hour(), t.minute(), 0).unwrap()
}
