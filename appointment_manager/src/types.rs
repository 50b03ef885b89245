use crate::schema::appointments;
use chrono::{DateTime, SecondsFormat, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::warn;

static TIME_PARSE_FALLBACKS: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: i64,
    pub customer_name: String,
    pub time: DateTime<Utc>,
    pub duration: i64,
    pub notes: String,
}

/// Appointment body as sent by clients on create and update.
///
/// Every field may be omitted. `id` is accepted so that clients can echo a
/// record back, but it is never used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppointmentPayload {
    pub id: Option<i64>,
    pub customer_name: String,
    pub time: Option<DateTime<Utc>>,
    pub duration: i64,
    pub notes: String,
}

/// A normalized appointment that has no id yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAppointment {
    pub customer_name: String,
    pub time: DateTime<Utc>,
    pub duration: i64,
    pub notes: String,
}

impl NewAppointment {
    pub fn with_id(self, id: i64) -> Appointment {
        Appointment {
            id,
            customer_name: self.customer_name,
            time: self.time,
            duration: self.duration,
            notes: self.notes,
        }
    }
}

/// Stored form of an appointment. `time` holds RFC3339 text in UTC.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable)]
#[diesel(table_name = appointments)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AppointmentRow {
    pub id: i64,
    pub customer_name: String,
    pub time: String,
    pub duration: i64,
    pub notes: String,
}

/// Every column except `id`, used for inserts and full-replace updates.
#[derive(Debug, Clone, PartialEq, Eq, Insertable, AsChangeset)]
#[diesel(table_name = appointments)]
pub struct AppointmentValues {
    pub customer_name: String,
    pub time: String,
    pub duration: i64,
    pub notes: String,
}

impl AppointmentValues {
    pub fn into_row(self, id: i64) -> AppointmentRow {
        AppointmentRow {
            id,
            customer_name: self.customer_name,
            time: self.time,
            duration: self.duration,
            notes: self.notes,
        }
    }
}

impl From<NewAppointment> for AppointmentValues {
    fn from(appointment: NewAppointment) -> Self {
        Self {
            customer_name: appointment.customer_name,
            time: format_time(&appointment.time),
            duration: appointment.duration,
            notes: appointment.notes,
        }
    }
}

impl From<AppointmentRow> for Appointment {
    /// Rows with an unreadable `time` get the current instant instead of
    /// failing the whole read.
    fn from(row: AppointmentRow) -> Self {
        let time = match DateTime::parse_from_rfc3339(&row.time) {
            Ok(time) => time.with_timezone(&Utc),
            Err(err) => {
                TIME_PARSE_FALLBACKS.fetch_add(1, Ordering::Relaxed);
                warn!(id = row.id, stored = %row.time, %err, "unreadable appointment time, substituting now");
                Utc::now()
            }
        };
        Self {
            id: row.id,
            customer_name: row.customer_name,
            time,
            duration: row.duration,
            notes: row.notes,
        }
    }
}

/// Canonical text form of a timestamp in the store. Fixed width, so text
/// order is time order.
pub fn format_time(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Number of stored times that could not be parsed since process start.
pub fn time_parse_fallbacks() -> u64 {
    TIME_PARSE_FALLBACKS.load(Ordering::Relaxed)
}
