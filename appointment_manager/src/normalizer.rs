use crate::types::{AppointmentPayload, NewAppointment};
use chrono::{DateTime, NaiveDate, Utc};

/// Turns a client payload into a storable appointment.
///
/// A missing or zero `time` becomes `now`, any other time passes through
/// untouched. The payload `id` is dropped: new ids come from the store and
/// updates take theirs from the request path.
pub fn normalize(payload: AppointmentPayload, now: DateTime<Utc>) -> NewAppointment {
    let time = match payload.time {
        Some(time) if !is_zero_time(&time) => time,
        _ => now,
    };

    NewAppointment {
        customer_name: payload.customer_name,
        time,
        duration: payload.duration,
        notes: payload.notes,
    }
}

/// `0001-01-01T00:00:00Z` is what clients send for an unset time.
pub fn is_zero_time(time: &DateTime<Utc>) -> bool {
    NaiveDate::from_ymd_opt(1, 1, 1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .is_some_and(|zero| time.naive_utc() == zero)
}
