use crate::schema::appointments;
use crate::types::{format_time, AppointmentRow};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::sqlite::Sqlite;
use serde::Deserialize;

/// Raw query string of `GET /appointments`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppointmentFilter {
    pub start: Option<String>,
    pub end: Option<String>,
    pub customer: Option<String>,
    pub sort: Option<String>,
}

/// Columns a listing may be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Time,
    CustomerName,
    Duration,
}

impl SortField {
    /// Unknown column names yield `None` and are never passed on.
    pub fn from_column(column: &str) -> Option<Self> {
        match column {
            "time" => Some(Self::Time),
            "customer_name" => Some(Self::CustomerName),
            "duration" => Some(Self::Duration),
            _ => None,
        }
    }
}

/// Closed range over the stored time text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeRange {
    pub start: String,
    pub end: String,
}

/// Validated listing query. All conditions are combined with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppointmentQuery {
    pub time_range: Option<TimeRange>,
    pub customer: Option<String>,
    pub sort: Option<SortField>,
}

impl From<AppointmentFilter> for AppointmentQuery {
    fn from(filter: AppointmentFilter) -> Self {
        let start = filter.start.filter(|start| !start.is_empty());
        let end = filter.end.filter(|end| !end.is_empty());

        // A single bound is ignored.
        let time_range = match (start, end) {
            (Some(start), Some(end)) => Some(TimeRange {
                start: stored_form(start),
                end: stored_form(end),
            }),
            _ => None,
        };

        Self {
            time_range,
            customer: filter.customer.filter(|customer| !customer.is_empty()),
            sort: filter.sort.as_deref().and_then(SortField::from_column),
        }
    }
}

/// Bounds that read as RFC3339 are rewritten into the stored text form so
/// that text comparison follows time order. Anything else is left as is.
fn stored_form(bound: String) -> String {
    match DateTime::parse_from_rfc3339(&bound) {
        Ok(time) => format_time(&time.with_timezone(&Utc)),
        Err(_) => bound,
    }
}

/// `LIKE` pattern matching `customer` literally anywhere in the name.
fn like_pattern(customer: &str) -> String {
    let mut pattern = String::with_capacity(customer.len() + 2);
    pattern.push('%');
    for c in customer.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

impl AppointmentQuery {
    /// SQL rendering; every user value travels as a bind parameter.
    pub fn to_sql(&self) -> appointments::BoxedQuery<'static, Sqlite> {
        let mut statement = appointments::table.into_boxed();

        if let Some(range) = &self.time_range {
            statement = statement
                .filter(appointments::time.ge(range.start.clone()))
                .filter(appointments::time.le(range.end.clone()));
        }

        if let Some(customer) = &self.customer {
            statement = statement.filter(
                appointments::customer_name
                    .like(like_pattern(customer))
                    .escape('\\'),
            );
        }

        match self.sort {
            Some(SortField::Time) => statement.order(appointments::time.asc()),
            Some(SortField::CustomerName) => statement.order(appointments::customer_name.asc()),
            Some(SortField::Duration) => statement.order(appointments::duration.asc()),
            None => statement,
        }
    }

    /// In-memory counterpart of the `WHERE` clause. The customer match is
    /// ASCII case-insensitive like SQLite's `LIKE`.
    pub fn matches(&self, row: &AppointmentRow) -> bool {
        if let Some(range) = &self.time_range {
            if row.time.as_str() < range.start.as_str() || row.time.as_str() > range.end.as_str() {
                return false;
            }
        }

        if let Some(customer) = &self.customer {
            let name = row.customer_name.to_ascii_lowercase();
            if !name.contains(&customer.to_ascii_lowercase()) {
                return false;
            }
        }

        true
    }

    /// In-memory counterpart of the `ORDER BY` clause. Stable, so unsorted
    /// listings keep insertion order.
    pub fn sort_rows(&self, rows: &mut [AppointmentRow]) {
        match self.sort {
            Some(SortField::Time) => rows.sort_by(|a, b| a.time.cmp(&b.time)),
            Some(SortField::CustomerName) => rows.sort_by(|a, b| a.customer_name.cmp(&b.customer_name)),
            Some(SortField::Duration) => rows.sort_by_key(|row| row.duration),
            None => {}
        }
    }
}
