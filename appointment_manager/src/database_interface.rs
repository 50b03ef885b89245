use crate::schema::appointments;
use crate::types::{Appointment, AppointmentRow, AppointmentValues, NewAppointment};
use crate::{backend::AppointmentBackend, error::StoreError, query::AppointmentQuery};
use diesel::prelude::*;
use diesel::SqliteConnection;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

const CREATE_APPOINTMENTS_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS appointments (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        customer_name TEXT NOT NULL DEFAULT '',
        time TEXT NOT NULL DEFAULT '',
        duration INTEGER NOT NULL DEFAULT 0,
        notes TEXT NOT NULL DEFAULT ''
    )";

/// SQLite backed appointment store. A single connection serializes writers.
#[derive(Clone)]
pub struct DatabaseInterface {
    connection: Arc<Mutex<SqliteConnection>>,
}

impl DatabaseInterface {
    pub fn new(database_url: &str) -> Result<Self, StoreError> {
        let mut connection = SqliteConnection::establish(database_url)?;
        diesel::sql_query("PRAGMA busy_timeout = 5000").execute(&mut connection)?;
        diesel::sql_query(CREATE_APPOINTMENTS_TABLE).execute(&mut connection)?;
        info!(database_url, "appointments table ready");

        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    fn connection(&self) -> Result<MutexGuard<'_, SqliteConnection>, StoreError> {
        self.connection
            .lock()
            .map_err(|_| StoreError::Unavailable("database connection lock is poisoned".into()))
    }
}

impl AppointmentBackend for DatabaseInterface {
    fn create(&self, appointment: NewAppointment) -> Result<i64, StoreError> {
        let mut connection = self.connection()?;
        let id = diesel::insert_into(appointments::table)
            .values(&AppointmentValues::from(appointment))
            .returning(appointments::id)
            .get_result::<i64>(&mut *connection)?;

        debug!(id, "appointment inserted");
        Ok(id)
    }

    fn list(&self, query: &AppointmentQuery) -> Result<Vec<Appointment>, StoreError> {
        let mut connection = self.connection()?;
        let rows = query.to_sql().load::<AppointmentRow>(&mut *connection)?;
        Ok(rows.into_iter().map(Appointment::from).collect())
    }

    fn get(&self, id: i64) -> Result<Appointment, StoreError> {
        let mut connection = self.connection()?;
        appointments::table
            .find(id)
            .first::<AppointmentRow>(&mut *connection)
            .optional()?
            .map(Appointment::from)
            .ok_or(StoreError::NotFound(id))
    }

    fn update(&self, id: i64, appointment: NewAppointment) -> Result<(), StoreError> {
        let mut connection = self.connection()?;
        let changed = diesel::update(appointments::table.find(id))
            .set(&AppointmentValues::from(appointment))
            .execute(&mut *connection)?;

        match changed {
            0 => Err(StoreError::NotFound(id)),
            _ => Ok(()),
        }
    }

    fn delete(&self, id: i64) -> Result<(), StoreError> {
        let mut connection = self.connection()?;
        let removed = diesel::delete(appointments::table.find(id)).execute(&mut *connection)?;

        match removed {
            0 => Err(StoreError::NotFound(id)),
            _ => Ok(()),
        }
    }
}
