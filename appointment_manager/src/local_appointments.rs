use crate::{
    backend::AppointmentBackend,
    error::StoreError,
    query::AppointmentQuery,
    types::{Appointment, AppointmentRow, AppointmentValues, NewAppointment},
};
use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex, MutexGuard},
};
use tracing::debug;

/// Appointments kept in process memory, used when no database is configured.
///
/// Rows are stored in the same shape as the database table so that filtering
/// and sorting behave the same on both backends.
#[derive(Debug, Clone, Default)]
pub struct LocalAppointments {
    table: Arc<Mutex<LocalTable>>,
}

#[derive(Debug, Default)]
struct LocalTable {
    rows: BTreeMap<i64, AppointmentRow>,
    last_id: i64,
}

impl LocalAppointments {
    fn table(&self) -> Result<MutexGuard<'_, LocalTable>, StoreError> {
        self.table
            .lock()
            .map_err(|_| StoreError::Unavailable("in-memory appointment table is poisoned".into()))
    }
}

impl AppointmentBackend for LocalAppointments {
    fn create(&self, appointment: NewAppointment) -> Result<i64, StoreError> {
        let mut table = self.table()?;
        table.last_id += 1;
        let id = table.last_id;
        table
            .rows
            .insert(id, AppointmentValues::from(appointment).into_row(id));
        debug!(id, "appointment created in memory");
        Ok(id)
    }

    fn list(&self, query: &AppointmentQuery) -> Result<Vec<Appointment>, StoreError> {
        let mut rows: Vec<AppointmentRow> = self
            .table()?
            .rows
            .values()
            .filter(|row| query.matches(row))
            .cloned()
            .collect();
        query.sort_rows(&mut rows);
        Ok(rows.into_iter().map(Appointment::from).collect())
    }

    fn get(&self, id: i64) -> Result<Appointment, StoreError> {
        self.table()?
            .rows
            .get(&id)
            .cloned()
            .map(Appointment::from)
            .ok_or(StoreError::NotFound(id))
    }

    fn update(&self, id: i64, appointment: NewAppointment) -> Result<(), StoreError> {
        let mut table = self.table()?;
        match table.rows.get_mut(&id) {
            Some(row) => {
                *row = AppointmentValues::from(appointment).into_row(id);
                Ok(())
            }
            None => Err(StoreError::NotFound(id)),
        }
    }

    fn delete(&self, id: i64) -> Result<(), StoreError> {
        match self.table()?.rows.remove(&id) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound(id)),
        }
    }
}
