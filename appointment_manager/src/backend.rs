use crate::error::StoreError;
use crate::query::AppointmentQuery;
use crate::types::{Appointment, NewAppointment};

/// Persistent table of appointments. Each call is its own atomic unit.
pub trait AppointmentBackend: Clone + Send + Sync + 'static {
    /// Stores a new appointment and returns its freshly assigned id.
    fn create(&self, appointment: NewAppointment) -> Result<i64, StoreError>;
    fn list(&self, query: &AppointmentQuery) -> Result<Vec<Appointment>, StoreError>;
    fn get(&self, id: i64) -> Result<Appointment, StoreError>;
    /// Replaces every field except `id`.
    fn update(&self, id: i64, appointment: NewAppointment) -> Result<(), StoreError>;
    fn delete(&self, id: i64) -> Result<(), StoreError>;
}
