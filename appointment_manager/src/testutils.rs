use std::{
    collections::BTreeMap,
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use crate::{
    backend::AppointmentBackend,
    configuration::Configuration,
    error::StoreError,
    query::AppointmentQuery,
    types::{Appointment, NewAppointment},
};

pub struct MockAppointmentBackendInner {
    pub success: AtomicBool,
    pub delay: Mutex<Duration>,
    pub calls_to_create: AtomicU64,
    pub calls_to_list: AtomicU64,
    pub calls_to_get: AtomicU64,
    pub calls_to_update: AtomicU64,
    pub calls_to_delete: AtomicU64,
    pub last_query: Mutex<Option<AppointmentQuery>>,
    pub appointments: Mutex<BTreeMap<i64, Appointment>>,
    last_id: AtomicI64,
}

/// Counts calls and keeps appointments in a map. Every call fails while
/// `success` is false and sleeps for `delay` first.
#[derive(Clone)]
pub struct MockAppointmentBackend(pub Arc<MockAppointmentBackendInner>);

impl MockAppointmentBackendInner {
    fn new() -> Self {
        Self {
            success: AtomicBool::new(true),
            delay: Mutex::new(Duration::ZERO),
            calls_to_create: AtomicU64::default(),
            calls_to_list: AtomicU64::default(),
            calls_to_get: AtomicU64::default(),
            calls_to_update: AtomicU64::default(),
            calls_to_delete: AtomicU64::default(),
            last_query: Mutex::default(),
            appointments: Mutex::default(),
            last_id: AtomicI64::default(),
        }
    }
}

impl MockAppointmentBackend {
    pub fn new() -> Self {
        Self(Arc::new(MockAppointmentBackendInner::new()))
    }

    pub fn insert(&self, appointment: Appointment) {
        self.0.last_id.fetch_max(appointment.id, Ordering::SeqCst);
        self.0
            .appointments
            .lock()
            .unwrap()
            .insert(appointment.id, appointment);
    }

    fn result(&self) -> Result<(), StoreError> {
        let delay = *self.0.delay.lock().unwrap();
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
        match self.0.success.load(Ordering::SeqCst) {
            true => Ok(()),
            false => Err(StoreError::Unavailable("Supposed to fail".into())),
        }
    }
}

impl AppointmentBackend for MockAppointmentBackend {
    fn create(&self, appointment: NewAppointment) -> Result<i64, StoreError> {
        self.0.calls_to_create.fetch_add(1, Ordering::SeqCst);
        self.result()?;
        let id = self.0.last_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.insert(appointment.with_id(id));
        Ok(id)
    }

    fn list(&self, query: &AppointmentQuery) -> Result<Vec<Appointment>, StoreError> {
        self.0.calls_to_list.fetch_add(1, Ordering::SeqCst);
        self.result()?;
        *self.0.last_query.lock().unwrap() = Some(query.clone());
        Ok(self.0.appointments.lock().unwrap().values().cloned().collect())
    }

    fn get(&self, id: i64) -> Result<Appointment, StoreError> {
        self.0.calls_to_get.fetch_add(1, Ordering::SeqCst);
        self.result()?;
        self.0
            .appointments
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    fn update(&self, id: i64, appointment: NewAppointment) -> Result<(), StoreError> {
        self.0.calls_to_update.fetch_add(1, Ordering::SeqCst);
        self.result()?;
        match self.0.appointments.lock().unwrap().get_mut(&id) {
            Some(stored) => {
                *stored = appointment.with_id(id);
                Ok(())
            }
            None => Err(StoreError::NotFound(id)),
        }
    }

    fn delete(&self, id: i64) -> Result<(), StoreError> {
        self.0.calls_to_delete.fetch_add(1, Ordering::SeqCst);
        self.result()?;
        match self.0.appointments.lock().unwrap().remove(&id) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound(id)),
        }
    }
}

#[derive(Clone)]
pub struct TestConfiguration {
    pub store_timeout: Duration,
}

impl Default for TestConfiguration {
    fn default() -> Self {
        Self {
            store_timeout: Duration::from_secs(5),
        }
    }
}

impl Configuration for TestConfiguration {
    fn port(&self) -> u16 {
        0
    }

    fn database_url(&self) -> Option<String> {
        None
    }

    fn static_dir(&self) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("static")
    }

    fn store_timeout(&self) -> Duration {
        self.store_timeout
    }

    fn event_capacity(&self) -> usize {
        16
    }
}
