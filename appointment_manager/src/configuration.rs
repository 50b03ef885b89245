use std::{path::PathBuf, time::Duration};

pub trait Configuration: Clone + Send + Sync + 'static {
    fn port(&self) -> u16;
    /// SQLite database path. Appointments are kept in memory when unset.
    fn database_url(&self) -> Option<String>;
    fn static_dir(&self) -> PathBuf;
    /// Upper bound for a single store call.
    fn store_timeout(&self) -> Duration;
    fn event_capacity(&self) -> usize;
}
