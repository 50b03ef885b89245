use crate::configuration::Configuration;
use clap::Parser;
use std::{path::PathBuf, time::Duration};

#[derive(Debug, Clone, Parser)]
#[command(name = "appointment_manager", about = "Appointment management HTTP service")]
pub struct ConfigurationHandler {
    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 8080)]
    port: u16,

    /// SQLite database file; without it appointments are not persisted
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Directory served on every path that is not part of the API
    #[arg(long, env = "STATIC_DIR", default_value = "./static")]
    static_dir: PathBuf,

    /// Milliseconds a single store call may take before the request fails
    #[arg(long, env = "STORE_TIMEOUT_MS", default_value_t = 5000)]
    store_timeout_ms: u64,

    /// Change events buffered per subscriber before it starts missing events
    #[arg(long, env = "EVENT_CAPACITY", default_value_t = 64)]
    event_capacity: usize,
}

impl ConfigurationHandler {
    pub fn parse_arguments() -> Self {
        Self::parse()
    }
}

impl Configuration for ConfigurationHandler {
    fn port(&self) -> u16 {
        self.port
    }

    fn database_url(&self) -> Option<String> {
        self.database_url.clone()
    }

    fn static_dir(&self) -> PathBuf {
        self.static_dir.clone()
    }

    fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    fn event_capacity(&self) -> usize {
        self.event_capacity
    }
}
