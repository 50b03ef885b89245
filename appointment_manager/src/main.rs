use std::{sync::Arc, time::Duration};

use crate::{
    configuration::Configuration, configuration_handler::ConfigurationHandler,
    database_interface::DatabaseInterface, http::create_app, local_appointments::LocalAppointments,
    notifier::{BroadcastNotifier, NotificationSink},
};
use anyhow::Context;
use tokio::time::sleep;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod backend;
mod configuration;
mod configuration_handler;
mod database_interface;
mod error;
mod http;
mod local_appointments;
mod normalizer;
mod notifier;
mod query;
mod schema;
#[cfg(test)]
mod testutils;
mod types;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("appointment_manager=info,tower_http=info")),
        )
        .init();

    let configuration = ConfigurationHandler::parse_arguments();

    let address = format!("0.0.0.0:{}", configuration.port());
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("bind {address}"))?;
    info!(%address, "appointment manager listening");

    let notifier: Arc<dyn NotificationSink> =
        Arc::new(BroadcastNotifier::new(configuration.event_capacity()));

    let app = if let Some(database_url) = configuration.database_url() {
        let backend = loop {
            match DatabaseInterface::new(&database_url) {
                Ok(backend) => {
                    info!("Successfully connected to database");
                    break backend;
                }
                Err(err) => {
                    error!(%err, "Failed to open database: {database_url}. Retry in 1 sec.");
                    sleep(Duration::from_secs(1)).await;
                }
            }
        };
        create_app(backend, notifier, &configuration)
    } else {
        warn!("No database configured, appointments are kept in memory only");
        create_app(LocalAppointments::default(), notifier, &configuration)
    };

    axum::serve(listener, app).await.context("serve http")?;
    Ok(())
}
