use crate::backend::AppointmentBackend;
use crate::configuration::Configuration;
use crate::error::{ApiError, StoreError};
use crate::normalizer::normalize;
use crate::notifier::{ChangeEvent, NotificationSink};
use crate::query::{AppointmentFilter, AppointmentQuery};
use crate::types::{time_parse_fallbacks, Appointment, AppointmentPayload};
use axum::body::Bytes;
use axum::extract::{Path, Query};
use axum::http::header;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use axum::{routing::get, Router};
use chrono::Utc;
use futures::Stream;
use serde_json::{json, Value};
use std::{convert::Infallible, sync::Arc, time::Duration};
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};
use tokio_stream::StreamExt;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct AppState<T: AppointmentBackend> {
    backend: T,
    notifier: Arc<dyn NotificationSink>,
    store_timeout: Duration,
}

impl<T: AppointmentBackend> AppState<T> {
    /// Runs a store call on the blocking pool. The call is not cancelled when
    /// the timeout fires, only the request stops waiting for it.
    async fn run<R, F>(&self, operation: F) -> Result<R, StoreError>
    where
        R: Send + 'static,
        F: FnOnce(&T) -> Result<R, StoreError> + Send + 'static,
    {
        let backend = self.backend.clone();
        let call = tokio::task::spawn_blocking(move || operation(&backend));

        match tokio::time::timeout(self.store_timeout, call).await {
            Ok(Ok(result)) => result,
            Ok(Err(err)) => Err(StoreError::Unavailable(format!("store worker failed: {err}"))),
            Err(_) => Err(StoreError::Timeout(self.store_timeout)),
        }
    }
}

pub fn create_app<T: AppointmentBackend, C: Configuration>(
    backend: T,
    notifier: Arc<dyn NotificationSink>,
    configuration: &C,
) -> Router {
    let state = AppState {
        backend,
        notifier,
        store_timeout: configuration.store_timeout(),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route(
            "/appointments",
            get(list_appointments::<T>).post(create_appointment::<T>),
        )
        .route(
            "/appointments/:id",
            get(get_appointment::<T>)
                .put(update_appointment::<T>)
                .delete(delete_appointment::<T>),
        )
        .route("/events", get(subscribe_events::<T>))
        .route("/health", get(health));

    api.fallback_service(ServeDir::new(configuration.static_dir()))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

fn parse_id(raw_id: &str) -> Result<i64, ApiError> {
    raw_id
        .parse()
        .map_err(|_| ApiError::BadRequest("Invalid appointment ID".into()))
}

/// JSON bodies are accepted regardless of the request content type.
fn parse_payload(body: &[u8]) -> Result<AppointmentPayload, ApiError> {
    serde_json::from_slice(body).map_err(|err| ApiError::BadRequest(err.to_string()))
}

async fn list_appointments<T: AppointmentBackend>(
    State(state): State<AppState<T>>,
    Query(filter): Query<AppointmentFilter>,
) -> Result<Json<Vec<Appointment>>, ApiError> {
    let query = AppointmentQuery::from(filter);
    debug!(?query, "listing appointments");
    let appointments = state.run(move |backend| backend.list(&query)).await?;
    Ok(Json(appointments))
}

async fn create_appointment<T: AppointmentBackend>(
    State(state): State<AppState<T>>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let new_appointment = normalize(parse_payload(&body)?, Utc::now());
    let record = new_appointment.clone();
    let id = state
        .run(move |backend| backend.create(new_appointment))
        .await?;

    let appointment = record.with_id(id);
    state
        .notifier
        .notify(ChangeEvent::created(appointment.clone()));

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, format!("/appointments/{id}"))],
        Json(appointment),
    ))
}

async fn get_appointment<T: AppointmentBackend>(
    State(state): State<AppState<T>>,
    Path(raw_id): Path<String>,
) -> Result<Json<Appointment>, ApiError> {
    let id = parse_id(&raw_id)?;
    let appointment = state.run(move |backend| backend.get(id)).await?;
    Ok(Json(appointment))
}

async fn update_appointment<T: AppointmentBackend>(
    State(state): State<AppState<T>>,
    Path(raw_id): Path<String>,
    body: Bytes,
) -> Result<Json<Appointment>, ApiError> {
    let id = parse_id(&raw_id)?;
    // The body is checked before the store, so a bad body on a missing id is 400.
    let updated = normalize(parse_payload(&body)?, Utc::now());
    let record = updated.clone();
    state
        .run(move |backend| backend.update(id, updated))
        .await?;

    let appointment = record.with_id(id);
    state
        .notifier
        .notify(ChangeEvent::updated(appointment.clone()));
    Ok(Json(appointment))
}

async fn delete_appointment<T: AppointmentBackend>(
    State(state): State<AppState<T>>,
    Path(raw_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&raw_id)?;
    state.run(move |backend| backend.delete(id)).await?;
    state.notifier.notify(ChangeEvent::deleted(id));
    Ok(StatusCode::NO_CONTENT)
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "time_parse_fallbacks": time_parse_fallbacks(),
    }))
}

/// Server-sent change events. Each event is named after its kind and carries
/// the JSON encoded `ChangeEvent`.
async fn subscribe_events<T: AppointmentBackend>(
    State(state): State<AppState<T>>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let receiver = state.notifier.subscribe().ok_or(ApiError::NotFound)?;

    let stream = BroadcastStream::new(receiver).filter_map(|message| match message {
        Ok(change) => Event::default()
            .event(change.kind.as_str())
            .json_data(&change)
            .ok()
            .map(Ok),
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            warn!(skipped, "event subscriber fell behind, dropping events");
            None
        }
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
