//! HTTP handler for event ingestion.

use crate::error::AppError;
use crate::event::{EventPayload, EventRecord};
use crate::response;
use crate::state::AppState;
use axum::extract::rejection::FormRejection;
use axum::extract::State;
use axum::Form;
use serde_json::Value;

/// `POST /api/events`: validate the form body, acquire the cached
/// connection, insert the record, reply 201 with the stored document.
/// Validation runs before any connection is acquired, so invalid input
/// never triggers network I/O.
pub async fn create_event(
    State(state): State<AppState>,
    payload: Result<Form<EventPayload>, FormRejection>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let Form(payload) =
        payload.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
    let record = payload.into_record()?;

    let db = state.cache.acquire().await?;
    let inserted = db
        .collection::<EventRecord>(&state.collection)
        .insert_one(&record)
        .await?;

    let mut data = serde_json::to_value(&record)?;
    if let (Value::Object(map), Some(oid)) = (&mut data, inserted.inserted_id.as_object_id()) {
        map.insert("id".into(), Value::String(oid.to_hex()));
    }
    Ok(response::created("event created", data))
}
