//! Event payload and stored record. The inbound form is a fixed, validated
//! schema rather than an open-ended field map, so malformed input is caught
//! before anything touches the database.

use crate::error::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const MAX_TITLE_LEN: usize = 200;
const MAX_SHORT_FIELD_LEN: usize = 200;
const MAX_DESCRIPTION_LEN: usize = 2000;

/// Form-encoded request body for `POST /api/events`.
#[derive(Debug, Clone, Deserialize)]
pub struct EventPayload {
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub organizer: Option<String>,
    /// RFC 3339 timestamp, e.g. `2026-09-01T18:00:00Z`.
    pub starts_at: Option<String>,
    pub capacity: Option<i64>,
}

/// Document written to the events collection and echoed in the 201 body.
#[derive(Debug, Clone, Serialize)]
pub struct EventRecord {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organizer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl EventPayload {
    /// Validate and convert into the stored record. No state is mutated on
    /// failure; violations map to HTTP 422.
    pub fn into_record(self) -> Result<EventRecord, AppError> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(AppError::Validation("title is required".into()));
        }
        if title.len() > MAX_TITLE_LEN {
            return Err(AppError::Validation(format!(
                "title must be at most {} characters",
                MAX_TITLE_LEN
            )));
        }
        check_len("description", self.description.as_deref(), MAX_DESCRIPTION_LEN)?;
        check_len("location", self.location.as_deref(), MAX_SHORT_FIELD_LEN)?;
        check_len("organizer", self.organizer.as_deref(), MAX_SHORT_FIELD_LEN)?;

        if let Some(capacity) = self.capacity {
            if capacity < 0 {
                return Err(AppError::Validation("capacity must not be negative".into()));
            }
        }

        let starts_at = match self.starts_at.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                DateTime::parse_from_rfc3339(raw)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(|_| {
                        AppError::Validation("starts_at must be an RFC 3339 timestamp".into())
                    })?,
            ),
        };

        Ok(EventRecord {
            title,
            description: non_empty(self.description),
            location: non_empty(self.location),
            organizer: non_empty(self.organizer),
            starts_at,
            capacity: self.capacity,
            created_at: Utc::now(),
        })
    }
}

fn check_len(field: &str, value: Option<&str>, max: usize) -> Result<(), AppError> {
    if let Some(v) = value {
        if v.len() > max {
            return Err(AppError::Validation(format!(
                "{} must be at most {} characters",
                field, max
            )));
        }
    }
    Ok(())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
