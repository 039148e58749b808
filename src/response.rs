//! Standard response envelope helpers.

use axum::{http::StatusCode, Json};
use serde::Serialize;

#[derive(Serialize)]
pub struct Created<T> {
    pub message: String,
    pub data: T,
}

pub fn created<T: Serialize>(message: &str, data: T) -> (StatusCode, Json<Created<T>>) {
    (
        StatusCode::CREATED,
        Json(Created {
            message: message.to_string(),
            data,
        }),
    )
}
