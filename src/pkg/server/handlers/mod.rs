pub mod admin;
pub mod auth;
pub mod jobs;
pub mod payload;
pub mod posters;
pub mod probes;

use axum::{Json, http::StatusCode};
use serde_json::{Value, json};

use crate::prelude::{AppError, Result};

pub async fn fallback() -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "message": "Route not found" })),
    )
}

pub async fn method_not_allowed() -> (StatusCode, Json<Value>) {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({ "message": "Method not allowed" })),
    )
}

/// Path ids that are not integers cannot name a row.
pub fn parse_id(raw: &str, missing: &'static str) -> Result<i64> {
    raw.parse::<i64>().map_err(|_| AppError::NotFound(missing))
}
