use axum::{Json, extract::State};
use chrono::Utc;
use serde_json::{Value, json};

use crate::{pkg::server::state::AppState, prelude::Result};

pub async fn livez() -> Result<()> {
    tracing::debug!("service is live");
    Ok(())
}

pub async fn healthz(State(state): State<AppState>) -> Result<()> {
    state.jobs.ping().await?;
    tracing::debug!("service is healthy");
    Ok(())
}

pub async fn ping() -> Json<Value> {
    Json(json!({
        "message": "API is working!",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}
