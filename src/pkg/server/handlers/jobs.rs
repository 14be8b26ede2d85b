use axum::{
    Extension, Json,
    extract::{Path, Request, State},
    http::StatusCode,
};
use serde_json::{Value, json};

use crate::{
    pkg::{
        internal::{adaptors::jobs::spec::JobEntry, auth::Identity, jobs::JOB_NOT_FOUND},
        server::{
            handlers::{parse_id, payload::JobPayload},
            state::AppState,
        },
    },
    prelude::Result,
};

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<JobEntry>>> {
    let jobs = state
        .jobs
        .list()
        .await
        .map_err(|e| e.context("Failed to fetch jobs"))?;
    Ok(Json(jobs))
}

pub async fn show(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<JobEntry>> {
    let id = parse_id(&id, JOB_NOT_FOUND)?;
    let job = state
        .jobs
        .get(id)
        .await
        .map_err(|e| e.context("Failed to fetch job"))?;
    Ok(Json(job))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    request: Request,
) -> Result<(StatusCode, Json<Value>)> {
    let user = identity.require_user()?;
    let payload = JobPayload::extract(request).await?;
    let job = state
        .jobs
        .create(payload.fields, payload.poster)
        .await
        .map_err(|e| e.context("Failed to create job"))?;
    tracing::info!("{} created job {}", &user.user.email, job.id);
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Job created successfully",
            "data": job,
        })),
    ))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
    request: Request,
) -> Result<Json<Value>> {
    let user = identity.require_user()?;
    let id = parse_id(&id, JOB_NOT_FOUND)?;
    let payload = JobPayload::extract(request).await?;
    let job = state
        .jobs
        .update(id, payload.fields, payload.poster)
        .await
        .map_err(|e| e.context("Failed to update job"))?;
    tracing::info!("{} updated job {}", &user.user.email, job.id);
    Ok(Json(json!({
        "message": "Job updated successfully",
        "data": job,
    })))
}

pub async fn destroy(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let user = identity.require_user()?;
    let id = parse_id(&id, JOB_NOT_FOUND)?;
    state
        .jobs
        .delete(id)
        .await
        .map_err(|e| e.context("Failed to delete job"))?;
    tracing::info!("{} deleted job {}", &user.user.email, id);
    Ok(Json(json!({ "message": "Job deleted successfully" })))
}
