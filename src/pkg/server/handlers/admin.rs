use axum::{
    Extension, Json,
    extract::{Path, State},
};
use serde_json::{Value, json};

use crate::{
    pkg::{
        internal::{auth::Identity, jobs::JOB_NOT_FOUND},
        server::{handlers::parse_id, state::AppState},
    },
    prelude::Result,
};

pub async fn check(Extension(identity): Extension<Identity>) -> Result<Json<Value>> {
    let admin = identity.require_admin()?;
    Ok(Json(json!({
        "message": "Admin access granted",
        "user": admin.user,
    })))
}

pub async fn dashboard(State(state): State<AppState>) -> Result<Json<Value>> {
    let total_jobs = state.jobs.count().await?;
    let total_users = state.users.count().await?;
    Ok(Json(json!({
        "message": "Welcome to Admin Dashboard",
        "data": {
            "total_jobs": total_jobs,
            "total_users": total_users,
        },
    })))
}

pub async fn users(State(state): State<AppState>) -> Result<Json<Value>> {
    let users = state
        .users
        .list_latest()
        .await
        .map_err(|e| e.context("Failed to fetch users"))?;
    Ok(Json(json!({
        "message": "Users retrieved successfully",
        "count": users.len(),
        "data": users,
    })))
}

pub async fn jobs(State(state): State<AppState>) -> Result<Json<Value>> {
    let jobs = state
        .jobs
        .list_latest()
        .await
        .map_err(|e| e.context("Failed to fetch jobs"))?;
    Ok(Json(json!({
        "message": "Admin jobs retrieved successfully",
        "count": jobs.len(),
        "data": jobs,
    })))
}

pub async fn delete_job(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let admin = identity.require_admin()?;
    let id = parse_id(&id, JOB_NOT_FOUND)?;
    state
        .jobs
        .delete(id)
        .await
        .map_err(|e| e.context("Failed to delete job"))?;
    tracing::info!("admin {} deleted job {}", &admin.user.email, id);
    Ok(Json(json!({ "message": "Job deleted by admin successfully" })))
}
