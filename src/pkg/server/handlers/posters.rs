use axum::{
    extract::{Path, State},
    http::header::CONTENT_TYPE,
    response::{IntoResponse, Response},
};

use crate::{
    pkg::server::state::AppState,
    prelude::{AppError, Result},
};

pub async fn show(State(state): State<AppState>, Path(key): Path<String>) -> Result<Response> {
    let Some((kind, bytes)) = state.jobs.posters().open(&key).await? else {
        return Err(AppError::NotFound("Poster not found"));
    };
    Ok(([(CONTENT_TYPE, kind.mime())], bytes).into_response())
}
