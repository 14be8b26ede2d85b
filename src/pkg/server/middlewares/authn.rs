use axum::{
    Extension,
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::{
    pkg::{internal::auth::Identity, server::state::AppState},
    prelude::Result,
};

/// Attaches the caller's `Identity` to the request. Never rejects; routes
/// decide what they require.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let identity = Identity::resolve(state.users.as_ref(), request.headers()).await?;
    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

pub async fn require_admin(
    Extension(identity): Extension<Identity>,
    request: Request,
    next: Next,
) -> Result<Response> {
    let admin = identity.require_admin()?;
    tracing::debug!("admin {} on {}", &admin.user.email, request.uri().path());
    Ok(next.run(request).await)
}
