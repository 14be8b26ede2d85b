use axum::{Extension, Json, extract::State, http::StatusCode};
use axum_extra::extract::WithRejection;
use serde::Deserialize;
use serde_json::{Value, json};
use validator::Validate;

use crate::{
    pkg::{
        internal::{
            adaptors::users::spec::NewUser,
            auth::{Identity, hash_password, verify_password},
        },
        server::state::AppState,
    },
    prelude::{AppError, FieldErrors, Result},
};

#[derive(Deserialize, Validate)]
pub struct RegisterInput {
    #[validate(
        required(message = "The name field is required."),
        length(min = 1, max = 255, message = "The name field must be between 1 and 255 characters.")
    )]
    pub name: Option<String>,
    #[validate(
        required(message = "The email field is required."),
        email(message = "The email field must be a valid email address."),
        length(max = 255, message = "The email field must not be greater than 255 characters.")
    )]
    pub email: Option<String>,
    #[validate(
        required(message = "The password field is required."),
        length(min = 8, message = "The password field must be at least 8 characters.")
    )]
    pub password: Option<String>,
}

#[derive(Deserialize, Validate)]
pub struct LoginInput {
    #[validate(required(message = "The email field is required."))]
    pub email: Option<String>,
    #[validate(required(message = "The password field is required."))]
    pub password: Option<String>,
}

pub async fn register(
    State(state): State<AppState>,
    WithRejection(Json(input), _): WithRejection<Json<RegisterInput>, AppError>,
) -> Result<(StatusCode, Json<Value>)> {
    input.validate().map_err(FieldErrors::from)?;
    let password_hash = hash_password(input.password.unwrap_or_default()).await?;
    let user = state
        .users
        .create(NewUser {
            name: input.name.unwrap_or_default().trim().to_string(),
            email: input.email.unwrap_or_default().trim().to_lowercase(),
            password_hash,
        })
        .await
        .map_err(|e| e.context("Failed to register user"))?;
    let token = state.users.issue_token(user.id, state.token_ttl).await?;
    tracing::info!("registered user {}", &user.email);
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User registered successfully",
            "user": user,
            "token": token.token,
        })),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    WithRejection(Json(input), _): WithRejection<Json<LoginInput>, AppError>,
) -> Result<Json<Value>> {
    input.validate().map_err(FieldErrors::from)?;
    let email = input.email.unwrap_or_default().trim().to_lowercase();
    let Some(credentials) = state.users.find_credentials(&email).await? else {
        tracing::warn!("login attempt for unknown email {}", &email);
        return Err(AppError::InvalidCredentials);
    };
    if !verify_password(input.password.unwrap_or_default(), credentials.password_hash).await? {
        tracing::warn!("wrong password for {}", &email);
        return Err(AppError::InvalidCredentials);
    }
    let user = credentials.user;
    let token = state.users.issue_token(user.id, state.token_ttl).await?;
    tracing::info!("user {} logged in", &user.email);
    Ok(Json(json!({
        "message": "Login successful",
        "user": user,
        "token": token.token,
    })))
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Value>> {
    let principal = identity.require_user()?;
    state.users.revoke_token(principal.token).await?;
    tracing::info!("user {} logged out", &principal.user.email);
    Ok(Json(json!({ "message": "Logged out successfully" })))
}

pub async fn me(Extension(identity): Extension<Identity>) -> Result<Json<Value>> {
    let principal = identity.require_user()?;
    Ok(Json(json!(principal.user)))
}
