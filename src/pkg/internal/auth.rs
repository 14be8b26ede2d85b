use std::sync::Arc;

use axum::http::{HeaderMap, header::AUTHORIZATION};
use uuid::Uuid;

use crate::{
    pkg::internal::adaptors::users::{
        UserRepository,
        spec::{Role, UserEntry},
    },
    prelude::{AppError, Result},
};

/// A signed-in user together with the token that proved it.
#[derive(Debug, Clone)]
pub struct Principal {
    pub user: UserEntry,
    pub token: Uuid,
}

/// Who is making the request. Resolved once per request by the authn
/// middleware and handed to handlers explicitly.
#[derive(Debug, Clone)]
pub enum Identity {
    Anonymous,
    User(Arc<Principal>),
    Admin(Arc<Principal>),
}

impl Identity {
    pub fn signed_in(user: UserEntry, token: Uuid) -> Self {
        let principal = Arc::new(Principal { user, token });
        match principal.user.role {
            Role::Admin => Identity::Admin(principal),
            Role::User => Identity::User(principal),
        }
    }

    pub fn require_user(&self) -> Result<&Principal> {
        match self {
            Identity::Anonymous => Err(AppError::Unauthenticated),
            Identity::User(p) | Identity::Admin(p) => Ok(p),
        }
    }

    pub fn require_admin(&self) -> Result<&Principal> {
        match self {
            Identity::Anonymous => Err(AppError::Unauthenticated),
            Identity::User(_) => Err(AppError::Forbidden),
            Identity::Admin(p) => Ok(p),
        }
    }

    /// Resolves the bearer token in `headers`, if any. Anything that does not
    /// name a live token is anonymous.
    pub async fn resolve(users: &dyn UserRepository, headers: &HeaderMap) -> Result<Identity> {
        let Some(token) = bearer_token(headers) else {
            return Ok(Identity::Anonymous);
        };
        match users.resolve_token(token).await? {
            Some(user) => Ok(Identity::signed_in(user, token)),
            None => {
                tracing::warn!("token {} rejected, continuing anonymously", token);
                Ok(Identity::Anonymous)
            }
        }
    }
}

pub fn bearer_token(headers: &HeaderMap) -> Option<Uuid> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    token.trim().parse::<Uuid>().ok()
}

pub async fn hash_password(password: String) -> Result<String> {
    let hashed =
        tokio::task::spawn_blocking(move || bcrypt::hash(password, bcrypt::DEFAULT_COST)).await??;
    Ok(hashed)
}

pub async fn verify_password(password: String, hash: String) -> Result<bool> {
    if hash.is_empty() {
        return Ok(false);
    }
    let valid = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash)).await??;
    Ok(valid)
}
