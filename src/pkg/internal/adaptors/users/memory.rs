use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use uuid::Uuid;

use super::{
    UserRepository,
    spec::{AuthToken, NewUser, Role, TokenStatus, UserCredentials, UserEntry},
};
use crate::prelude::{AppError, FieldErrors, Result};

#[derive(Default)]
pub struct MemoryUserRepository {
    users: Mutex<Vec<UserCredentials>>,
    tokens: Mutex<Vec<AuthToken>>,
}

impl MemoryUserRepository {
    pub fn token_count(&self) -> usize {
        self.tokens.lock().unwrap().len()
    }

    /// Seeds a user with the given role and returns an active bearer token for it.
    pub async fn seed(&self, email: &str, role: Role) -> Uuid {
        let user = self
            .create(NewUser {
                name: email.split('@').next().unwrap_or("user").to_string(),
                email: email.to_string(),
                password_hash: String::new(),
            })
            .await
            .unwrap();
        self.set_role(email, role).await.unwrap();
        self.issue_token(user.id, Duration::hours(1))
            .await
            .unwrap()
            .token
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn create(&self, user: NewUser) -> Result<UserEntry> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.user.email == user.email) {
            return Err(AppError::Validation(FieldErrors::single(
                "email",
                "The email has already been taken.",
            )));
        }
        let entry = UserEntry {
            id: users.len() as i64 + 1,
            name: user.name,
            email: user.email,
            role: Role::User,
            created_at: Utc::now(),
        };
        users.push(UserCredentials {
            user: entry.clone(),
            password_hash: user.password_hash,
        });
        Ok(entry)
    }

    async fn find_credentials(&self, email: &str) -> Result<Option<UserCredentials>> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.user.email == email).cloned())
    }

    async fn list_latest(&self) -> Result<Vec<UserEntry>> {
        let mut users: Vec<UserEntry> = self
            .users
            .lock()
            .unwrap()
            .iter()
            .map(|u| u.user.clone())
            .collect();
        users.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(users)
    }

    async fn count(&self) -> Result<i64> {
        Ok(self.users.lock().unwrap().len() as i64)
    }

    async fn set_role(&self, email: &str, role: Role) -> Result<Option<UserEntry>> {
        let mut users = self.users.lock().unwrap();
        Ok(users
            .iter_mut()
            .find(|u| u.user.email == email)
            .map(|u| {
                u.user.role = role;
                u.user.clone()
            }))
    }

    async fn issue_token(&self, user_id: i64, ttl: Duration) -> Result<AuthToken> {
        let token = AuthToken {
            token: Uuid::new_v4(),
            user_id,
            expiry: Utc::now() + ttl,
            status: TokenStatus::Active,
        };
        let mut tokens = self.tokens.lock().unwrap();
        let now = Utc::now();
        tokens.retain(|t| {
            t.user_id != user_id || (t.status == TokenStatus::Active && t.expiry > now)
        });
        tokens.push(token.clone());
        Ok(token)
    }

    async fn resolve_token(&self, token: Uuid) -> Result<Option<UserEntry>> {
        let owner = self
            .tokens
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.token == token && t.status == TokenStatus::Active && t.expiry > Utc::now())
            .map(|t| t.user_id);
        let users = self.users.lock().unwrap();
        Ok(owner.and_then(|id| users.iter().find(|u| u.user.id == id).map(|u| u.user.clone())))
    }

    async fn revoke_token(&self, token: Uuid) -> Result<()> {
        for t in self.tokens.lock().unwrap().iter_mut() {
            if t.token == token {
                t.status = TokenStatus::Revoked;
            }
        }
        Ok(())
    }
}
