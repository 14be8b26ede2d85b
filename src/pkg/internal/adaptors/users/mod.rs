pub mod mutators;
pub mod selectors;
pub mod spec;

#[cfg(test)]
pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{pkg::server::state::GetTxn, prelude::Result};
use mutators::UserMutator;
use selectors::UserSelector;
use spec::{AuthToken, NewUser, Role, UserCredentials, UserEntry};

/// Persistence seam for `users` and their bearer `tokens`.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: NewUser) -> Result<UserEntry>;

    async fn find_credentials(&self, email: &str) -> Result<Option<UserCredentials>>;

    /// Most recently registered first.
    async fn list_latest(&self) -> Result<Vec<UserEntry>>;

    async fn count(&self) -> Result<i64>;

    async fn set_role(&self, email: &str, role: Role) -> Result<Option<UserEntry>>;

    /// Issues a fresh token, dropping the user's revoked and expired ones.
    async fn issue_token(&self, user_id: i64, ttl: Duration) -> Result<AuthToken>;

    /// Owner of `token` while it is active and unexpired.
    async fn resolve_token(&self, token: Uuid) -> Result<Option<UserEntry>>;

    async fn revoke_token(&self, token: Uuid) -> Result<()>;
}

pub struct PgUserRepository {
    pool: Arc<PgPool>,
}

impl PgUserRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        PgUserRepository { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, user: NewUser) -> Result<UserEntry> {
        let mut tx = self.pool.begin_txn().await?;
        let row = UserMutator::new(&mut tx).create(user).await?;
        tx.commit().await?;
        Ok(row)
    }

    async fn find_credentials(&self, email: &str) -> Result<Option<UserCredentials>> {
        let mut conn = self.pool.acquire().await?;
        UserSelector::new(&mut conn).get_credentials(email).await
    }

    async fn list_latest(&self) -> Result<Vec<UserEntry>> {
        let mut conn = self.pool.acquire().await?;
        UserSelector::new(&mut conn).get_latest().await
    }

    async fn count(&self) -> Result<i64> {
        let mut conn = self.pool.acquire().await?;
        UserSelector::new(&mut conn).count().await
    }

    async fn set_role(&self, email: &str, role: Role) -> Result<Option<UserEntry>> {
        let mut tx = self.pool.begin_txn().await?;
        let row = UserMutator::new(&mut tx).set_role(email, role).await?;
        tx.commit().await?;
        Ok(row)
    }

    async fn issue_token(&self, user_id: i64, ttl: Duration) -> Result<AuthToken> {
        let mut tx = self.pool.begin_txn().await?;
        let mut mutator = UserMutator::new(&mut tx);
        let purged = mutator.purge_tokens(user_id).await?;
        if purged > 0 {
            tracing::debug!("purged {} stale tokens of user {}", purged, user_id);
        }
        let token = mutator.issue_token(user_id, ttl).await?;
        tx.commit().await?;
        Ok(token)
    }

    async fn resolve_token(&self, token: Uuid) -> Result<Option<UserEntry>> {
        let mut conn = self.pool.acquire().await?;
        UserSelector::new(&mut conn).get_by_token(token).await
    }

    async fn revoke_token(&self, token: Uuid) -> Result<()> {
        let mut tx = self.pool.begin_txn().await?;
        UserMutator::new(&mut tx).revoke_token(token).await?;
        tx.commit().await?;
        Ok(())
    }
}
