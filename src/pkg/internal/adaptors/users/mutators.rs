use chrono::{Duration, Utc};
use sqlx::PgConnection;
use uuid::Uuid;

use crate::pkg::internal::adaptors::users::spec::{
    AuthToken, NewUser, Role, TokenStatus, USER_COLUMNS, UserEntry,
};
use crate::prelude::{AppError, FieldErrors, Result};

pub struct UserMutator<'a> {
    pool: &'a mut PgConnection,
}

impl<'a> UserMutator<'a> {
    pub fn new(pool: &'a mut PgConnection) -> Self {
        UserMutator { pool }
    }

    pub async fn create(&mut self, user: NewUser) -> Result<UserEntry> {
        let row = sqlx::query_as::<_, UserEntry>(&format!(
            r#"
            INSERT INTO users (name, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&mut *self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => AppError::Validation(
                FieldErrors::single("email", "The email has already been taken."),
            ),
            e => e.into(),
        })?;
        Ok(row)
    }

    pub async fn set_role(&mut self, email: &str, role: Role) -> Result<Option<UserEntry>> {
        let row = sqlx::query_as::<_, UserEntry>(&format!(
            r#"
            UPDATE users SET role = $2, updated_at = CURRENT_TIMESTAMP
            WHERE email = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(email)
        .bind(role)
        .fetch_optional(&mut *self.pool)
        .await?;
        Ok(row)
    }

    pub async fn issue_token(&mut self, user_id: i64, ttl: Duration) -> Result<AuthToken> {
        let token = sqlx::query_as::<_, AuthToken>(
            r#"
            INSERT INTO tokens (token, user_id, expiry, status)
            VALUES ($1, $2, $3, $4)
            RETURNING token, user_id, expiry, status
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(Utc::now() + ttl)
        .bind(TokenStatus::Active)
        .fetch_one(&mut *self.pool)
        .await?;
        Ok(token)
    }

    /// Drops the user's tokens that can no longer authenticate.
    pub async fn purge_tokens(&mut self, user_id: i64) -> Result<u64> {
        let purged = sqlx::query(
            "DELETE FROM tokens WHERE user_id = $1 AND (status = $2 OR expiry <= now())",
        )
        .bind(user_id)
        .bind(TokenStatus::Revoked)
        .execute(&mut *self.pool)
        .await?
        .rows_affected();
        Ok(purged)
    }

    pub async fn revoke_token(&mut self, token: Uuid) -> Result<()> {
        sqlx::query("UPDATE tokens SET status = $2 WHERE token = $1 AND status = $3")
            .bind(token)
            .bind(TokenStatus::Revoked)
            .bind(TokenStatus::Active)
            .execute(&mut *self.pool)
            .await?;
        Ok(())
    }
}
