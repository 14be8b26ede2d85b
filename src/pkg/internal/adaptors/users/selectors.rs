use sqlx::PgConnection;
use uuid::Uuid;

use crate::pkg::internal::adaptors::users::spec::{
    TokenStatus, USER_COLUMNS, UserCredentials, UserEntry,
};
use crate::prelude::Result;

pub struct UserSelector<'a> {
    pool: &'a mut PgConnection,
}

impl<'a> UserSelector<'a> {
    pub fn new(pool: &'a mut PgConnection) -> Self {
        UserSelector { pool }
    }

    pub async fn get_credentials(&mut self, email: &str) -> Result<Option<UserCredentials>> {
        let row = sqlx::query_as::<_, UserCredentials>(&format!(
            "SELECT {}, password_hash FROM users WHERE email = $1",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&mut *self.pool)
        .await?;
        Ok(row)
    }

    pub async fn get_latest(&mut self) -> Result<Vec<UserEntry>> {
        let rows = sqlx::query_as::<_, UserEntry>(&format!(
            "SELECT {} FROM users ORDER BY created_at DESC, id DESC",
            USER_COLUMNS
        ))
        .fetch_all(&mut *self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn count(&mut self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&mut *self.pool)
            .await?;
        Ok(count)
    }

    /// Owner of an active, unexpired token.
    pub async fn get_by_token(&mut self, token: Uuid) -> Result<Option<UserEntry>> {
        let row = sqlx::query_as::<_, UserEntry>(
            r#"
            SELECT u.id, u.name, u.email, u.role, u.created_at
            FROM tokens t
            JOIN users u ON u.id = t.user_id
            WHERE t.token = $1
            AND t.status = $2
            AND t.expiry > now()
            "#,
        )
        .bind(token)
        .bind(TokenStatus::Active)
        .fetch_optional(&mut *self.pool)
        .await?;
        Ok(row)
    }
}
