use sqlx::PgConnection;

use crate::pkg::internal::adaptors::jobs::spec::{JOB_COLUMNS, JobEntry};
use crate::prelude::Result;

pub struct JobSelector<'a> {
    pool: &'a mut PgConnection,
}

impl<'a> JobSelector<'a> {
    pub fn new(pool: &'a mut PgConnection) -> Self {
        JobSelector { pool }
    }

    pub async fn get_by_id(&mut self, id: i64) -> Result<Option<JobEntry>> {
        let row = sqlx::query_as::<_, JobEntry>(&format!(
            "SELECT {} FROM jobs WHERE id = $1",
            JOB_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *self.pool)
        .await?;
        Ok(row)
    }

    pub async fn get_all(&mut self) -> Result<Vec<JobEntry>> {
        let rows = sqlx::query_as::<_, JobEntry>(&format!("SELECT {} FROM jobs", JOB_COLUMNS))
            .fetch_all(&mut *self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn get_latest(&mut self) -> Result<Vec<JobEntry>> {
        let rows = sqlx::query_as::<_, JobEntry>(&format!(
            "SELECT {} FROM jobs ORDER BY created_at DESC, id DESC",
            JOB_COLUMNS
        ))
        .fetch_all(&mut *self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn count(&mut self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM jobs")
            .fetch_one(&mut *self.pool)
            .await?;
        Ok(count)
    }
}
