pub mod mutators;
pub mod selectors;
pub mod spec;

#[cfg(test)]
pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;

use crate::{pkg::server::state::GetTxn, prelude::Result};
use mutators::JobMutator;
use selectors::JobSelector;
use spec::{JobEntry, JobPatch, NewJob};

/// Persistence seam for the `jobs` table.
#[async_trait]
pub trait JobRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<JobEntry>>;

    /// Most recently created first.
    async fn list_latest(&self) -> Result<Vec<JobEntry>>;

    async fn get(&self, id: i64) -> Result<Option<JobEntry>>;

    async fn create(&self, job: NewJob) -> Result<JobEntry>;

    async fn update(&self, id: i64, patch: JobPatch) -> Result<Option<JobEntry>>;

    async fn delete(&self, id: i64) -> Result<Option<JobEntry>>;

    async fn count(&self) -> Result<i64>;

    async fn ping(&self) -> Result<()>;
}

pub struct PgJobRepository {
    pool: Arc<PgPool>,
}

impl PgJobRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        PgJobRepository { pool }
    }
}

#[async_trait]
impl JobRepository for PgJobRepository {
    async fn list(&self) -> Result<Vec<JobEntry>> {
        let mut conn = self.pool.acquire().await?;
        JobSelector::new(&mut conn).get_all().await
    }

    async fn list_latest(&self) -> Result<Vec<JobEntry>> {
        let mut conn = self.pool.acquire().await?;
        JobSelector::new(&mut conn).get_latest().await
    }

    async fn get(&self, id: i64) -> Result<Option<JobEntry>> {
        let mut conn = self.pool.acquire().await?;
        JobSelector::new(&mut conn).get_by_id(id).await
    }

    async fn create(&self, job: NewJob) -> Result<JobEntry> {
        let mut tx = self.pool.begin_txn().await?;
        let row = JobMutator::new(&mut tx).create(job).await?;
        tx.commit().await?;
        Ok(row)
    }

    async fn update(&self, id: i64, patch: JobPatch) -> Result<Option<JobEntry>> {
        let mut tx = self.pool.begin_txn().await?;
        let row = JobMutator::new(&mut tx).update(id, patch).await?;
        tx.commit().await?;
        Ok(row)
    }

    async fn delete(&self, id: i64) -> Result<Option<JobEntry>> {
        let mut tx = self.pool.begin_txn().await?;
        let row = JobMutator::new(&mut tx).delete(id).await?;
        tx.commit().await?;
        Ok(row)
    }

    async fn count(&self) -> Result<i64> {
        let mut conn = self.pool.acquire().await?;
        JobSelector::new(&mut conn).count().await
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("select 1").execute(&*self.pool).await?;
        Ok(())
    }
}
