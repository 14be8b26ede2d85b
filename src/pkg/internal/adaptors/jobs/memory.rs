use std::sync::{
    Mutex,
    atomic::{AtomicBool, AtomicI64, Ordering},
};

use async_trait::async_trait;
use chrono::Utc;

use super::{
    JobRepository,
    spec::{JobEntry, JobPatch, NewJob},
};
use crate::prelude::{AppError, Result};

/// In-process stand-in for the Postgres repository.
#[derive(Default)]
pub struct MemoryJobRepository {
    rows: Mutex<Vec<JobEntry>>,
    next_id: AtomicI64,
    fail_writes: AtomicBool,
}

impl MemoryJobRepository {
    /// Makes every subsequent create/update/delete fail like a dropped connection.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::Database(sqlx::Error::PoolClosed));
        }
        Ok(())
    }
}

#[async_trait]
impl JobRepository for MemoryJobRepository {
    async fn list(&self) -> Result<Vec<JobEntry>> {
        Ok(self.rows.lock().unwrap().clone())
    }

    async fn list_latest(&self) -> Result<Vec<JobEntry>> {
        let mut rows = self.rows.lock().unwrap().clone();
        rows.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(rows)
    }

    async fn get(&self, id: i64) -> Result<Option<JobEntry>> {
        Ok(self.rows.lock().unwrap().iter().find(|j| j.id == id).cloned())
    }

    async fn create(&self, job: NewJob) -> Result<JobEntry> {
        self.check_writable()?;
        let now = Utc::now();
        let entry = JobEntry {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            title: job.title,
            category: job.category,
            company: job.company,
            level: job.level,
            skill: job.skill,
            kind: job.kind,
            salary: job.salary,
            location: job.location,
            poster: job.poster,
            job_description: job.job_description,
            requirements: job.requirements,
            responsibilities: job.responsibilities,
            benefits: job.benefits,
            experience: job.experience,
            created_at: now,
            updated_at: now,
        };
        self.rows.lock().unwrap().push(entry.clone());
        Ok(entry)
    }

    async fn update(&self, id: i64, patch: JobPatch) -> Result<Option<JobEntry>> {
        self.check_writable()?;
        let mut rows = self.rows.lock().unwrap();
        Ok(rows.iter_mut().find(|j| j.id == id).map(|job| {
            patch.apply(job);
            job.updated_at = Utc::now();
            job.clone()
        }))
    }

    async fn delete(&self, id: i64) -> Result<Option<JobEntry>> {
        self.check_writable()?;
        let mut rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .position(|j| j.id == id)
            .map(|index| rows.remove(index)))
    }

    async fn count(&self) -> Result<i64> {
        Ok(self.rows.lock().unwrap().len() as i64)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
