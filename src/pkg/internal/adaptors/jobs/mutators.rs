use sqlx::{PgConnection, Postgres, QueryBuilder};

use crate::pkg::internal::adaptors::jobs::spec::{JOB_COLUMNS, JobEntry, JobPatch, NewJob};
use crate::prelude::Result;

pub struct JobMutator<'a> {
    pool: &'a mut PgConnection,
}

impl<'a> JobMutator<'a> {
    pub fn new(pool: &'a mut PgConnection) -> Self {
        JobMutator { pool }
    }

    pub async fn create(&mut self, job: NewJob) -> Result<JobEntry> {
        let row = sqlx::query_as::<_, JobEntry>(&format!(
            r#"
            INSERT INTO jobs (title, category, company, level, skill, "type", salary, location, poster,
                job_description, requirements, responsibilities, benefits, experience)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING {}
            "#,
            JOB_COLUMNS
        ))
        .bind(job.title)
        .bind(job.category)
        .bind(job.company)
        .bind(job.level)
        .bind(job.skill)
        .bind(job.kind)
        .bind(job.salary)
        .bind(job.location)
        .bind(job.poster)
        .bind(job.job_description)
        .bind(job.requirements)
        .bind(job.responsibilities)
        .bind(job.benefits)
        .bind(job.experience)
        .fetch_one(&mut *self.pool)
        .await?;
        Ok(row)
    }

    pub async fn update(&mut self, id: i64, job: JobPatch) -> Result<Option<JobEntry>> {
        let mut query =
            QueryBuilder::<Postgres>::new("UPDATE jobs SET updated_at = CURRENT_TIMESTAMP");

        if let Some(title) = job.title {
            query.push(", title = ").push_bind(title);
        }
        if let Some(category) = job.category {
            query.push(", category = ").push_bind(category);
        }
        if let Some(company) = job.company {
            query.push(", company = ").push_bind(company);
        }
        if let Some(level) = job.level {
            query.push(", level = ").push_bind(level);
        }
        if let Some(skill) = job.skill {
            query.push(", skill = ").push_bind(skill);
        }
        if let Some(kind) = job.kind {
            query.push(r#", "type" = "#).push_bind(kind);
        }
        if let Some(salary) = job.salary {
            query.push(", salary = ").push_bind(salary);
        }
        if let Some(location) = job.location {
            query.push(", location = ").push_bind(location);
        }
        if let Some(poster) = job.poster {
            query.push(", poster = ").push_bind(poster);
        }
        if let Some(description) = job.job_description {
            query.push(", job_description = ").push_bind(description);
        }
        if let Some(requirements) = job.requirements {
            query.push(", requirements = ").push_bind(requirements);
        }
        if let Some(responsibilities) = job.responsibilities {
            query.push(", responsibilities = ").push_bind(responsibilities);
        }
        if let Some(benefits) = job.benefits {
            query.push(", benefits = ").push_bind(benefits);
        }
        if let Some(experience) = job.experience {
            query.push(", experience = ").push_bind(experience);
        }

        query.push(" WHERE id = ").push_bind(id);
        query.push(" RETURNING ").push(JOB_COLUMNS);

        let row = query
            .build_query_as::<JobEntry>()
            .fetch_optional(&mut *self.pool)
            .await?;
        Ok(row)
    }

    /// Deletes in one statement so the returned poster belongs to the row
    /// that was actually removed.
    pub async fn delete(&mut self, id: i64) -> Result<Option<JobEntry>> {
        let row = sqlx::query_as::<_, JobEntry>(&format!(
            "DELETE FROM jobs WHERE id = $1 RETURNING {}",
            JOB_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *self.pool)
        .await?;
        Ok(row)
    }
}
