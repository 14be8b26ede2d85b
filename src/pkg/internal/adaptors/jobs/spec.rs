use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const JOB_COLUMNS: &str = r#"id, title, category, company, level, skill, "type", salary, location, poster,
    job_description, requirements, responsibilities, benefits, experience, created_at, updated_at"#;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct JobEntry {
    pub id: i64,
    pub title: String,
    pub category: String,
    pub company: String,
    pub level: String,
    pub skill: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub kind: String,
    pub salary: f64,
    pub location: String,
    pub poster: Option<String>,
    pub job_description: String,
    pub requirements: String,
    pub responsibilities: String,
    pub benefits: String,
    pub experience: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A fully validated job ready to insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewJob {
    pub title: String,
    pub category: String,
    pub company: String,
    pub level: String,
    pub skill: String,
    pub kind: String,
    pub salary: f64,
    pub location: String,
    pub poster: Option<String>,
    pub job_description: String,
    pub requirements: String,
    pub responsibilities: String,
    pub benefits: String,
    pub experience: String,
}

/// Validated partial update, `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobPatch {
    pub title: Option<String>,
    pub category: Option<String>,
    pub company: Option<String>,
    pub level: Option<String>,
    pub skill: Option<String>,
    pub kind: Option<String>,
    pub salary: Option<f64>,
    pub location: Option<String>,
    pub poster: Option<String>,
    pub job_description: Option<String>,
    pub requirements: Option<String>,
    pub responsibilities: Option<String>,
    pub benefits: Option<String>,
    pub experience: Option<String>,
}

impl JobPatch {
    pub fn is_empty(&self) -> bool {
        *self == JobPatch::default()
    }

    pub fn apply(self, job: &mut JobEntry) {
        fn set<T>(slot: &mut T, value: Option<T>) {
            if let Some(value) = value {
                *slot = value;
            }
        }
        set(&mut job.title, self.title);
        set(&mut job.category, self.category);
        set(&mut job.company, self.company);
        set(&mut job.level, self.level);
        set(&mut job.skill, self.skill);
        set(&mut job.kind, self.kind);
        set(&mut job.salary, self.salary);
        set(&mut job.location, self.location);
        if self.poster.is_some() {
            job.poster = self.poster;
        }
        set(&mut job.job_description, self.job_description);
        set(&mut job.requirements, self.requirements);
        set(&mut job.responsibilities, self.responsibilities);
        set(&mut job.benefits, self.benefits);
        set(&mut job.experience, self.experience);
    }
}
