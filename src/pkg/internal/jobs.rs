use std::sync::Arc;

use serde_json::{Map, Value};
use validator::Validate;

use crate::{
    pkg::internal::{
        adaptors::jobs::{
            JobRepository,
            spec::{JobEntry, JobPatch, NewJob},
        },
        posters::{PosterStore, PosterUpload},
    },
    prelude::{AppError, FieldErrors, Result},
};

pub const JOB_NOT_FOUND: &str = "Job not found";

/// Raw job fields as submitted. Every field is optional here; whether a
/// missing field is an error depends on the operation.
#[derive(Debug, Default, Validate)]
pub struct JobFields {
    #[validate(length(max = 255, message = "The title field must not be greater than 255 characters."))]
    pub title: Option<String>,
    #[validate(length(max = 255, message = "The category field must not be greater than 255 characters."))]
    pub category: Option<String>,
    #[validate(length(max = 255, message = "The company field must not be greater than 255 characters."))]
    pub company: Option<String>,
    #[validate(length(max = 255, message = "The level field must not be greater than 255 characters."))]
    pub level: Option<String>,
    #[validate(length(max = 255, message = "The skill field must not be greater than 255 characters."))]
    pub skill: Option<String>,
    #[validate(length(max = 255, message = "The type field must not be greater than 255 characters."))]
    pub kind: Option<String>,
    pub salary: Option<String>,
    #[validate(length(max = 255, message = "The location field must not be greater than 255 characters."))]
    pub location: Option<String>,
    pub job_description: Option<String>,
    pub requirements: Option<String>,
    pub responsibilities: Option<String>,
    pub benefits: Option<String>,
    pub experience: Option<String>,
    /// Keys that were present but unusable as sent (null, wrong type).
    rejected: FieldErrors,
}

/// Text of one submitted value. Strings are trimmed the way form input
/// usually is; salary may also arrive as a JSON number.
fn read_value(name: &str, value: Value) -> core::result::Result<String, String> {
    match value {
        Value::String(s) => Ok(s.trim().to_string()),
        Value::Null => Err(format!("The {} field is required.", name)),
        Value::Number(n) if name == "salary" => Ok(n.to_string()),
        _ if name == "salary" => Err("The salary field must be a number.".to_string()),
        _ => Err(format!("The {} field must be a string.", name)),
    }
}

fn parse_salary(raw: &str) -> Option<f64> {
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}

impl JobFields {
    /// Form keys this struct understands.
    pub const NAMES: [&'static str; 13] = [
        "title",
        "category",
        "company",
        "level",
        "skill",
        "type",
        "salary",
        "location",
        "job_description",
        "requirements",
        "responsibilities",
        "benefits",
        "experience",
    ];

    pub fn accepts(name: &str) -> bool {
        JobFields::NAMES.contains(&name)
    }

    /// Reads the known keys of a decoded body. Unknown keys are ignored;
    /// values of the wrong type are kept as per-field errors.
    pub fn from_map(raw: Map<String, Value>) -> Self {
        let mut fields = JobFields::default();
        for (name, value) in raw {
            if !JobFields::accepts(&name) {
                continue;
            }
            match read_value(&name, value) {
                Ok(text) => {
                    if let Some(slot) = fields.slot(&name) {
                        *slot = Some(text);
                    }
                }
                Err(message) => fields.rejected.add(&name, message),
            }
        }
        fields
    }

    fn slot(&mut self, name: &str) -> Option<&mut Option<String>> {
        Some(match name {
            "title" => &mut self.title,
            "category" => &mut self.category,
            "company" => &mut self.company,
            "level" => &mut self.level,
            "skill" => &mut self.skill,
            "type" => &mut self.kind,
            "salary" => &mut self.salary,
            "location" => &mut self.location,
            "job_description" => &mut self.job_description,
            "requirements" => &mut self.requirements,
            "responsibilities" => &mut self.responsibilities,
            "benefits" => &mut self.benefits,
            "experience" => &mut self.experience,
            _ => return None,
        })
    }

    fn texts(&self) -> [(&'static str, Option<&str>); 12] {
        [
            ("title", self.title.as_deref()),
            ("category", self.category.as_deref()),
            ("company", self.company.as_deref()),
            ("level", self.level.as_deref()),
            ("skill", self.skill.as_deref()),
            ("type", self.kind.as_deref()),
            ("location", self.location.as_deref()),
            ("job_description", self.job_description.as_deref()),
            ("requirements", self.requirements.as_deref()),
            ("responsibilities", self.responsibilities.as_deref()),
            ("benefits", self.benefits.as_deref()),
            ("experience", self.experience.as_deref()),
        ]
    }

    /// Every violation across all fields. With `required`, absent fields fail too.
    pub fn errors(&self, required: bool) -> FieldErrors {
        let mut errors: FieldErrors = match self.validate() {
            Ok(()) => FieldErrors::new(),
            Err(e) => e.into(),
        };
        errors.merge(self.rejected.clone());
        for (name, value) in self.texts() {
            match value {
                None if required && errors.get(name).is_none() => {
                    errors.add(name, format!("The {} field is required.", name))
                }
                Some("") => errors.add(name, format!("The {} field is required.", name)),
                _ => {}
            }
        }
        match self.salary.as_deref() {
            None if required && errors.get("salary").is_none() => {
                errors.add("salary", "The salary field is required.")
            }
            Some("") => errors.add("salary", "The salary field is required."),
            Some(raw) if parse_salary(raw).is_none() => {
                errors.add("salary", "The salary field must be a number.")
            }
            _ => {}
        }
        errors
    }

    pub fn into_new_job(self) -> core::result::Result<NewJob, FieldErrors> {
        let errors = self.errors(true);
        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(NewJob {
            title: self.title.unwrap_or_default(),
            category: self.category.unwrap_or_default(),
            company: self.company.unwrap_or_default(),
            level: self.level.unwrap_or_default(),
            skill: self.skill.unwrap_or_default(),
            kind: self.kind.unwrap_or_default(),
            salary: self.salary.as_deref().and_then(parse_salary).unwrap_or_default(),
            location: self.location.unwrap_or_default(),
            poster: None,
            job_description: self.job_description.unwrap_or_default(),
            requirements: self.requirements.unwrap_or_default(),
            responsibilities: self.responsibilities.unwrap_or_default(),
            benefits: self.benefits.unwrap_or_default(),
            experience: self.experience.unwrap_or_default(),
        })
    }

    pub fn into_patch(self) -> core::result::Result<JobPatch, FieldErrors> {
        let errors = self.errors(false);
        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(JobPatch {
            salary: self.salary.as_deref().and_then(parse_salary),
            title: self.title,
            category: self.category,
            company: self.company,
            level: self.level,
            skill: self.skill,
            kind: self.kind,
            location: self.location,
            poster: None,
            job_description: self.job_description,
            requirements: self.requirements,
            responsibilities: self.responsibilities,
            benefits: self.benefits,
            experience: self.experience,
        })
    }
}

/// Folds field and poster problems into one validation error.
fn reject<T>(
    fields: core::result::Result<T, FieldErrors>,
    poster: Option<String>,
) -> Result<T> {
    match (fields, poster) {
        (Ok(value), None) => Ok(value),
        (fields, poster) => {
            let mut errors = fields.err().unwrap_or_default();
            if let Some(message) = poster {
                errors.add("poster", message);
            }
            Err(AppError::Validation(errors))
        }
    }
}

/// Job records plus the poster files they point at.
#[derive(Clone)]
pub struct JobStore {
    repo: Arc<dyn JobRepository>,
    posters: Arc<PosterStore>,
}

impl JobStore {
    pub fn new(repo: Arc<dyn JobRepository>, posters: Arc<PosterStore>) -> Self {
        JobStore { repo, posters }
    }

    pub fn posters(&self) -> &PosterStore {
        &self.posters
    }

    pub async fn list(&self) -> Result<Vec<JobEntry>> {
        self.repo.list().await
    }

    pub async fn list_latest(&self) -> Result<Vec<JobEntry>> {
        self.repo.list_latest().await
    }

    pub async fn count(&self) -> Result<i64> {
        self.repo.count().await
    }

    pub async fn ping(&self) -> Result<()> {
        self.repo.ping().await
    }

    pub async fn get(&self, id: i64) -> Result<JobEntry> {
        self.repo
            .get(id)
            .await?
            .ok_or(AppError::NotFound(JOB_NOT_FOUND))
    }

    fn poster_problem(&self, poster: Option<&PosterUpload>) -> Option<String> {
        poster.and_then(|upload| self.posters.validate(upload).err().map(|e| e.to_string()))
    }

    pub async fn create(&self, fields: JobFields, poster: Option<PosterUpload>) -> Result<JobEntry> {
        let problem = self.poster_problem(poster.as_ref());
        let mut job = reject(fields.into_new_job(), problem)?;

        let stored = match &poster {
            Some(upload) => Some(self.posters.store(upload).await?),
            None => None,
        };
        job.poster = stored.as_ref().map(|s| s.reference.clone());

        match self.repo.create(job).await {
            Ok(entry) => {
                tracing::info!("created job {} ({})", entry.id, &entry.title);
                Ok(entry)
            }
            Err(e) => {
                if let Some(stored) = stored {
                    self.posters.remove(Some(&stored.reference)).await.log();
                }
                Err(e)
            }
        }
    }

    pub async fn update(
        &self,
        id: i64,
        fields: JobFields,
        poster: Option<PosterUpload>,
    ) -> Result<JobEntry> {
        let current = self.get(id).await?;
        let problem = self.poster_problem(poster.as_ref());
        let mut patch = reject(fields.into_patch(), problem)?;

        let Some(upload) = poster else {
            if patch.is_empty() {
                return Ok(current);
            }
            let job = self
                .repo
                .update(id, patch)
                .await?
                .ok_or(AppError::NotFound(JOB_NOT_FOUND))?;
            tracing::info!("updated job {}", id);
            return Ok(job);
        };

        let stored = self.posters.store(&upload).await?;
        patch.poster = Some(stored.reference.clone());
        match self.repo.update(id, patch).await {
            Ok(Some(job)) => {
                self.posters.remove(current.poster.as_deref()).await.log();
                tracing::info!("updated job {} with new poster {}", id, &stored.key);
                Ok(job)
            }
            outcome => {
                self.posters.remove(Some(&stored.reference)).await.log();
                outcome?.ok_or(AppError::NotFound(JOB_NOT_FOUND))
            }
        }
    }

    pub async fn delete(&self, id: i64) -> Result<JobEntry> {
        let job = self
            .repo
            .delete(id)
            .await?
            .ok_or(AppError::NotFound(JOB_NOT_FOUND))?;
        self.posters.remove(job.poster.as_deref()).await.log();
        tracing::info!("deleted job {}", id);
        Ok(job)
    }
}
