use std::sync::Arc;

use chrono::Duration;
use sqlx::{PgPool, Pool, Postgres, Transaction, postgres::PgPoolOptions};

use crate::{
    conf::settings,
    pkg::internal::{
        adaptors::{
            jobs::{JobRepository, PgJobRepository},
            users::{PgUserRepository, UserRepository},
        },
        jobs::JobStore,
        posters::PosterStore,
    },
    prelude::Result,
};

pub fn db_pool() -> Result<Pool<Postgres>> {
    let pool = PgPoolOptions::new()
        .max_connections(settings.database_pool_max_connections)
        .connect_lazy(&settings.database_url)?;
    Ok(pool)
}

pub trait GetTxn {
    fn begin_txn(&self) -> impl Future<Output = Result<Transaction<'static, Postgres>>> + Send;
}

impl GetTxn for PgPool {
    fn begin_txn(&self) -> impl Future<Output = Result<Transaction<'static, Postgres>>> + Send {
        async move { Ok(self.begin().await?) }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub jobs: JobStore,
    pub users: Arc<dyn UserRepository>,
    pub token_ttl: Duration,
}

impl AppState {
    pub async fn new() -> Result<AppState> {
        let pool = Arc::new(db_pool()?);
        let posters = PosterStore::new(
            &settings.upload_dir,
            settings.poster_url_base(),
            settings.poster_max_bytes,
        );
        posters.ensure_dir().await?;
        Ok(AppState::from_parts(
            Arc::new(PgJobRepository::new(pool.clone())),
            Arc::new(PgUserRepository::new(pool)),
            Arc::new(posters),
            Duration::hours(settings.token_ttl_hours),
        ))
    }

    pub fn from_parts(
        jobs: Arc<dyn JobRepository>,
        users: Arc<dyn UserRepository>,
        posters: Arc<PosterStore>,
        token_ttl: Duration,
    ) -> AppState {
        AppState {
            jobs: JobStore::new(jobs, posters),
            users,
            token_ttl,
        }
    }
}
