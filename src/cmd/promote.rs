use std::sync::Arc;

use crate::{
    conf::settings,
    pkg::internal::adaptors::users::{PgUserRepository, UserRepository, spec::Role},
    prelude::{AppError, Result},
};
use sqlx::postgres::PgPoolOptions;

pub async fn apply(email: &str) -> Result<()> {
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&settings.database_url)
        .await?;
    let users = PgUserRepository::new(Arc::new(pool));
    match users.set_role(email, Role::Admin).await? {
        Some(user) => {
            tracing::info!("{} <{}> is now an admin", &user.name, &user.email);
            Ok(())
        }
        None => Err(AppError::NotFound("User not found")),
    }
}
