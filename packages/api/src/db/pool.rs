//! Database connection pool and migrations.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::settings;

/// Open a connection pool for the configured database URL.
pub async fn connect(config: &settings::Database) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.url)
        .await
}

/// Apply the embedded migrations from `packages/api/migrations`.
pub async fn migrate(pool: &PgPool) -> Result<(), super::DbError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}
