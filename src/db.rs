use std::time::Duration;

use anyhow::Context;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use tracing::info;

use crate::config::AppConfig;
use crate::migrator::Migrator;

/// Establishes a pooled database connection.
pub async fn establish_connection(database_url: &str) -> Result<DatabaseConnection, anyhow::Error> {
    let mut options = ConnectOptions::new(database_url.to_string());
    options
        .max_connections(10)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(30))
        .acquire_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(600))
        .sqlx_logging(false);

    Database::connect(options)
        .await
        .context("failed to connect to database")
}

pub async fn establish_connection_from_app_config(
    config: &AppConfig,
) -> Result<DatabaseConnection, anyhow::Error> {
    establish_connection(&config.database_url).await
}

/// Applies all pending migrations.
pub async fn run_migrations(db: &DatabaseConnection) -> Result<(), anyhow::Error> {
    info!("Running database migrations");
    Migrator::up(db, None)
        .await
        .context("failed to run migrations")?;
    info!("Migrations complete");
    Ok(())
}
