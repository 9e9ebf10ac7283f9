//! Database layer for grievance-rs.
//!
//! The durable store behind the engine: entities, schema migrations and the
//! repositories every service goes through. Operations that must be atomic
//! (transitions with their timeline entry, feedback with its closing
//! transition, reminder bookkeeping) run inside a single transaction here.

pub mod entities;
pub mod migrations;
pub mod repositories;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

use grievance_common::{AppError, Config};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, SqlErr};
use std::time::Duration;
use tracing::log::LevelFilter;

/// Open the connection pool described by `[database]`.
pub async fn init(config: &Config) -> Result<DatabaseConnection, AppError> {
    let db = &config.database;
    let mut opt = ConnectOptions::new(&db.url);
    opt.max_connections(db.max_connections)
        .min_connections(db.min_connections.min(db.max_connections))
        .connect_timeout(Duration::from_secs(10))
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(600))
        .sqlx_logging(true)
        .sqlx_logging_level(LevelFilter::Debug);

    let conn = Database::connect(opt).await.map_err(map_db_err)?;
    tracing::debug!(
        max_connections = db.max_connections,
        backend = ?conn.get_database_backend(),
        "Opened store pool"
    );
    Ok(conn)
}

/// Bring the schema up to date.
pub async fn migrate(db: &DatabaseConnection) -> Result<(), AppError> {
    use sea_orm_migration::MigratorTrait;

    let pending = migrations::Migrator::get_pending_migrations(db)
        .await
        .map_err(map_db_err)?
        .len();
    migrations::Migrator::up(db, None)
        .await
        .map_err(map_db_err)?;

    tracing::info!(applied = pending, "Schema is up to date");
    Ok(())
}

/// Map a database error, keeping unique-constraint violations distinguishable.
pub(crate) fn map_db_err(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => AppError::Conflict(detail),
        _ => AppError::Database(err.to_string()),
    }
}
