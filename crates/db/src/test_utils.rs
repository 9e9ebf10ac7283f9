//! Test utilities for database operations.
//!
//! Provides an in-memory SQLite database with the real migrations applied,
//! plus builders for the rows most tests need.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, DbErr, Set};
use sea_orm_migration::MigratorTrait;
use tracing::info;

use crate::entities::{GrievanceState, citizen, grievance, officer, timeline_entry};
use crate::migrations::Migrator;

/// Create a fresh in-memory database with all migrations applied.
///
/// The pool holds a single connection: every SQLite in-memory connection is
/// its own database.
pub async fn setup_test_db() -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1).min_connections(1).sqlx_logging(false);

    let db = Database::connect(opt).await?;
    Migrator::up(&db, None).await?;

    info!("Created in-memory test database");
    Ok(db)
}

/// Insert a citizen.
pub async fn insert_citizen(
    db: &DatabaseConnection,
    id: &str,
    mobile: &str,
    at: DateTime<Utc>,
) -> Result<citizen::Model, DbErr> {
    citizen::ActiveModel {
        id: Set(id.to_string()),
        mobile: Set(mobile.to_string()),
        name: Set(None),
        email: Set(None),
        created_at: Set(at.into()),
    }
    .insert(db)
    .await
}

/// Insert an officer with an arbitrary password hash.
pub async fn insert_officer(
    db: &DatabaseConnection,
    id: &str,
    employee_id: &str,
    department: &str,
    at: DateTime<Utc>,
) -> Result<officer::Model, DbErr> {
    officer::ActiveModel {
        id: Set(id.to_string()),
        employee_id: Set(employee_id.to_string()),
        name: Set(format!("Officer {employee_id}")),
        department: Set(department.to_string()),
        password_hash: Set("unused".to_string()),
        created_at: Set(at.into()),
    }
    .insert(db)
    .await
}

/// Insert a grievance in `status` at version 1 together with its first
/// timeline entry.
pub async fn insert_grievance(
    db: &DatabaseConnection,
    id: &str,
    ref_id: &str,
    citizen_id: &str,
    department: &str,
    status: GrievanceState,
    at: DateTime<Utc>,
) -> Result<grievance::Model, DbErr> {
    let grievance = grievance::ActiveModel {
        id: Set(id.to_string()),
        ref_id: Set(ref_id.to_string()),
        citizen_id: Set(citizen_id.to_string()),
        department: Set(department.to_string()),
        category: Set("Pipeline Leakage".to_string()),
        subject: Set("Leaking main".to_string()),
        description: Set("Water main leaking near the school".to_string()),
        status: Set(status),
        location_state: Set("Rajasthan".to_string()),
        district: Set("Jaipur".to_string()),
        version: Set(1),
        state_changed_at: Set(at.into()),
        reminder_count: Set(0),
        last_reminded_at: Set(None),
        created_at: Set(at.into()),
        updated_at: Set(None),
    }
    .insert(db)
    .await?;

    timeline_entry::ActiveModel {
        id: Set(format!("{id}-1")),
        grievance_id: Set(id.to_string()),
        sequence: Set(1),
        action: Set(status.as_str().to_string()),
        status: Set(status),
        remarks: Set(None),
        officer_id: Set(None),
        created_at: Set(at.into()),
    }
    .insert(db)
    .await?;

    Ok(grievance)
}
