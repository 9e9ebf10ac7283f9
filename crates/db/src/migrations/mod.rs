//! Database migrations.
//!
//! Schema migrations for the database.

#![allow(missing_docs)]

use sea_orm_migration::prelude::*;

mod m20250101_000001_create_citizen_table;
mod m20250101_000002_create_officer_table;
mod m20250101_000003_create_grievance_table;
mod m20250101_000004_create_timeline_entry_table;
mod m20250101_000005_create_feedback_table;
mod m20250101_000006_create_reminder_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_citizen_table::Migration),
            Box::new(m20250101_000002_create_officer_table::Migration),
            Box::new(m20250101_000003_create_grievance_table::Migration),
            Box::new(m20250101_000004_create_timeline_entry_table::Migration),
            Box::new(m20250101_000005_create_feedback_table::Migration),
            Box::new(m20250101_000006_create_reminder_table::Migration),
        ]
    }
}
