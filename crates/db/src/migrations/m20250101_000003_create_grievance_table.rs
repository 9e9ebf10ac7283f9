//! Create grievance table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Grievance::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Grievance::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Grievance::RefId).string_len(32).not_null())
                    .col(ColumnDef::new(Grievance::CitizenId).string_len(32).not_null())
                    .col(ColumnDef::new(Grievance::Department).string_len(128).not_null())
                    .col(ColumnDef::new(Grievance::Category).string_len(128).not_null())
                    .col(ColumnDef::new(Grievance::Subject).string_len(256).not_null())
                    .col(ColumnDef::new(Grievance::Description).text().not_null())
                    .col(ColumnDef::new(Grievance::Status).string_len(16).not_null())
                    .col(ColumnDef::new(Grievance::LocationState).string_len(128).not_null())
                    .col(ColumnDef::new(Grievance::District).string_len(128).not_null())
                    .col(
                        ColumnDef::new(Grievance::Version)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(Grievance::StateChangedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Grievance::ReminderCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Grievance::LastRemindedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Grievance::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Grievance::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_grievance_citizen")
                            .from(Grievance::Table, Grievance::CitizenId)
                            .to(Citizen::Table, Citizen::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: ref_id (public reference ids are never reused)
        manager
            .create_index(
                Index::create()
                    .name("idx_grievance_ref_id")
                    .table(Grievance::Table)
                    .col(Grievance::RefId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: (citizen_id, created_at) for "my grievances"
        manager
            .create_index(
                Index::create()
                    .name("idx_grievance_citizen_created")
                    .table(Grievance::Table)
                    .col(Grievance::CitizenId)
                    .col(Grievance::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // Index: (department, status) for officer lists and stats
        manager
            .create_index(
                Index::create()
                    .name("idx_grievance_department_status")
                    .table(Grievance::Table)
                    .col(Grievance::Department)
                    .col(Grievance::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Grievance::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Grievance {
    Table,
    Id,
    RefId,
    CitizenId,
    Department,
    Category,
    Subject,
    Description,
    Status,
    LocationState,
    District,
    Version,
    StateChangedAt,
    ReminderCount,
    LastRemindedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Citizen {
    Table,
    Id,
}
