//! Create timeline entry table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TimelineEntry::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TimelineEntry::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(TimelineEntry::GrievanceId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(TimelineEntry::Sequence).integer().not_null())
                    .col(ColumnDef::new(TimelineEntry::Action).string_len(64).not_null())
                    .col(ColumnDef::new(TimelineEntry::Status).string_len(16).not_null())
                    .col(ColumnDef::new(TimelineEntry::Remarks).text())
                    .col(ColumnDef::new(TimelineEntry::OfficerId).string_len(32))
                    .col(
                        ColumnDef::new(TimelineEntry::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_timeline_entry_grievance")
                            .from(TimelineEntry::Table, TimelineEntry::GrievanceId)
                            .to(Grievance::Table, Grievance::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (grievance_id, sequence) - one entry per transition
        manager
            .create_index(
                Index::create()
                    .name("idx_timeline_entry_grievance_sequence")
                    .table(TimelineEntry::Table)
                    .col(TimelineEntry::GrievanceId)
                    .col(TimelineEntry::Sequence)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TimelineEntry::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum TimelineEntry {
    Table,
    Id,
    GrievanceId,
    Sequence,
    Action,
    Status,
    Remarks,
    OfficerId,
    CreatedAt,
}

#[derive(Iden)]
enum Grievance {
    Table,
    Id,
}
