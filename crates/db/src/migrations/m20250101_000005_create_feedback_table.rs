//! Create feedback table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Feedback::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Feedback::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Feedback::GrievanceId).string_len(32).not_null())
                    .col(ColumnDef::new(Feedback::Rating).small_integer().not_null())
                    .col(ColumnDef::new(Feedback::Resolved).boolean().not_null())
                    .col(ColumnDef::new(Feedback::Comments).text())
                    .col(
                        ColumnDef::new(Feedback::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_feedback_grievance")
                            .from(Feedback::Table, Feedback::GrievanceId)
                            .to(Grievance::Table, Grievance::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: grievance_id - at most one feedback per grievance
        manager
            .create_index(
                Index::create()
                    .name("idx_feedback_grievance_id")
                    .table(Feedback::Table)
                    .col(Feedback::GrievanceId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Feedback::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Feedback {
    Table,
    Id,
    GrievanceId,
    Rating,
    Resolved,
    Comments,
    CreatedAt,
}

#[derive(Iden)]
enum Grievance {
    Table,
    Id,
}
