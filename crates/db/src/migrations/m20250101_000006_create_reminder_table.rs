//! Create reminder table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Reminder::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Reminder::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Reminder::GrievanceId).string_len(32).not_null())
                    .col(ColumnDef::new(Reminder::Mobile).string_len(16).not_null())
                    .col(
                        ColumnDef::new(Reminder::SentAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reminder_grievance")
                            .from(Reminder::Table, Reminder::GrievanceId)
                            .to(Grievance::Table, Grievance::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (grievance_id, sent_at) for cooldown lookups
        manager
            .create_index(
                Index::create()
                    .name("idx_reminder_grievance_sent_at")
                    .table(Reminder::Table)
                    .col(Reminder::GrievanceId)
                    .col(Reminder::SentAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Reminder::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Reminder {
    Table,
    Id,
    GrievanceId,
    Mobile,
    SentAt,
}

#[derive(Iden)]
enum Grievance {
    Table,
    Id,
}
