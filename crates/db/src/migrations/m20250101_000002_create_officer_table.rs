//! Create officer table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Officer::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Officer::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Officer::EmployeeId).string_len(64).not_null())
                    .col(ColumnDef::new(Officer::Name).string_len(128).not_null())
                    .col(ColumnDef::new(Officer::Department).string_len(128).not_null())
                    .col(ColumnDef::new(Officer::PasswordHash).string_len(256).not_null())
                    .col(
                        ColumnDef::new(Officer::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_officer_employee_id")
                    .table(Officer::Table)
                    .col(Officer::EmployeeId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_officer_department")
                    .table(Officer::Table)
                    .col(Officer::Department)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Officer::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Officer {
    Table,
    Id,
    EmployeeId,
    Name,
    Department,
    PasswordHash,
    CreatedAt,
}
