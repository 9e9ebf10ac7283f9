//! Create citizen table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Citizen::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Citizen::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Citizen::Mobile).string_len(16).not_null())
                    .col(ColumnDef::new(Citizen::Name).string_len(128))
                    .col(ColumnDef::new(Citizen::Email).string_len(256))
                    .col(
                        ColumnDef::new(Citizen::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: mobile (one citizen per verified number)
        manager
            .create_index(
                Index::create()
                    .name("idx_citizen_mobile")
                    .table(Citizen::Table)
                    .col(Citizen::Mobile)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Citizen::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Citizen {
    Table,
    Id,
    Mobile,
    Name,
    Email,
    CreatedAt,
}
