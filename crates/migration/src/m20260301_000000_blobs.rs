//! Blob table backing the engine store.
//!
//! One row per persisted document (`expense_profile`, `expense_accounts`,
//! `expense_transactions`), the payload being the JSON text.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Blobs {
    Table,
    Name,
    Payload,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Blobs::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Blobs::Name).string().not_null().primary_key())
                    .col(ColumnDef::new(Blobs::Payload).text().not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Blobs::Table).to_owned())
            .await
    }
}
