//! Migration to create the tenants table.
//!
//! One row per storefront. The `domain` column is matched against the request
//! hostname, and the branding columns are served to the storefront as-is.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Tenants::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Tenants::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Tenants::Name).text().not_null())
                    .col(ColumnDef::new(Tenants::Domain).text().not_null())
                    .col(ColumnDef::new(Tenants::MobileNumber).text().not_null())
                    .col(
                        ColumnDef::new(Tenants::PrimaryColor)
                            .text()
                            .not_null()
                            .default("#1d4ed8"),
                    )
                    .col(
                        ColumnDef::new(Tenants::SecondaryColor)
                            .text()
                            .not_null()
                            .default("#f59e0b"),
                    )
                    .col(
                        ColumnDef::new(Tenants::CreatedAt)
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
                    .name("idx_tenants_domain")
                    .table(Tenants::Table)
                    .col(Tenants::Domain)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_tenants_domain").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Tenants::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Tenants {
    Table,
    Id,
    Name,
    Domain,
    MobileNumber,
    PrimaryColor,
    SecondaryColor,
    CreatedAt,
}
