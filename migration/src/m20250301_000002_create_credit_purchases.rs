use sea_orm_migration::{prelude::*, schema::*};

use super::m20250301_000001_create_catalog_tables::CreditPackages;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Append-only ledger; rows are never updated or deleted
        manager
            .create_table(
                Table::create()
                    .table(CreditPurchases::Table)
                    .if_not_exists()
                    .col(pk_uuid(CreditPurchases::Id))
                    .col(uuid(CreditPurchases::AccountId))
                    .col(uuid_null(CreditPurchases::PackageId))
                    .col(
                        integer(CreditPurchases::CreditsGranted)
                            .check(Expr::col(CreditPurchases::CreditsGranted).gt(0)),
                    )
                    .col(
                        decimal_len(CreditPurchases::PricePaid, 10, 2)
                            .check(Expr::col(CreditPurchases::PricePaid).gte(0)),
                    )
                    .col(timestamp_with_time_zone(CreditPurchases::PurchasedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_credit_purchases_package_id")
                            .from(CreditPurchases::Table, CreditPurchases::PackageId)
                            .to(CreditPackages::Table, CreditPackages::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_credit_purchases_account_id")
                    .table(CreditPurchases::Table)
                    .col(CreditPurchases::AccountId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CreditPurchases::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum CreditPurchases {
    Table,
    Id,
    AccountId,
    PackageId,
    CreditsGranted,
    PricePaid,
    PurchasedAt,
}
