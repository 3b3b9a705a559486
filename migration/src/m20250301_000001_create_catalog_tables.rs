use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Courses are owned by the catalog; the engine only reads them
        manager
            .create_table(
                Table::create()
                    .table(Courses::Table)
                    .if_not_exists()
                    .col(pk_uuid(Courses::Id))
                    .col(uuid(Courses::CoachId))
                    .col(string(Courses::Name))
                    .col(
                        integer(Courses::Capacity)
                            .check(Expr::col(Courses::Capacity).gt(0)),
                    )
                    .col(timestamp_with_time_zone(Courses::StartsAt))
                    .col(timestamp_with_time_zone(Courses::EndsAt))
                    .col(
                        timestamp_with_time_zone(Courses::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_courses_coach_id")
                    .table(Courses::Table)
                    .col(Courses::CoachId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CreditPackages::Table)
                    .if_not_exists()
                    .col(pk_uuid(CreditPackages::Id))
                    .col(string(CreditPackages::Name).unique_key())
                    .col(
                        integer(CreditPackages::CreditAmount)
                            .check(Expr::col(CreditPackages::CreditAmount).gt(0)),
                    )
                    .col(decimal_len(CreditPackages::Price, 10, 2))
                    .col(
                        timestamp_with_time_zone(CreditPackages::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CreditPackages::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Courses::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Courses {
    Table,
    Id,
    CoachId,
    Name,
    Capacity,
    StartsAt,
    EndsAt,
    CreatedAt,
}

#[derive(DeriveIden)]
pub(crate) enum CreditPackages {
    Table,
    Id,
    Name,
    CreditAmount,
    Price,
    CreatedAt,
}
