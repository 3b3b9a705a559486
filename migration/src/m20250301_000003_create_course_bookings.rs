use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // No foreign key to `courses`: the catalog is owned elsewhere and may
        // drop a course, but booking rows are never removed.
        manager
            .create_table(
                Table::create()
                    .table(CourseBookings::Table)
                    .if_not_exists()
                    .col(pk_uuid(CourseBookings::Id))
                    .col(uuid(CourseBookings::AccountId))
                    .col(uuid(CourseBookings::CourseId))
                    .col(timestamp_with_time_zone(CourseBookings::CreatedAt))
                    .col(timestamp_with_time_zone_null(CourseBookings::CancelledAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_course_bookings_account_id")
                    .table(CourseBookings::Table)
                    .col(CourseBookings::AccountId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_course_bookings_course_created")
                    .table(CourseBookings::Table)
                    .col(CourseBookings::CourseId)
                    .col(CourseBookings::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // At most one active booking per (account, course); same syntax on Postgres and SQLite
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                CREATE UNIQUE INDEX IF NOT EXISTS idx_course_bookings_active_pair
                ON course_bookings (account_id, course_id)
                WHERE cancelled_at IS NULL
                "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CourseBookings::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum CourseBookings {
    Table,
    Id,
    AccountId,
    CourseId,
    CreatedAt,
    CancelledAt,
}
