use sea_orm::{
    entity::*, query::*, sea_query::Expr, Condition, ConnectionTrait, DatabaseConnection, DbErr,
};
use time::OffsetDateTime;
use tracing::instrument;
use uuid::Uuid;

use crate::{error::EngineResult, models::bookings::Booking};

/// Store of enrollment rows.
///
/// Write paths take an explicit connection so the admission unit can run them
/// inside its transaction. A row is only ever inserted active and moved to
/// cancelled once; nothing here deletes.
pub struct BookingService {
    db: DatabaseConnection,
}

/// Bookings created in a time range for a set of courses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BookingActivity {
    pub bookings: i64,
    pub participants: i64,
}

fn count_to_i64(count: u64) -> i64 {
    i64::try_from(count).unwrap_or(i64::MAX)
}

impl BookingService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn active_booking<C: ConnectionTrait>(
        conn: &C,
        account_id: Uuid,
        course_id: Uuid,
    ) -> Result<Option<entity::course_bookings::Model>, DbErr> {
        entity::course_bookings::Entity::find()
            .filter(entity::course_bookings::Column::AccountId.eq(account_id))
            .filter(entity::course_bookings::Column::CourseId.eq(course_id))
            .filter(entity::course_bookings::Column::CancelledAt.is_null())
            .one(conn)
            .await
    }

    /// Credits currently held by an account
    pub async fn active_count_for_account<C: ConnectionTrait>(
        conn: &C,
        account_id: Uuid,
    ) -> Result<i64, DbErr> {
        let count = entity::course_bookings::Entity::find()
            .filter(entity::course_bookings::Column::AccountId.eq(account_id))
            .filter(entity::course_bookings::Column::CancelledAt.is_null())
            .count(conn)
            .await?;

        Ok(count_to_i64(count))
    }

    /// Seats currently taken in a course
    pub async fn active_count_for_course<C: ConnectionTrait>(
        conn: &C,
        course_id: Uuid,
    ) -> Result<i64, DbErr> {
        let count = entity::course_bookings::Entity::find()
            .filter(entity::course_bookings::Column::CourseId.eq(course_id))
            .filter(entity::course_bookings::Column::CancelledAt.is_null())
            .count(conn)
            .await?;

        Ok(count_to_i64(count))
    }

    pub async fn insert_active<C: ConnectionTrait>(
        conn: &C,
        account_id: Uuid,
        course_id: Uuid,
        created_at: OffsetDateTime,
    ) -> Result<entity::course_bookings::Model, DbErr> {
        let booking = entity::course_bookings::ActiveModel {
            id: Set(Uuid::new_v4()),
            account_id: Set(account_id),
            course_id: Set(course_id),
            created_at: Set(created_at),
            cancelled_at: Set(None),
        };

        booking.insert(conn).await
    }

    /// Compare-and-set `cancelled_at` on the active booking for the pair.
    ///
    /// Returns `None` when there is no active booking, including when a
    /// concurrent cancel got there first.
    pub async fn cancel_if_active<C: ConnectionTrait>(
        conn: &C,
        account_id: Uuid,
        course_id: Uuid,
        cancelled_at: OffsetDateTime,
    ) -> Result<Option<entity::course_bookings::Model>, DbErr> {
        let Some(booking) = Self::active_booking(conn, account_id, course_id).await? else {
            return Ok(None);
        };

        let result = entity::course_bookings::Entity::update_many()
            .col_expr(
                entity::course_bookings::Column::CancelledAt,
                Expr::value(Some(cancelled_at)),
            )
            .filter(entity::course_bookings::Column::Id.eq(booking.id))
            .filter(entity::course_bookings::Column::CancelledAt.is_null())
            .exec(conn)
            .await?;

        if result.rows_affected == 0 {
            return Ok(None);
        }

        Ok(Some(entity::course_bookings::Model {
            cancelled_at: Some(cancelled_at),
            ..booking
        }))
    }

    /// Every booking an account ever made, oldest first
    #[instrument(skip(self))]
    pub async fn history_for_account(&self, account_id: Uuid) -> EngineResult<Vec<Booking>> {
        let bookings = entity::course_bookings::Entity::find()
            .filter(entity::course_bookings::Column::AccountId.eq(account_id))
            .order_by_asc(entity::course_bookings::Column::CreatedAt)
            .order_by_asc(entity::course_bookings::Column::Id)
            .all(&self.db)
            .await?;

        Ok(bookings.into_iter().map(Booking::from).collect())
    }

    #[instrument(skip(self))]
    pub async fn active_count_for_account_now(&self, account_id: Uuid) -> EngineResult<i64> {
        Ok(Self::active_count_for_account(&self.db, account_id).await?)
    }

    /// Bookings of a course that were active at `at`
    #[instrument(skip(self))]
    pub async fn roster_size_at(&self, course_id: Uuid, at: OffsetDateTime) -> EngineResult<i64> {
        let count = entity::course_bookings::Entity::find()
            .filter(entity::course_bookings::Column::CourseId.eq(course_id))
            .filter(entity::course_bookings::Column::CreatedAt.lte(at))
            .filter(
                Condition::any()
                    .add(entity::course_bookings::Column::CancelledAt.is_null())
                    .add(entity::course_bookings::Column::CancelledAt.gt(at)),
            )
            .count(&self.db)
            .await?;

        Ok(count_to_i64(count))
    }

    /// Bookings created in `[from, to)` for any of `course_ids`, cancelled or not
    #[instrument(skip(self, course_ids))]
    pub async fn created_between(
        &self,
        course_ids: &[Uuid],
        from: OffsetDateTime,
        to: OffsetDateTime,
    ) -> EngineResult<BookingActivity> {
        if course_ids.is_empty() {
            return Ok(BookingActivity::default());
        }

        let in_range = Condition::all()
            .add(entity::course_bookings::Column::CourseId.is_in(course_ids.iter().copied()))
            .add(entity::course_bookings::Column::CreatedAt.gte(from))
            .add(entity::course_bookings::Column::CreatedAt.lt(to));

        let bookings = entity::course_bookings::Entity::find()
            .filter(in_range.clone())
            .count(&self.db)
            .await?;

        let participants = entity::course_bookings::Entity::find()
            .select_only()
            .column(entity::course_bookings::Column::AccountId)
            .distinct()
            .filter(in_range)
            .count(&self.db)
            .await?;

        Ok(BookingActivity {
            bookings: count_to_i64(bookings),
            participants: count_to_i64(participants),
        })
    }
}
