use std::sync::Arc;

use time::OffsetDateTime;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    clock::Clock,
    error::{EngineError, EngineResult},
    models::{
        bookings::BookingHistoryEntry,
        courses::CourseStatus,
        credits::CreditSummary,
        reports::{attributed_revenue, month_window, CoachCourseOverview, CoachMonthlyReport},
    },
    services::{BookingService, CourseCatalog, LedgerService},
};

/// Read-side figures derived from the ledger and the booking log.
///
/// Nothing is cached: every figure is recomputed from the stores on each call.
pub struct MetricsService {
    ledger: Arc<LedgerService>,
    bookings: Arc<BookingService>,
    catalog: Arc<dyn CourseCatalog>,
    clock: Arc<dyn Clock>,
}

impl MetricsService {
    pub fn new(
        ledger: Arc<LedgerService>,
        bookings: Arc<BookingService>,
        catalog: Arc<dyn CourseCatalog>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            ledger,
            bookings,
            catalog,
            clock,
        }
    }

    /// Purchased credits minus active bookings, never below zero
    #[instrument(skip(self))]
    pub async fn remaining_credit(&self, account_id: Uuid) -> EngineResult<i64> {
        Ok(self.account_credit_summary(account_id).await?.remaining)
    }

    #[instrument(skip(self))]
    pub async fn account_credit_summary(&self, account_id: Uuid) -> EngineResult<CreditSummary> {
        let total = self.ledger.total_credits(account_id).await?;
        let used = self.bookings.active_count_for_account_now(account_id).await?;

        Ok(CreditSummary::new(total, used))
    }

    #[instrument(skip(self))]
    pub async fn course_roster_size(
        &self,
        course_id: Uuid,
        at: OffsetDateTime,
    ) -> EngineResult<i64> {
        self.bookings.roster_size_at(course_id, at).await
    }

    #[instrument(skip(self))]
    pub async fn course_status(
        &self,
        course_id: Uuid,
        at: OffsetDateTime,
    ) -> EngineResult<CourseStatus> {
        let course = self
            .catalog
            .get(course_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("Course {} not found", course_id)))?;

        Ok(course.status_at(at))
    }

    /// Every booking of the account, oldest first, with where its course stands now
    #[instrument(skip(self))]
    pub async fn account_booking_history(
        &self,
        account_id: Uuid,
    ) -> EngineResult<Vec<BookingHistoryEntry>> {
        let now = self.clock.now();
        let bookings = self.bookings.history_for_account(account_id).await?;

        let mut entries = Vec::with_capacity(bookings.len());
        for booking in bookings {
            let course_status = self
                .catalog
                .get(booking.course_id)
                .await?
                .map(|course| course.status_at(now));

            entries.push(BookingHistoryEntry {
                booking_id: booking.id,
                course_id: booking.course_id,
                state: booking.state,
                created_at: booking.created_at,
                course_status,
            });
        }

        Ok(entries)
    }

    /// The coach's courses with their status and current roster
    #[instrument(skip(self))]
    pub async fn coach_course_overview(
        &self,
        coach_id: Uuid,
    ) -> EngineResult<Vec<CoachCourseOverview>> {
        let now = self.clock.now();
        let courses = self.catalog.courses_by_coach(coach_id).await?;

        let mut overview = Vec::with_capacity(courses.len());
        for course in courses {
            let participants = self.bookings.roster_size_at(course.id, now).await?;
            overview.push(CoachCourseOverview {
                course_id: course.id,
                status: course.status_at(now),
                capacity: course.capacity,
                participants,
                starts_at: course.starts_at,
                ends_at: course.ends_at,
                name: course.name,
            });
        }

        Ok(overview)
    }

    /// Revenue attributed to a coach for bookings created in the given month.
    ///
    /// Bookings count even if later cancelled. Each is valued at the blended
    /// price of one credit over all sales in the system, not just this coach's
    /// or this month's.
    #[instrument(skip(self))]
    pub async fn coach_monthly_report(
        &self,
        coach_id: Uuid,
        year: i32,
        month: u8,
    ) -> EngineResult<CoachMonthlyReport> {
        let (from, to) = month_window(year, month).ok_or_else(|| {
            EngineError::BadRequest(format!("Invalid month: {}-{}", year, month))
        })?;

        let course_ids: Vec<Uuid> = self
            .catalog
            .courses_by_coach(coach_id)
            .await?
            .into_iter()
            .map(|course| course.id)
            .collect();

        if course_ids.is_empty() {
            return Ok(CoachMonthlyReport::default());
        }

        let activity = self.bookings.created_between(&course_ids, from, to).await?;
        let totals = self.ledger.global_credit_totals().await?;
        let revenue = attributed_revenue(activity.bookings, totals).ok_or_else(|| {
            EngineError::Internal(anyhow::anyhow!(
                "Revenue overflow: {} bookings at {} / {}",
                activity.bookings,
                totals.price,
                totals.credits
            ))
        })?;

        info!(
            %coach_id,
            year,
            month,
            bookings = activity.bookings,
            participants = activity.participants,
            revenue,
            "Coach report"
        );

        Ok(CoachMonthlyReport {
            revenue,
            participants: activity.participants,
            course_count: activity.bookings,
        })
    }
}
