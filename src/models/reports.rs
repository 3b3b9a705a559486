use rust_decimal::{prelude::ToPrimitive, Decimal};
use serde::Serialize;
use time::{Date, Month, OffsetDateTime};
use uuid::Uuid;

use super::{courses::CourseStatus, credits::GlobalCreditTotals};

/// Revenue attributed to a coach for one calendar month
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoachMonthlyReport {
    pub revenue: i64,
    pub participants: i64,
    pub course_count: i64,
}

/// Per-course line of a coach's dashboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoachCourseOverview {
    pub course_id: Uuid,
    pub name: String,
    pub status: CourseStatus,
    pub capacity: u32,
    pub participants: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub starts_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub ends_at: OffsetDateTime,
}

/// Half-open UTC range `[first instant of month, first instant of next month)`.
pub fn month_window(year: i32, month: u8) -> Option<(OffsetDateTime, OffsetDateTime)> {
    let month = Month::try_from(month).ok()?;
    let start = Date::from_calendar_date(year, month, 1).ok()?;

    let (next_year, next_month) = match month {
        Month::December => (year.checked_add(1)?, Month::January),
        _ => (year, month.next()),
    };
    let end = Date::from_calendar_date(next_year, next_month, 1).ok()?;

    Some((start.midnight().assume_utc(), end.midnight().assume_utc()))
}

/// `floor(booking_count * blended price)`, multiplied before dividing so the
/// result does not depend on how the average was rounded.
pub fn attributed_revenue(booking_count: i64, totals: GlobalCreditTotals) -> Option<i64> {
    if totals.credits <= 0 || booking_count <= 0 {
        return Some(0);
    }

    let gross = Decimal::from(booking_count).checked_mul(totals.price)?;
    let revenue = gross.checked_div(Decimal::from(totals.credits))?;
    revenue.floor().to_i64()
}
