use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use super::courses::CourseStatus;

/// Lifecycle of a booking. `Cancelled` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum BookingState {
    Active,
    Cancelled {
        #[serde(rename = "cancelledAt", with = "time::serde::rfc3339")]
        at: OffsetDateTime,
    },
}

impl BookingState {
    pub fn is_active(&self) -> bool {
        matches!(self, BookingState::Active)
    }

    pub fn cancelled_at(&self) -> Option<OffsetDateTime> {
        match self {
            BookingState::Active => None,
            BookingState::Cancelled { at } => Some(*at),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: Uuid,
    pub account_id: Uuid,
    pub course_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(flatten)]
    pub state: BookingState,
}

impl Booking {
    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }
}

impl From<entity::course_bookings::Model> for Booking {
    fn from(model: entity::course_bookings::Model) -> Self {
        let state = match model.cancelled_at {
            None => BookingState::Active,
            Some(at) => BookingState::Cancelled { at },
        };

        Self {
            id: model.id,
            account_id: model.account_id,
            course_id: model.course_id,
            created_at: model.created_at,
            state,
        }
    }
}

/// Why an enrollment was refused. These are business outcomes, not faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnrollRejection {
    NotFound,
    AlreadyEnrolled,
    InsufficientCredit,
    CapacityExceeded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrollOutcome {
    Enrolled(Booking),
    Rejected(EnrollRejection),
}

impl EnrollOutcome {
    pub fn is_enrolled(&self) -> bool {
        matches!(self, EnrollOutcome::Enrolled(_))
    }

    pub fn rejection(&self) -> Option<EnrollRejection> {
        match self {
            EnrollOutcome::Enrolled(_) => None,
            EnrollOutcome::Rejected(reason) => Some(*reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancelOutcome {
    Cancelled(Booking),
    NotEnrolled,
}

impl CancelOutcome {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, CancelOutcome::Cancelled(_))
    }
}

/// One line of an account's booking history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingHistoryEntry {
    pub booking_id: Uuid,
    pub course_id: Uuid,
    #[serde(flatten)]
    pub state: BookingState,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    // None when the course is no longer in the catalog
    pub course_status: Option<CourseStatus>,
}
