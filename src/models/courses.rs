use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

/// Course as seen by the engine: identity, owner, window and capacity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: Uuid,
    pub coach_id: Uuid,
    pub name: String,
    pub capacity: u32,
    #[serde(with = "time::serde::rfc3339")]
    pub starts_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub ends_at: OffsetDateTime,
}

impl From<entity::courses::Model> for Course {
    fn from(model: entity::courses::Model) -> Self {
        Self {
            id: model.id,
            coach_id: model.coach_id,
            name: model.name,
            // The table rejects non-positive capacities
            capacity: u32::try_from(model.capacity).unwrap_or(0),
            starts_at: model.starts_at,
            ends_at: model.ends_at,
        }
    }
}

impl Course {
    pub fn status_at(&self, at: OffsetDateTime) -> CourseStatus {
        course_status(self.starts_at, self.ends_at, at)
    }
}

/// Where a reference time falls relative to a course window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CourseStatus {
    NotStarted,
    Open,
    Ended,
}

/// Window bounds are inclusive on both ends.
pub fn course_status(
    starts_at: OffsetDateTime,
    ends_at: OffsetDateTime,
    at: OffsetDateTime,
) -> CourseStatus {
    if at < starts_at {
        CourseStatus::NotStarted
    } else if at <= ends_at {
        CourseStatus::Open
    } else {
        CourseStatus::Ended
    }
}
