//! Read-only view of the course catalog.
//!
//! The engine never writes courses. Anything that can answer "which course is
//! this, who owns it, how many seats" can stand behind [`CourseCatalog`].

use async_trait::async_trait;
use sea_orm::{entity::*, query::*, DatabaseConnection};
use tracing::instrument;
use uuid::Uuid;

use crate::{error::EngineResult, models::courses::Course};

#[async_trait]
pub trait CourseCatalog: Send + Sync {
    async fn get(&self, course_id: Uuid) -> EngineResult<Option<Course>>;

    async fn courses_by_coach(&self, coach_id: Uuid) -> EngineResult<Vec<Course>>;
}

/// Catalog backed by the `courses` table
pub struct DbCourseCatalog {
    db: DatabaseConnection,
}

impl DbCourseCatalog {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CourseCatalog for DbCourseCatalog {
    #[instrument(skip(self))]
    async fn get(&self, course_id: Uuid) -> EngineResult<Option<Course>> {
        let course = entity::courses::Entity::find_by_id(course_id)
            .one(&self.db)
            .await?;

        Ok(course.map(Course::from))
    }

    #[instrument(skip(self))]
    async fn courses_by_coach(&self, coach_id: Uuid) -> EngineResult<Vec<Course>> {
        let courses = entity::courses::Entity::find()
            .filter(entity::courses::Column::CoachId.eq(coach_id))
            .order_by_asc(entity::courses::Column::StartsAt)
            .all(&self.db)
            .await?;

        Ok(courses.into_iter().map(Course::from).collect())
    }
}
