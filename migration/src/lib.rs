pub use sea_orm_migration::prelude::*;

mod m20250301_000001_create_catalog_tables;
mod m20250301_000002_create_credit_purchases;
mod m20250301_000003_create_course_bookings;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_catalog_tables::Migration),
            Box::new(m20250301_000002_create_credit_purchases::Migration),
            Box::new(m20250301_000003_create_course_bookings::Migration),
        ]
    }
}
