pub mod prelude;

pub mod course_bookings;
pub mod courses;
pub mod credit_packages;
pub mod credit_purchases;
