// Domain and response models
pub mod bookings;
pub mod common;
pub mod courses;
pub mod credits;
pub mod reports;
