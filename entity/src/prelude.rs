pub use super::course_bookings::Entity as CourseBookings;
pub use super::courses::Entity as Courses;
pub use super::credit_packages::Entity as CreditPackages;
pub use super::credit_purchases::Entity as CreditPurchases;
