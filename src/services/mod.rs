// Service modules
pub mod admission_service;
pub mod booking_service;
pub mod catalog_service;
pub mod ledger_service;
pub mod metrics_service;

pub use admission_service::AdmissionService;
pub use booking_service::BookingService;
pub use catalog_service::{CourseCatalog, DbCourseCatalog};
pub use ledger_service::LedgerService;
pub use metrics_service::MetricsService;
