use crate::{
    clock::{Clock, SystemClock},
    config::Config,
    services::{
        AdmissionService, BookingService, CourseCatalog, DbCourseCatalog, LedgerService,
        MetricsService,
    },
};
use sea_orm::{ConnectOptions, DatabaseConnection};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub ledger_service: Arc<LedgerService>,
    pub admission_service: Arc<AdmissionService>,
    pub metrics_service: Arc<MetricsService>,
    pub config: Arc<Config>,
}

impl AppState {
    pub async fn new(config: Config) -> Result<Self, anyhow::Error> {
        // Connect to database
        let mut options = ConnectOptions::new(config.database.url.clone());
        options
            .max_connections(config.database.max_connections)
            .sqlx_logging(false);
        let db = sea_orm::Database::connect(options).await?;

        Ok(Self::with_clock(db, config, Arc::new(SystemClock)))
    }

    /// Wire the services over an existing connection and time source
    pub fn with_clock(db: DatabaseConnection, config: Config, clock: Arc<dyn Clock>) -> Self {
        let catalog: Arc<dyn CourseCatalog> = Arc::new(DbCourseCatalog::new(db.clone()));
        let ledger_service = Arc::new(LedgerService::new(db.clone(), clock.clone()));
        let booking_service = Arc::new(BookingService::new(db.clone()));
        let admission_service = Arc::new(AdmissionService::new(
            db.clone(),
            catalog.clone(),
            clock.clone(),
            &config.admission,
        ));
        let metrics_service = Arc::new(MetricsService::new(
            ledger_service.clone(),
            booking_service,
            catalog,
            clock,
        ));

        Self {
            db,
            ledger_service,
            admission_service,
            metrics_service,
            config: Arc::new(config),
        }
    }
}
