//! Enroll/cancel decisions.
//!
//! Every enrollment runs its three checks (no active booking for the pair,
//! credit left, seat left) and the insert inside one transaction. On Postgres
//! the transaction first takes transaction-scoped advisory locks on the account
//! and then the course, always in that order, so two requests touching the
//! same account or the same course are serialized and cannot both pass a check
//! that only one of them may pass. SQLite allows a single writer, which gives
//! the same guarantee.
//!
//! Lock waits are bounded by `lock_timeout`. A timed out, deadlocked or
//! serialization-failed attempt is rolled back as a whole and replayed; after
//! `max_attempts` the caller gets [`EngineError::TransientConflict`].

use std::{future::Future, sync::Arc};

use sea_orm::{
    ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbBackend, DbErr, Statement,
    TransactionTrait,
};
use time::OffsetDateTime;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    clock::Clock,
    config::AdmissionConfig,
    error::{is_transient, is_unique_violation, EngineError, EngineResult},
    models::{
        bookings::{Booking, CancelOutcome, EnrollOutcome, EnrollRejection},
        courses::Course,
    },
    services::{booking_service::BookingService, catalog_service::CourseCatalog, LedgerService},
};

// Keep account and course keys apart in the advisory lock space
const ACCOUNT_LOCK_NAMESPACE: u64 = 0x6163_636f_756e_7400;
const COURSE_LOCK_NAMESPACE: u64 = 0x636f_7572_7365_0000;

fn advisory_key(namespace: u64, id: Uuid) -> i64 {
    let (hi, lo) = id.as_u64_pair();
    (hi ^ lo ^ namespace) as i64
}

pub struct AdmissionService {
    db: DatabaseConnection,
    catalog: Arc<dyn CourseCatalog>,
    clock: Arc<dyn Clock>,
    config: AdmissionConfig,
}

impl AdmissionService {
    pub fn new(
        db: DatabaseConnection,
        catalog: Arc<dyn CourseCatalog>,
        clock: Arc<dyn Clock>,
        config: &AdmissionConfig,
    ) -> Self {
        Self {
            db,
            catalog,
            clock,
            config: config.clone(),
        }
    }

    /// Enroll an account in a course, spending one credit
    #[instrument(skip(self))]
    pub async fn enroll(&self, account_id: Uuid, course_id: Uuid) -> EngineResult<EnrollOutcome> {
        // Catalog I/O happens before the unit opens; the course is pinned for all attempts
        let Some(course) = self.catalog.get(course_id).await? else {
            info!(%account_id, %course_id, "Enrollment rejected: course not found");
            return Ok(EnrollOutcome::Rejected(EnrollRejection::NotFound));
        };

        let now = self.clock.now();
        let outcome = retry_transient(&self.config, "enroll", || {
            self.try_enroll(account_id, &course, now)
        })
        .await?;

        match &outcome {
            EnrollOutcome::Enrolled(booking) => info!(
                %account_id,
                %course_id,
                booking_id = %booking.id,
                "Enrolled"
            ),
            EnrollOutcome::Rejected(reason) => info!(
                %account_id,
                %course_id,
                ?reason,
                "Enrollment rejected"
            ),
        }

        Ok(outcome)
    }

    /// Cancel the account's active booking for a course, releasing its credit and seat
    #[instrument(skip(self))]
    pub async fn cancel(&self, account_id: Uuid, course_id: Uuid) -> EngineResult<CancelOutcome> {
        let now = self.clock.now();
        let cancelled = retry_transient(&self.config, "cancel", || {
            BookingService::cancel_if_active(&self.db, account_id, course_id, now)
        })
        .await?;

        match cancelled {
            Some(booking) => {
                info!(%account_id, %course_id, booking_id = %booking.id, "Cancelled booking");
                Ok(CancelOutcome::Cancelled(Booking::from(booking)))
            }
            None => {
                info!(%account_id, %course_id, "Cancel rejected: no active booking");
                Ok(CancelOutcome::NotEnrolled)
            }
        }
    }

    /// One attempt of the check-then-insert sequence, all against the same transaction
    async fn try_enroll(
        &self,
        account_id: Uuid,
        course: &Course,
        now: OffsetDateTime,
    ) -> Result<EnrollOutcome, DbErr> {
        let txn = self.begin_unit(account_id, course.id).await?;

        // 1. One active booking per (account, course)
        if BookingService::active_booking(&txn, account_id, course.id)
            .await?
            .is_some()
        {
            txn.rollback().await?;
            return Ok(EnrollOutcome::Rejected(EnrollRejection::AlreadyEnrolled));
        }

        // 2. Credit left
        let total = LedgerService::total_credits_in(&txn, account_id).await?;
        let used = BookingService::active_count_for_account(&txn, account_id).await?;
        if total - used <= 0 {
            txn.rollback().await?;
            return Ok(EnrollOutcome::Rejected(EnrollRejection::InsufficientCredit));
        }

        // 3. Seat left
        let taken = BookingService::active_count_for_course(&txn, course.id).await?;
        if taken >= i64::from(course.capacity) {
            txn.rollback().await?;
            return Ok(EnrollOutcome::Rejected(EnrollRejection::CapacityExceeded));
        }

        // 4. Insert; the partial unique index backs up check 1
        match BookingService::insert_active(&txn, account_id, course.id, now).await {
            Ok(booking) => {
                txn.commit().await?;
                Ok(EnrollOutcome::Enrolled(Booking::from(booking)))
            }
            Err(err) if is_unique_violation(&err) => {
                txn.rollback().await?;
                Ok(EnrollOutcome::Rejected(EnrollRejection::AlreadyEnrolled))
            }
            Err(err) => Err(err),
        }
    }

    /// Open the transaction and, on Postgres, take the account then course locks
    async fn begin_unit(
        &self,
        account_id: Uuid,
        course_id: Uuid,
    ) -> Result<DatabaseTransaction, DbErr> {
        let txn = self.db.begin().await?;

        if txn.get_database_backend() == DbBackend::Postgres {
            txn.execute_unprepared(&format!(
                "SET LOCAL lock_timeout = {}",
                self.config.lock_timeout_ms
            ))
            .await?;

            for key in [
                advisory_key(ACCOUNT_LOCK_NAMESPACE, account_id),
                advisory_key(COURSE_LOCK_NAMESPACE, course_id),
            ] {
                txn.execute(Statement::from_sql_and_values(
                    DbBackend::Postgres,
                    "SELECT pg_advisory_xact_lock($1)",
                    [key.into()],
                ))
                .await?;
            }
        }

        Ok(txn)
    }
}

/// Replay `attempt` while it fails with a transient database error
async fn retry_transient<T, F, Fut>(
    config: &AdmissionConfig,
    operation: &str,
    mut attempt: F,
) -> EngineResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DbErr>>,
{
    let max_attempts = config.max_attempts.max(1);
    let mut tries = 1;

    loop {
        match attempt().await {
            Ok(value) => return Ok(value),
            Err(err) if is_transient(&err) => {
                if tries >= max_attempts {
                    warn!(
                        operation,
                        attempts = tries,
                        error = %err,
                        "Giving up after transient conflicts"
                    );
                    return Err(EngineError::TransientConflict { attempts: tries });
                }

                let delay = config.backoff_for(tries);
                warn!(
                    operation,
                    attempt = tries,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Transient conflict, retrying"
                );
                tokio::time::sleep(delay).await;
                tries += 1;
            }
            Err(err) => return Err(err.into()),
        }
    }
}
