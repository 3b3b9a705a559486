use std::sync::Arc;

use rust_decimal::Decimal;
use sea_orm::{entity::*, query::*, ConnectionTrait, DatabaseConnection, DbErr};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    clock::Clock,
    error::{EngineError, EngineResult},
    models::credits::{CreditPackage, CreditPurchaseRecord, GlobalCreditTotals},
};

/// Append-only record of credit purchases.
///
/// Rows are inserted once and never updated or deleted, so an account's total
/// credit is always the plain sum of its rows.
pub struct LedgerService {
    db: DatabaseConnection,
    clock: Arc<dyn Clock>,
}

impl LedgerService {
    pub fn new(db: DatabaseConnection, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    /// Record a new credit purchase
    #[instrument(skip(self))]
    pub async fn record_purchase(
        &self,
        account_id: Uuid,
        credits_granted: i32,
        price_paid: Decimal,
        package_id: Option<Uuid>,
        purchased_at: time::OffsetDateTime,
    ) -> EngineResult<CreditPurchaseRecord> {
        if credits_granted <= 0 {
            return Err(EngineError::BadRequest(format!(
                "credits_granted must be positive, got {}",
                credits_granted
            )));
        }
        if price_paid < Decimal::ZERO {
            return Err(EngineError::BadRequest(format!(
                "price_paid must not be negative, got {}",
                price_paid
            )));
        }

        let new_purchase = entity::credit_purchases::ActiveModel {
            id: Set(Uuid::new_v4()),
            account_id: Set(account_id),
            package_id: Set(package_id),
            credits_granted: Set(credits_granted),
            price_paid: Set(price_paid),
            purchased_at: Set(purchased_at),
        };

        let purchase = new_purchase.insert(&self.db).await?;

        info!(
            %account_id,
            purchase_id = %purchase.id,
            credits = credits_granted,
            price = %price_paid,
            "Recorded credit purchase"
        );

        Ok(purchase.into())
    }

    /// Buy a catalog package: its credits and price are copied into the ledger
    #[instrument(skip(self))]
    pub async fn purchase_package(
        &self,
        account_id: Uuid,
        package_id: Uuid,
    ) -> EngineResult<CreditPurchaseRecord> {
        let package = entity::credit_packages::Entity::find_by_id(package_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| {
                EngineError::NotFound(format!("Credit package {} not found", package_id))
            })?;

        self.record_purchase(
            account_id,
            package.credit_amount,
            package.price,
            Some(package.id),
            self.clock.now(),
        )
        .await
    }

    #[instrument(skip(self))]
    pub async fn list_packages(&self) -> EngineResult<Vec<CreditPackage>> {
        let packages = entity::credit_packages::Entity::find()
            .order_by_asc(entity::credit_packages::Column::CreditAmount)
            .all(&self.db)
            .await?;

        Ok(packages.into_iter().map(CreditPackage::from).collect())
    }

    /// All purchases for an account, oldest first
    #[instrument(skip(self))]
    pub async fn purchase_history(&self, account_id: Uuid) -> EngineResult<Vec<CreditPurchaseRecord>> {
        let purchases = entity::credit_purchases::Entity::find()
            .filter(entity::credit_purchases::Column::AccountId.eq(account_id))
            .order_by_asc(entity::credit_purchases::Column::PurchasedAt)
            .order_by_asc(entity::credit_purchases::Column::Id)
            .all(&self.db)
            .await?;

        Ok(purchases.into_iter().map(CreditPurchaseRecord::from).collect())
    }

    #[instrument(skip(self))]
    pub async fn total_credits(&self, account_id: Uuid) -> EngineResult<i64> {
        Ok(Self::total_credits_in(&self.db, account_id).await?)
    }

    /// Sum of `credits_granted` for an account, read through `conn` so callers
    /// can evaluate it inside their own transaction
    pub async fn total_credits_in<C: ConnectionTrait>(
        conn: &C,
        account_id: Uuid,
    ) -> Result<i64, DbErr> {
        let total = entity::credit_purchases::Entity::find()
            .select_only()
            .column_as(
                entity::credit_purchases::Column::CreditsGranted.sum(),
                "total_credits",
            )
            .filter(entity::credit_purchases::Column::AccountId.eq(account_id))
            .into_tuple::<Option<i64>>()
            .one(conn)
            .await?
            .flatten()
            .unwrap_or(0);

        Ok(total)
    }

    /// Credits and money across every purchase in the system
    #[instrument(skip(self))]
    pub async fn global_credit_totals(&self) -> EngineResult<GlobalCreditTotals> {
        let totals = entity::credit_purchases::Entity::find()
            .select_only()
            .column_as(
                entity::credit_purchases::Column::CreditsGranted.sum(),
                "total_credits",
            )
            .column_as(
                entity::credit_purchases::Column::PricePaid.sum(),
                "total_price",
            )
            .into_tuple::<(Option<i64>, Option<Decimal>)>()
            .one(&self.db)
            .await?;

        let (credits, price) = totals.unwrap_or((None, None));

        Ok(GlobalCreditTotals {
            credits: credits.unwrap_or(0),
            price: price.unwrap_or(Decimal::ZERO),
        })
    }
}
