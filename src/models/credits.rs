use rust_decimal::Decimal;
use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

/// Single ledger row as returned to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditPurchaseRecord {
    pub id: Uuid,
    pub package_id: Option<Uuid>,
    pub credits_granted: i32,
    pub price_paid: Decimal,
    #[serde(with = "time::serde::rfc3339")]
    pub purchased_at: OffsetDateTime,
}

impl From<entity::credit_purchases::Model> for CreditPurchaseRecord {
    fn from(model: entity::credit_purchases::Model) -> Self {
        Self {
            id: model.id,
            package_id: model.package_id,
            credits_granted: model.credits_granted,
            price_paid: model.price_paid,
            purchased_at: model.purchased_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditPackage {
    pub id: Uuid,
    pub name: String,
    pub credit_amount: i32,
    pub price: Decimal,
}

impl From<entity::credit_packages::Model> for CreditPackage {
    fn from(model: entity::credit_packages::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            credit_amount: model.credit_amount,
            price: model.price,
        }
    }
}

/// Credits bought, credits held by active bookings, and what is left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditSummary {
    pub total: i64,
    pub used: i64,
    pub remaining: i64,
}

impl CreditSummary {
    pub fn new(total: i64, used: i64) -> Self {
        Self {
            total,
            used,
            remaining: (total - used).max(0),
        }
    }
}

/// System-wide sums over every purchase ever recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GlobalCreditTotals {
    pub credits: i64,
    pub price: Decimal,
}
