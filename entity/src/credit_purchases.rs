use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Append-only ledger row: one per package bought by an account.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "credit_purchases")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub account_id: Uuid,
    pub package_id: Option<Uuid>,
    pub credits_granted: i32,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub price_paid: Decimal,
    pub purchased_at: TimeDateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::credit_packages::Entity",
        from = "Column::PackageId",
        to = "super::credit_packages::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    CreditPackages,
}

impl Related<super::credit_packages::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CreditPackages.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
