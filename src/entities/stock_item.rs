use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// The stock ledger row, one per (product, warehouse).
///
/// Invariant: `0 <= reserved_quantity <= quantity_on_hand` at all times.
/// Rows are created lazily on first receipt and mutated exclusively through
/// the stock ledger service's conditional updates.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub product_id: Uuid,
    pub warehouse_id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub quantity_on_hand: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub reserved_quantity: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Quantity that may still be reserved: on-hand minus reserved.
    pub fn available(&self) -> Decimal {
        self.quantity_on_hand - self.reserved_quantity
    }
}
