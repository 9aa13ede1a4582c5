use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A lot of a product received together, tracked for expiry and
/// traceability. `available_quantity` only ever decreases after creation;
/// fulfillment consumes batches oldest manufacture date first.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "batches")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub product_id: Uuid,
    pub batch_number: String,
    pub manufacture_date: NaiveDate,
    pub expiry_date: Option<NaiveDate>,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub received_quantity: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub available_quantity: Decimal,
    pub created_at: DateTime<Utc>,
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
    pub fn is_depleted(&self) -> bool {
        self.available_quantity <= Decimal::ZERO
    }
}
