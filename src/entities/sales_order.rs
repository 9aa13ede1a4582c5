use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Customer-facing order. Status strings are validated by the order state
/// machine (DRAFT, APPROVED, SHIPPED, CLOSED, CANCELLED). Reserved stock is
/// implicitly tied to the order's unfulfilled lines.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sales_orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub order_number: String,
    pub customer_id: Uuid,
    pub warehouse_id: Uuid,
    pub status: String,
    pub order_date: DateTime<Utc>,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub total_amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::sales_order_line::Entity")]
    Lines,
    #[sea_orm(
        belongs_to = "super::party::Entity",
        from = "Column::CustomerId",
        to = "super::party::Column::Id"
    )]
    Customer,
}

impl Related<super::sales_order_line::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Lines.def()
    }
}

impl Related<super::party::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customer.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
