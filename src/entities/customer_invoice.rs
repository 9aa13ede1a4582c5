use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Billing document generated from a delivery. Status strings are
/// validated by the order state machine (POSTED, PARTIALLY_PAID, PAID).
/// The unique delivery_note_id makes re-invoicing a delivery idempotent.
/// paid_amount tracks cumulative allocations and never exceeds
/// total_amount; every allocation increments it through a guarded update.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "customer_invoices")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub invoice_number: String,
    pub customer_id: Uuid,
    pub sales_order_id: Uuid,
    #[sea_orm(unique)]
    pub delivery_note_id: Uuid,
    pub status: String,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub total_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub paid_amount: Decimal,
    pub issued_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::customer_invoice_line::Entity")]
    Lines,
    #[sea_orm(
        belongs_to = "super::party::Entity",
        from = "Column::CustomerId",
        to = "super::party::Column::Id"
    )]
    Customer,
}

impl Related<super::customer_invoice_line::Entity> for Entity {
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
