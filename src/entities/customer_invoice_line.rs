use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Invoice line mirrored from the originating sales-order line.
/// Deduplicated by (invoice, product) so a retried generation never
/// double-inserts.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "customer_invoice_lines")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub invoice_id: Uuid,
    pub product_id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub quantity: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub unit_price: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub line_total: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::customer_invoice::Entity",
        from = "Column::InvoiceId",
        to = "super::customer_invoice::Column::Id"
    )]
    Invoice,
}

impl Related<super::customer_invoice::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Invoice.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
