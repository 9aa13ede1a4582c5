use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One received item on a GRN, linking the batch it created and optionally
/// the purchase-order line it satisfies.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "grn_lines")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub grn_id: Uuid,
    pub product_id: Uuid,
    pub batch_id: Uuid,
    pub purchase_order_line_id: Option<Uuid>,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub quantity: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::grn_header::Entity",
        from = "Column::GrnId",
        to = "super::grn_header::Column::Id"
    )]
    Header,
    #[sea_orm(
        belongs_to = "super::batch::Entity",
        from = "Column::BatchId",
        to = "super::batch::Column::Id"
    )]
    Batch,
}

impl Related<super::grn_header::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Header.def()
    }
}

impl Related<super::batch::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Batch.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
