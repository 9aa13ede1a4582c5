use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One batch draw on a delivery: a sales-order line may ship from several
/// batches, producing one row per (order line, batch).
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "delivery_note_lines")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub delivery_note_id: Uuid,
    pub sales_order_line_id: Uuid,
    pub product_id: Uuid,
    pub batch_id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub quantity: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::delivery_note::Entity",
        from = "Column::DeliveryNoteId",
        to = "super::delivery_note::Column::Id"
    )]
    DeliveryNote,
    #[sea_orm(
        belongs_to = "super::batch::Entity",
        from = "Column::BatchId",
        to = "super::batch::Column::Id"
    )]
    Batch,
}

impl Related<super::delivery_note::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DeliveryNote.def()
    }
}

impl Related<super::batch::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Batch.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
