use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A sellable/purchasable item. The id and sku are immutable identity;
/// name, unit and category are descriptive and may change.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub sku: String,
    pub name: String,
    pub unit_of_measure: String,
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::stock_item::Entity")]
    StockItems,
    #[sea_orm(has_many = "super::batch::Entity")]
    Batches,
}

impl Related<super::stock_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StockItems.def()
    }
}

impl Related<super::batch::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Batches.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
