use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Double-entry bookkeeping record. Invariant: across the entry's journal
/// lines, the debit total equals the credit total.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "journal_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Business event that produced the entry (e.g. "SALES")
    pub source_type: String,
    /// The document the entry was posted from (e.g. an invoice id)
    pub source_id: Option<Uuid>,
    pub memo: Option<String>,
    pub posted_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::journal_line::Entity")]
    Lines,
}

impl Related<super::journal_line::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Lines.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
