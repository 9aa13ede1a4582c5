//! Customers and suppliers.

use crate::entities::party;
use crate::entities::party::PartyType;
use crate::errors::ServiceError;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePartyInput {
    #[validate(length(min = 1, message = "party name must not be empty"))]
    pub name: String,
    pub party_type: PartyType,
    #[validate(email)]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub billing_address: Option<String>,
}

#[derive(Clone)]
pub struct PartyService {
    db: Arc<DatabaseConnection>,
}

impl PartyService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_party(&self, input: CreatePartyInput) -> Result<party::Model, ServiceError> {
        input
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let row = party::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            party_type: Set(input.party_type),
            email: Set(input.email),
            phone: Set(input.phone),
            billing_address: Set(input.billing_address),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        };
        Ok(row.insert(self.db.as_ref()).await?)
    }

    #[instrument(skip(self))]
    pub async fn get_party(&self, party_id: Uuid) -> Result<party::Model, ServiceError> {
        party::Entity::find_by_id(party_id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("party {}", party_id)))
    }

    #[instrument(skip(self))]
    pub async fn list_customers(&self) -> Result<Vec<party::Model>, ServiceError> {
        let rows = party::Entity::find()
            .filter(
                party::Column::PartyType
                    .eq(PartyType::Customer)
                    .or(party::Column::PartyType.eq(PartyType::Both)),
            )
            .all(self.db.as_ref())
            .await?;
        Ok(rows)
    }

    #[instrument(skip(self))]
    pub async fn list_suppliers(&self) -> Result<Vec<party::Model>, ServiceError> {
        let rows = party::Entity::find()
            .filter(
                party::Column::PartyType
                    .eq(PartyType::Supplier)
                    .or(party::Column::PartyType.eq(PartyType::Both)),
            )
            .all(self.db.as_ref())
            .await?;
        Ok(rows)
    }

    /// Updates contact details; the party's identity and type are fixed.
    #[instrument(skip(self))]
    pub async fn update_contact(
        &self,
        party_id: Uuid,
        email: Option<String>,
        phone: Option<String>,
        billing_address: Option<String>,
    ) -> Result<party::Model, ServiceError> {
        let existing = self.get_party(party_id).await?;
        let mut active: party::ActiveModel = existing.into();
        active.email = Set(email);
        active.phone = Set(phone);
        active.billing_address = Set(billing_address);
        active.updated_at = Set(Some(Utc::now()));
        Ok(active.update(self.db.as_ref()).await?)
    }
}

pub async fn find_party<C: ConnectionTrait>(
    conn: &C,
    party_id: Uuid,
) -> Result<party::Model, ServiceError> {
    party::Entity::find_by_id(party_id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::not_found(format!("party {}", party_id)))
}
