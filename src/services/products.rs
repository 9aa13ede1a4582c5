//! Product catalog.

use crate::audit::{guarded_delete_by_id, EntityTag};
use crate::entities::{product, stock_item};
use crate::errors::ServiceError;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateProductInput {
    #[validate(length(min = 1, message = "sku must not be empty"))]
    pub sku: String,
    #[validate(length(min = 1, message = "product name must not be empty"))]
    pub name: String,
    pub unit_of_measure: String,
    pub category: Option<String>,
}

#[derive(Clone)]
pub struct ProductService {
    db: Arc<DatabaseConnection>,
}

impl ProductService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self, input), fields(sku = %input.sku))]
    pub async fn create_product(
        &self,
        input: CreateProductInput,
    ) -> Result<product::Model, ServiceError> {
        input
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let row = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            sku: Set(input.sku),
            name: Set(input.name),
            unit_of_measure: Set(input.unit_of_measure),
            category: Set(input.category),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        };
        Ok(row.insert(self.db.as_ref()).await?)
    }

    #[instrument(skip(self))]
    pub async fn get_product(&self, product_id: Uuid) -> Result<product::Model, ServiceError> {
        product::Entity::find_by_id(product_id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("product {}", product_id)))
    }

    #[instrument(skip(self))]
    pub async fn get_by_sku(&self, sku: &str) -> Result<product::Model, ServiceError> {
        product::Entity::find()
            .filter(product::Column::Sku.eq(sku))
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("product with sku {}", sku)))
    }

    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<product::Model>, ServiceError> {
        Ok(product::Entity::find().all(self.db.as_ref()).await?)
    }

    #[instrument(skip(self))]
    pub async fn rename_product(
        &self,
        product_id: Uuid,
        name: String,
        category: Option<String>,
    ) -> Result<product::Model, ServiceError> {
        let existing = self.get_product(product_id).await?;
        let mut active: product::ActiveModel = existing.into();
        active.name = Set(name);
        active.category = Set(category);
        active.updated_at = Set(Some(Utc::now()));
        Ok(active.update(self.db.as_ref()).await?)
    }

    /// Removes a product that was never stocked. Products with ledger rows
    /// stay forever; the movement history references them.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, product_id: Uuid) -> Result<(), ServiceError> {
        let stocked = stock_item::Entity::find()
            .filter(stock_item::Column::ProductId.eq(product_id))
            .one(self.db.as_ref())
            .await?;
        if stocked.is_some() {
            return Err(ServiceError::InvalidOperation(format!(
                "product {} has stock history and cannot be deleted",
                product_id
            )));
        }

        let deleted = guarded_delete_by_id::<product::Entity, _>(
            self.db.as_ref(),
            EntityTag::Product,
            product_id,
        )
        .await?;
        if deleted == 0 {
            return Err(ServiceError::not_found(format!("product {}", product_id)));
        }
        info!(%product_id, "Product deleted");
        Ok(())
    }
}

pub async fn find_product<C: ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
) -> Result<product::Model, ServiceError> {
    product::Entity::find_by_id(product_id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::not_found(format!("product {}", product_id)))
}
