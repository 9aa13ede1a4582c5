//! Purchase orders.

use crate::entities::{purchase_order, purchase_order_line};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::{generate_document_number, parties, products};
use crate::state_machine::{validate_transition, OrderEntityKind, PurchaseOrderStatus};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseLineInput {
    pub product_id: Uuid,
    pub quantity: Decimal,
    pub unit_price: Decimal,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePurchaseOrderInput {
    pub supplier_id: Uuid,
    #[validate(length(min = 1, message = "a purchase order needs at least one line"))]
    pub lines: Vec<PurchaseLineInput>,
}

#[derive(Clone)]
pub struct PurchaseOrderService {
    db: Arc<DatabaseConnection>,
    events: EventSender,
}

impl PurchaseOrderService {
    pub fn new(db: Arc<DatabaseConnection>, events: EventSender) -> Self {
        Self { db, events }
    }

    #[instrument(skip(self, input), fields(supplier_id = %input.supplier_id))]
    pub async fn create_order(
        &self,
        input: CreatePurchaseOrderInput,
    ) -> Result<purchase_order::Model, ServiceError> {
        input
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;
        for line in &input.lines {
            if line.quantity <= Decimal::ZERO {
                return Err(ServiceError::ValidationError(format!(
                    "quantity for product {} must be positive",
                    line.product_id
                )));
            }
        }

        let txn = self.db.begin().await?;

        let supplier = parties::find_party(&txn, input.supplier_id).await?;
        if !supplier.is_supplier() {
            return Err(ServiceError::ValidationError(format!(
                "party {} is not a supplier",
                supplier.id
            )));
        }
        for line in &input.lines {
            products::find_product(&txn, line.product_id).await?;
        }

        let order_id = Uuid::new_v4();
        let total: Decimal = input.lines.iter().map(|l| l.quantity * l.unit_price).sum();
        let order = purchase_order::ActiveModel {
            id: Set(order_id),
            order_number: Set(generate_document_number("PO")),
            supplier_id: Set(input.supplier_id),
            status: Set(PurchaseOrderStatus::Draft.to_string()),
            order_date: Set(Utc::now()),
            total_amount: Set(total),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        };
        let order = order.insert(&txn).await?;

        for line in &input.lines {
            let row = purchase_order_line::ActiveModel {
                id: Set(Uuid::new_v4()),
                purchase_order_id: Set(order_id),
                product_id: Set(line.product_id),
                quantity: Set(line.quantity),
                unit_price: Set(line.unit_price),
                line_total: Set(line.quantity * line.unit_price),
                created_at: Set(Utc::now()),
            };
            row.insert(&txn).await?;
        }

        txn.commit().await?;
        info!(order_id = %order.id, order_number = %order.order_number, "Purchase order created");

        self.events.send_or_log(Event::PurchaseOrderCreated(order.id)).await;
        Ok(order)
    }

    /// DRAFT -> SUBMITTED; the order becomes receivable.
    #[instrument(skip(self))]
    pub async fn submit_order(
        &self,
        order_id: Uuid,
    ) -> Result<purchase_order::Model, ServiceError> {
        let order = self
            .transition_order(order_id, PurchaseOrderStatus::Submitted)
            .await?;
        self.events.send_or_log(Event::PurchaseOrderSubmitted(order_id)).await;
        Ok(order)
    }

    #[instrument(skip(self))]
    pub async fn cancel_order(
        &self,
        order_id: Uuid,
    ) -> Result<purchase_order::Model, ServiceError> {
        let order = self
            .transition_order(order_id, PurchaseOrderStatus::Cancelled)
            .await?;
        self.events.send_or_log(Event::PurchaseOrderCancelled(order_id)).await;
        Ok(order)
    }

    #[instrument(skip(self))]
    pub async fn get_order(
        &self,
        order_id: Uuid,
    ) -> Result<(purchase_order::Model, Vec<purchase_order_line::Model>), ServiceError> {
        let order = find_order(self.db.as_ref(), order_id).await?;
        let lines = purchase_order_line::Entity::find()
            .filter(purchase_order_line::Column::PurchaseOrderId.eq(order_id))
            .all(self.db.as_ref())
            .await?;
        Ok((order, lines))
    }

    async fn transition_order(
        &self,
        order_id: Uuid,
        next: PurchaseOrderStatus,
    ) -> Result<purchase_order::Model, ServiceError> {
        let txn = self.db.begin().await?;

        let order = find_order(&txn, order_id).await?;
        validate_transition(OrderEntityKind::PurchaseOrder, &order.status, &next.to_string())?;

        let mut active: purchase_order::ActiveModel = order.into();
        active.status = Set(next.to_string());
        active.updated_at = Set(Some(Utc::now()));
        let order = active.update(&txn).await?;

        txn.commit().await?;
        info!(%order_id, status = %next, "Purchase order status changed");
        Ok(order)
    }
}

pub async fn find_order<C: ConnectionTrait>(
    conn: &C,
    order_id: Uuid,
) -> Result<purchase_order::Model, ServiceError> {
    purchase_order::Entity::find_by_id(order_id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::not_found(format!("purchase order {}", order_id)))
}
