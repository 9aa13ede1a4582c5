//! Goods receipt.
//!
//! Receiving against a purchase order is one transaction: the GRN document,
//! the new batches, the stock ledger increments, the INBOUND movements and
//! the purchase order's RECEIVED status all land together or not at all.
//! The completion event is emitted only after the commit succeeds.

use crate::entities::{batch, grn_header, grn_line};
use crate::entities::stock_movement::MovementType;
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::{generate_document_number, purchasing, stock};
use crate::state_machine::{validate_transition, OrderEntityKind, PurchaseOrderStatus};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiptItemInput {
    pub product_id: Uuid,
    pub quantity: Decimal,
    pub batch_number: String,
    pub manufacture_date: NaiveDate,
    pub expiry_date: Option<NaiveDate>,
    pub purchase_order_line_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ReceiveGoodsInput {
    pub purchase_order_id: Uuid,
    pub warehouse_id: Uuid,
    #[validate(length(min = 1, message = "a goods receipt needs at least one item"))]
    pub items: Vec<ReceiptItemInput>,
}

#[derive(Clone)]
pub struct GoodsReceiptService {
    db: Arc<DatabaseConnection>,
    events: EventSender,
}

impl GoodsReceiptService {
    pub fn new(db: Arc<DatabaseConnection>, events: EventSender) -> Self {
        Self { db, events }
    }

    /// Books a full receipt for a SUBMITTED purchase order.
    #[instrument(skip(self, input), fields(purchase_order_id = %input.purchase_order_id))]
    pub async fn receive_goods(
        &self,
        input: ReceiveGoodsInput,
    ) -> Result<grn_header::Model, ServiceError> {
        input
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;
        for item in &input.items {
            if item.quantity <= Decimal::ZERO {
                return Err(ServiceError::ValidationError(format!(
                    "received quantity for product {} must be positive",
                    item.product_id
                )));
            }
            if item.batch_number.trim().is_empty() {
                return Err(ServiceError::ValidationError(
                    "batch number must not be empty".into(),
                ));
            }
        }

        let txn = self.db.begin().await?;

        let order = purchasing::find_order(&txn, input.purchase_order_id).await?;
        validate_transition(
            OrderEntityKind::PurchaseOrder,
            &order.status,
            &PurchaseOrderStatus::Received.to_string(),
        )?;

        let grn_id = Uuid::new_v4();
        let received_at = Utc::now();
        let header = grn_header::ActiveModel {
            id: Set(grn_id),
            grn_number: Set(generate_document_number("GRN")),
            purchase_order_id: Set(order.id),
            warehouse_id: Set(input.warehouse_id),
            status: Set("COMPLETED".to_string()),
            received_at: Set(received_at),
            created_at: Set(received_at),
        };
        let header = header.insert(&txn).await?;

        for item in &input.items {
            let new_batch = batch::ActiveModel {
                id: Set(Uuid::new_v4()),
                product_id: Set(item.product_id),
                batch_number: Set(item.batch_number.clone()),
                manufacture_date: Set(item.manufacture_date),
                expiry_date: Set(item.expiry_date),
                received_quantity: Set(item.quantity),
                available_quantity: Set(item.quantity),
                created_at: Set(Utc::now()),
            };
            let new_batch = new_batch.insert(&txn).await?;

            let line = grn_line::ActiveModel {
                id: Set(Uuid::new_v4()),
                grn_id: Set(grn_id),
                product_id: Set(item.product_id),
                batch_id: Set(new_batch.id),
                purchase_order_line_id: Set(item.purchase_order_line_id),
                quantity: Set(item.quantity),
                created_at: Set(Utc::now()),
            };
            line.insert(&txn).await?;

            stock::receive(&txn, item.product_id, input.warehouse_id, item.quantity).await?;
            stock::record_movement(
                &txn,
                MovementType::Inbound,
                item.product_id,
                input.warehouse_id,
                item.quantity,
                Some(new_batch.id),
                Some(grn_id),
                Some("GRN".to_string()),
            )
            .await?;
        }

        let mut active: crate::entities::purchase_order::ActiveModel = order.into();
        active.status = Set(PurchaseOrderStatus::Received.to_string());
        active.updated_at = Set(Some(Utc::now()));
        let order = active.update(&txn).await?;

        txn.commit().await?;
        info!(
            grn_id = %header.id,
            grn_number = %header.grn_number,
            purchase_order_id = %order.id,
            "Goods receipt completed"
        );

        self.events
            .send_or_log(Event::GoodsReceiptCompleted {
                grn_id: header.id,
                purchase_order_id: order.id,
                completed_at: received_at,
            })
            .await;
        Ok(header)
    }

    #[instrument(skip(self))]
    pub async fn get_receipt(
        &self,
        grn_id: Uuid,
    ) -> Result<(grn_header::Model, Vec<grn_line::Model>), ServiceError> {
        let header = grn_header::Entity::find_by_id(grn_id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("goods receipt {}", grn_id)))?;
        let lines = grn_line::Entity::find()
            .filter(grn_line::Column::GrnId.eq(grn_id))
            .all(self.db.as_ref())
            .await?;
        Ok((header, lines))
    }
}
