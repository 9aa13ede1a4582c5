//! Fulfillment: shipping approved sales orders.
//!
//! Picking is oldest-manufacture-date-first and may split one order line
//! across several batches. Batch decrements are conditional updates, so a
//! batch drained by a concurrent shipment fails this transaction instead of
//! going negative.

use crate::entities::{batch, delivery_note, delivery_note_line, sales_order, sales_order_line};
use crate::entities::stock_movement::MovementType;
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::{generate_document_number, reservations, stock};
use crate::state_machine::{validate_transition, OrderEntityKind, SalesOrderStatus};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

#[derive(Clone)]
pub struct FulfillmentService {
    db: Arc<DatabaseConnection>,
    events: EventSender,
}

impl FulfillmentService {
    pub fn new(db: Arc<DatabaseConnection>, events: EventSender) -> Self {
        Self { db, events }
    }

    /// Ships an APPROVED order in full.
    ///
    /// Creates the delivery note, draws down batches oldest first, consumes
    /// the order's reservations and moves the order to SHIPPED. Any
    /// shortfall rolls the whole shipment back.
    #[instrument(skip(self))]
    pub async fn ship_order(
        &self,
        order_id: Uuid,
    ) -> Result<delivery_note::Model, ServiceError> {
        let txn = self.db.begin().await?;

        let order = reservations::find_order(&txn, order_id).await?;
        validate_transition(
            OrderEntityKind::SalesOrder,
            &order.status,
            &SalesOrderStatus::Shipped.to_string(),
        )?;

        let lines = sales_order_line::Entity::find()
            .filter(sales_order_line::Column::SalesOrderId.eq(order_id))
            .all(&txn)
            .await?;
        if lines.is_empty() {
            return Err(ServiceError::InvalidOperation(format!(
                "sales order {} has no lines to ship",
                order_id
            )));
        }

        let note_id = Uuid::new_v4();
        let note = delivery_note::ActiveModel {
            id: Set(note_id),
            delivery_number: Set(generate_document_number("DN")),
            sales_order_id: Set(order_id),
            warehouse_id: Set(order.warehouse_id),
            shipped_at: Set(Utc::now()),
            created_at: Set(Utc::now()),
        };
        let note = note.insert(&txn).await?;

        for line in &lines {
            pick_batches(&txn, note_id, line, order.warehouse_id).await?;
            stock::ship(&txn, line.product_id, order.warehouse_id, line.quantity).await?;
        }

        let mut active: sales_order::ActiveModel = order.into();
        active.status = Set(SalesOrderStatus::Shipped.to_string());
        active.updated_at = Set(Some(Utc::now()));
        active.update(&txn).await?;

        txn.commit().await?;
        info!(
            %order_id,
            delivery_note_id = %note.id,
            delivery_number = %note.delivery_number,
            "Sales order shipped"
        );

        self.events
            .send_or_log(Event::SalesOrderShipped {
                order_id,
                delivery_note_id: note.id,
            })
            .await;
        Ok(note)
    }

    /// APPROVED or SHIPPED -> CLOSED.
    #[instrument(skip(self))]
    pub async fn close_order(&self, order_id: Uuid) -> Result<sales_order::Model, ServiceError> {
        let txn = self.db.begin().await?;

        let order = reservations::find_order(&txn, order_id).await?;
        validate_transition(
            OrderEntityKind::SalesOrder,
            &order.status,
            &SalesOrderStatus::Closed.to_string(),
        )?;

        let mut active: sales_order::ActiveModel = order.into();
        active.status = Set(SalesOrderStatus::Closed.to_string());
        active.updated_at = Set(Some(Utc::now()));
        let order = active.update(&txn).await?;

        txn.commit().await?;
        info!(%order_id, "Sales order closed");

        self.events.send_or_log(Event::SalesOrderClosed(order_id)).await;
        Ok(order)
    }

    #[instrument(skip(self))]
    pub async fn get_delivery(
        &self,
        delivery_note_id: Uuid,
    ) -> Result<(delivery_note::Model, Vec<delivery_note_line::Model>), ServiceError> {
        let note = delivery_note::Entity::find_by_id(delivery_note_id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| {
                ServiceError::not_found(format!("delivery note {}", delivery_note_id))
            })?;
        let lines = delivery_note_line::Entity::find()
            .filter(delivery_note_line::Column::DeliveryNoteId.eq(delivery_note_id))
            .all(self.db.as_ref())
            .await?;
        Ok((note, lines))
    }
}

/// Draws one order line from batches, oldest manufacture date first.
///
/// Writes one delivery line and one OUTBOUND movement per batch touched.
async fn pick_batches<C: ConnectionTrait>(
    txn: &C,
    note_id: Uuid,
    line: &sales_order_line::Model,
    warehouse_id: Uuid,
) -> Result<(), ServiceError> {
    let candidates = batch::Entity::find()
        .filter(batch::Column::ProductId.eq(line.product_id))
        .filter(batch::Column::AvailableQuantity.gt(Decimal::ZERO))
        .order_by_asc(batch::Column::ManufactureDate)
        .order_by_asc(batch::Column::CreatedAt)
        .all(txn)
        .await?;

    let mut remaining = line.quantity;
    for candidate in candidates {
        if remaining <= Decimal::ZERO {
            break;
        }
        let take = remaining.min(candidate.available_quantity);

        let res = batch::Entity::update_many()
            .col_expr(
                batch::Column::AvailableQuantity,
                Expr::col(batch::Column::AvailableQuantity).sub(take),
            )
            .filter(batch::Column::Id.eq(candidate.id))
            .filter(batch::Column::AvailableQuantity.gte(take))
            .exec(txn)
            .await?;
        if res.rows_affected == 0 {
            // Drained by a concurrent shipment between the read and the
            // update.
            return Err(ServiceError::InsufficientStock(format!(
                "batch {} no longer covers {} of product {}",
                candidate.batch_number, take, line.product_id
            )));
        }

        let dn_line = delivery_note_line::ActiveModel {
            id: Set(Uuid::new_v4()),
            delivery_note_id: Set(note_id),
            sales_order_line_id: Set(line.id),
            product_id: Set(line.product_id),
            batch_id: Set(candidate.id),
            quantity: Set(take),
            created_at: Set(Utc::now()),
        };
        dn_line.insert(txn).await?;

        stock::record_movement(
            txn,
            MovementType::Outbound,
            line.product_id,
            warehouse_id,
            take,
            Some(candidate.id),
            Some(note_id),
            Some("DELIVERY_NOTE".to_string()),
        )
        .await?;

        remaining -= take;
    }

    if remaining > Decimal::ZERO {
        return Err(ServiceError::InsufficientStock(format!(
            "batches cover only {} of {} for product {}",
            line.quantity - remaining,
            line.quantity,
            line.product_id
        )));
    }
    Ok(())
}
