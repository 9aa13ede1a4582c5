//! Sales orders and stock reservation.
//!
//! Creating an order reserves stock for every line inside the same
//! transaction; if any line cannot be covered the whole order rolls back
//! and nothing stays reserved.

use crate::entities::{sales_order, sales_order_line};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::{generate_document_number, parties, products, stock};
use crate::state_machine::{validate_transition, OrderEntityKind, SalesOrderStatus};
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
pub struct OrderLineInput {
    pub product_id: Uuid,
    pub quantity: Decimal,
    pub unit_price: Decimal,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateSalesOrderInput {
    pub customer_id: Uuid,
    pub warehouse_id: Uuid,
    #[validate(length(min = 1, message = "an order needs at least one line"))]
    pub lines: Vec<OrderLineInput>,
}

#[derive(Clone)]
pub struct SalesOrderService {
    db: Arc<DatabaseConnection>,
    events: EventSender,
}

impl SalesOrderService {
    pub fn new(db: Arc<DatabaseConnection>, events: EventSender) -> Self {
        Self { db, events }
    }

    /// Creates a DRAFT order and reserves stock for all of its lines
    /// atomically.
    #[instrument(skip(self, input), fields(customer_id = %input.customer_id))]
    pub async fn create_order(
        &self,
        input: CreateSalesOrderInput,
    ) -> Result<sales_order::Model, ServiceError> {
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
            if line.unit_price < Decimal::ZERO {
                return Err(ServiceError::ValidationError(format!(
                    "unit price for product {} must not be negative",
                    line.product_id
                )));
            }
        }

        let txn = self.db.begin().await?;

        let customer = parties::find_party(&txn, input.customer_id).await?;
        if !customer.is_customer() {
            return Err(ServiceError::ValidationError(format!(
                "party {} is not a customer",
                customer.id
            )));
        }
        for line in &input.lines {
            products::find_product(&txn, line.product_id).await?;
        }

        let order_id = Uuid::new_v4();
        let total: Decimal = input.lines.iter().map(|l| l.quantity * l.unit_price).sum();
        let order = sales_order::ActiveModel {
            id: Set(order_id),
            order_number: Set(generate_document_number("SO")),
            customer_id: Set(input.customer_id),
            warehouse_id: Set(input.warehouse_id),
            status: Set(SalesOrderStatus::Draft.to_string()),
            order_date: Set(Utc::now()),
            total_amount: Set(total),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        };
        let order = order.insert(&txn).await?;

        for line in &input.lines {
            let row = sales_order_line::ActiveModel {
                id: Set(Uuid::new_v4()),
                sales_order_id: Set(order_id),
                product_id: Set(line.product_id),
                quantity: Set(line.quantity),
                unit_price: Set(line.unit_price),
                line_total: Set(line.quantity * line.unit_price),
                created_at: Set(Utc::now()),
            };
            row.insert(&txn).await?;

            // Fails the whole order when any line cannot be covered.
            stock::reserve(&txn, line.product_id, input.warehouse_id, line.quantity).await?;
        }

        txn.commit().await?;
        info!(order_id = %order.id, order_number = %order.order_number, "Sales order created");

        self.events
            .send_or_log(Event::SalesOrderCreated {
                order_id: order.id,
                customer_id: order.customer_id,
            })
            .await;
        for line in &input.lines {
            self.events
                .send_or_log(Event::StockReserved {
                    product_id: line.product_id,
                    warehouse_id: input.warehouse_id,
                    quantity: line.quantity,
                    order_id: order.id,
                })
                .await;
        }
        Ok(order)
    }

    #[instrument(skip(self))]
    pub async fn approve_order(&self, order_id: Uuid) -> Result<sales_order::Model, ServiceError> {
        let order = self
            .transition_order(order_id, SalesOrderStatus::Approved)
            .await?;
        self.events.send_or_log(Event::SalesOrderApproved(order_id)).await;
        Ok(order)
    }

    /// Cancels a DRAFT order and releases every reservation it holds.
    #[instrument(skip(self))]
    pub async fn cancel_order(&self, order_id: Uuid) -> Result<sales_order::Model, ServiceError> {
        let txn = self.db.begin().await?;

        let order = find_order(&txn, order_id).await?;
        validate_transition(
            OrderEntityKind::SalesOrder,
            &order.status,
            &SalesOrderStatus::Cancelled.to_string(),
        )?;

        let lines = sales_order_line::Entity::find()
            .filter(sales_order_line::Column::SalesOrderId.eq(order_id))
            .all(&txn)
            .await?;
        for line in &lines {
            stock::release(&txn, line.product_id, order.warehouse_id, line.quantity).await?;
        }

        let mut active: sales_order::ActiveModel = order.into();
        active.status = Set(SalesOrderStatus::Cancelled.to_string());
        active.updated_at = Set(Some(Utc::now()));
        let order = active.update(&txn).await?;

        txn.commit().await?;
        info!(%order_id, "Sales order cancelled, reservations released");

        self.events.send_or_log(Event::SalesOrderCancelled(order_id)).await;
        Ok(order)
    }

    #[instrument(skip(self))]
    pub async fn get_order(
        &self,
        order_id: Uuid,
    ) -> Result<(sales_order::Model, Vec<sales_order_line::Model>), ServiceError> {
        let order = find_order(self.db.as_ref(), order_id).await?;
        let lines = sales_order_line::Entity::find()
            .filter(sales_order_line::Column::SalesOrderId.eq(order_id))
            .all(self.db.as_ref())
            .await?;
        Ok((order, lines))
    }

    async fn transition_order(
        &self,
        order_id: Uuid,
        next: SalesOrderStatus,
    ) -> Result<sales_order::Model, ServiceError> {
        let txn = self.db.begin().await?;

        let order = find_order(&txn, order_id).await?;
        validate_transition(OrderEntityKind::SalesOrder, &order.status, &next.to_string())?;

        let mut active: sales_order::ActiveModel = order.into();
        active.status = Set(next.to_string());
        active.updated_at = Set(Some(Utc::now()));
        let order = active.update(&txn).await?;

        txn.commit().await?;
        info!(%order_id, status = %next, "Sales order status changed");
        Ok(order)
    }
}

pub async fn find_order<C: ConnectionTrait>(
    conn: &C,
    order_id: Uuid,
) -> Result<sales_order::Model, ServiceError> {
    sales_order::Entity::find_by_id(order_id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::not_found(format!("sales order {}", order_id)))
}
