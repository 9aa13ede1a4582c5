//! Stock ledger.
//!
//! All quantity mutations are single conditional UPDATE statements, so two
//! transactions racing for the same (product, warehouse) row cannot both
//! succeed past the available quantity. A statement that matches zero rows
//! means the guard failed and the caller's transaction must roll back.

use crate::entities::{stock_item, stock_movement};
use crate::entities::stock_movement::MovementType;
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set, TransactionTrait,
};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

#[derive(Clone)]
pub struct StockLedgerService {
    db: Arc<DatabaseConnection>,
    events: EventSender,
}

impl StockLedgerService {
    pub fn new(db: Arc<DatabaseConnection>, events: EventSender) -> Self {
        Self { db, events }
    }

    /// Reserves stock for an order in its own transaction.
    ///
    /// Most callers reserve inside a larger transaction via [`reserve`];
    /// this entry point exists for direct ledger manipulation and for
    /// exercising the reservation guard under concurrency.
    #[instrument(skip(self))]
    pub async fn try_reserve(
        &self,
        product_id: Uuid,
        warehouse_id: Uuid,
        quantity: Decimal,
        order_id: Uuid,
    ) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;
        reserve(&txn, product_id, warehouse_id, quantity).await?;
        txn.commit().await?;

        self.events
            .send_or_log(Event::StockReserved {
                product_id,
                warehouse_id,
                quantity,
                order_id,
            })
            .await;
        Ok(())
    }

    /// Manual correction of on-hand stock, e.g. after a stocktake.
    ///
    /// The delta may be negative but can never push on-hand below the
    /// currently reserved quantity.
    #[instrument(skip(self))]
    pub async fn adjust_stock(
        &self,
        product_id: Uuid,
        warehouse_id: Uuid,
        delta: Decimal,
        reason: Option<String>,
    ) -> Result<(), ServiceError> {
        if delta == Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "adjustment delta must be non-zero".into(),
            ));
        }

        let txn = self.db.begin().await?;
        adjust(&txn, product_id, warehouse_id, delta).await?;
        record_movement(
            &txn,
            MovementType::Adjustment,
            product_id,
            warehouse_id,
            delta,
            None,
            None,
            reason.clone(),
        )
        .await?;
        txn.commit().await?;

        info!(%product_id, %warehouse_id, %delta, "Stock adjusted");
        self.events
            .send_or_log(Event::StockAdjusted {
                product_id,
                warehouse_id,
                quantity_change: delta,
                reason,
            })
            .await;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get_stock_item(
        &self,
        product_id: Uuid,
        warehouse_id: Uuid,
    ) -> Result<Option<stock_item::Model>, ServiceError> {
        find_item(self.db.as_ref(), product_id, warehouse_id).await
    }

    /// On-hand minus reserved; zero when no ledger row exists yet.
    #[instrument(skip(self))]
    pub async fn available_quantity(
        &self,
        product_id: Uuid,
        warehouse_id: Uuid,
    ) -> Result<Decimal, ServiceError> {
        let item = find_item(self.db.as_ref(), product_id, warehouse_id).await?;
        Ok(item.map(|i| i.available()).unwrap_or(Decimal::ZERO))
    }

    #[instrument(skip(self))]
    pub async fn movements_for_product(
        &self,
        product_id: Uuid,
        warehouse_id: Uuid,
    ) -> Result<Vec<stock_movement::Model>, ServiceError> {
        let rows = stock_movement::Entity::find()
            .filter(stock_movement::Column::ProductId.eq(product_id))
            .filter(stock_movement::Column::WarehouseId.eq(warehouse_id))
            .all(self.db.as_ref())
            .await?;
        Ok(rows)
    }
}

pub async fn find_item<C: ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
    warehouse_id: Uuid,
) -> Result<Option<stock_item::Model>, ServiceError> {
    let item = stock_item::Entity::find()
        .filter(stock_item::Column::ProductId.eq(product_id))
        .filter(stock_item::Column::WarehouseId.eq(warehouse_id))
        .one(conn)
        .await?;
    Ok(item)
}

/// Increases on-hand stock, creating the ledger row on first receipt.
pub async fn receive<C: ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
    warehouse_id: Uuid,
    quantity: Decimal,
) -> Result<(), ServiceError> {
    if quantity <= Decimal::ZERO {
        return Err(ServiceError::ValidationError(
            "received quantity must be positive".into(),
        ));
    }

    let res = stock_item::Entity::update_many()
        .col_expr(
            stock_item::Column::QuantityOnHand,
            Expr::col(stock_item::Column::QuantityOnHand).add(quantity),
        )
        .col_expr(stock_item::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(stock_item::Column::ProductId.eq(product_id))
        .filter(stock_item::Column::WarehouseId.eq(warehouse_id))
        .exec(conn)
        .await?;

    if res.rows_affected == 0 {
        let row = stock_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            product_id: Set(product_id),
            warehouse_id: Set(warehouse_id),
            quantity_on_hand: Set(quantity),
            reserved_quantity: Set(Decimal::ZERO),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        };
        row.insert(conn).await?;
    }
    Ok(())
}

/// Reserves `quantity` against free stock.
///
/// The guard `reserved + quantity <= on_hand` is evaluated inside the
/// UPDATE itself; a zero row count means there was not enough free stock
/// at execution time.
pub async fn reserve<C: ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
    warehouse_id: Uuid,
    quantity: Decimal,
) -> Result<(), ServiceError> {
    if quantity <= Decimal::ZERO {
        return Err(ServiceError::ValidationError(
            "reserved quantity must be positive".into(),
        ));
    }

    let res = stock_item::Entity::update_many()
        .col_expr(
            stock_item::Column::ReservedQuantity,
            Expr::col(stock_item::Column::ReservedQuantity).add(quantity),
        )
        .col_expr(stock_item::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(stock_item::Column::ProductId.eq(product_id))
        .filter(stock_item::Column::WarehouseId.eq(warehouse_id))
        .filter(
            Expr::expr(Expr::col(stock_item::Column::ReservedQuantity).add(quantity))
                .lte(Expr::col(stock_item::Column::QuantityOnHand)),
        )
        .exec(conn)
        .await?;

    if res.rows_affected == 0 {
        return Err(ServiceError::InsufficientStock(format!(
            "cannot reserve {} of product {} in warehouse {}",
            quantity, product_id, warehouse_id
        )));
    }
    Ok(())
}

/// Returns previously reserved stock to the free pool.
pub async fn release<C: ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
    warehouse_id: Uuid,
    quantity: Decimal,
) -> Result<(), ServiceError> {
    if quantity <= Decimal::ZERO {
        return Err(ServiceError::ValidationError(
            "released quantity must be positive".into(),
        ));
    }

    let res = stock_item::Entity::update_many()
        .col_expr(
            stock_item::Column::ReservedQuantity,
            Expr::col(stock_item::Column::ReservedQuantity).sub(quantity),
        )
        .col_expr(stock_item::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(stock_item::Column::ProductId.eq(product_id))
        .filter(stock_item::Column::WarehouseId.eq(warehouse_id))
        .filter(stock_item::Column::ReservedQuantity.gte(quantity))
        .exec(conn)
        .await?;

    if res.rows_affected == 0 {
        return Err(ServiceError::InvalidOperation(format!(
            "cannot release {} of product {}: not that much is reserved",
            quantity, product_id
        )));
    }
    Ok(())
}

/// Consumes reserved stock on shipment: both on-hand and reserved drop
/// by `quantity`.
pub async fn ship<C: ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
    warehouse_id: Uuid,
    quantity: Decimal,
) -> Result<(), ServiceError> {
    if quantity <= Decimal::ZERO {
        return Err(ServiceError::ValidationError(
            "shipped quantity must be positive".into(),
        ));
    }

    // reserved >= quantity implies on_hand >= quantity because
    // reserved <= on_hand is maintained by every other mutation.
    let res = stock_item::Entity::update_many()
        .col_expr(
            stock_item::Column::QuantityOnHand,
            Expr::col(stock_item::Column::QuantityOnHand).sub(quantity),
        )
        .col_expr(
            stock_item::Column::ReservedQuantity,
            Expr::col(stock_item::Column::ReservedQuantity).sub(quantity),
        )
        .col_expr(stock_item::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(stock_item::Column::ProductId.eq(product_id))
        .filter(stock_item::Column::WarehouseId.eq(warehouse_id))
        .filter(stock_item::Column::ReservedQuantity.gte(quantity))
        .exec(conn)
        .await?;

    // A shipment only consumes stock its reservation already covers, so a
    // missed update means the ledger itself is inconsistent.
    if res.rows_affected == 0 {
        return Err(ServiceError::InternalError(format!(
            "ledger inconsistency: product {} in warehouse {} has less than {} reserved at shipment",
            product_id, warehouse_id, quantity
        )));
    }
    Ok(())
}

/// Applies a signed on-hand correction, bounded below by the reserved
/// quantity.
pub async fn adjust<C: ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
    warehouse_id: Uuid,
    delta: Decimal,
) -> Result<(), ServiceError> {
    let res = stock_item::Entity::update_many()
        .col_expr(
            stock_item::Column::QuantityOnHand,
            Expr::col(stock_item::Column::QuantityOnHand).add(delta),
        )
        .col_expr(stock_item::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(stock_item::Column::ProductId.eq(product_id))
        .filter(stock_item::Column::WarehouseId.eq(warehouse_id))
        .filter(
            Expr::expr(Expr::col(stock_item::Column::QuantityOnHand).add(delta))
                .gte(Expr::col(stock_item::Column::ReservedQuantity)),
        )
        .exec(conn)
        .await?;

    if res.rows_affected == 0 {
        return Err(ServiceError::InsufficientStock(format!(
            "adjustment of {} for product {} would drop on-hand below the reserved quantity",
            delta, product_id
        )));
    }
    Ok(())
}

/// Appends one movement row to the audit trail.
#[allow(clippy::too_many_arguments)]
pub async fn record_movement<C: ConnectionTrait>(
    conn: &C,
    movement_type: MovementType,
    product_id: Uuid,
    warehouse_id: Uuid,
    quantity: Decimal,
    batch_id: Option<Uuid>,
    reference_id: Option<Uuid>,
    reference_type: Option<String>,
) -> Result<stock_movement::Model, ServiceError> {
    let row = stock_movement::ActiveModel {
        id: Set(Uuid::new_v4()),
        movement_type: Set(movement_type),
        product_id: Set(product_id),
        warehouse_id: Set(warehouse_id),
        quantity: Set(quantity),
        batch_id: Set(batch_id),
        reference_id: Set(reference_id),
        reference_type: Set(reference_type),
        occurred_at: Set(Utc::now()),
    };
    Ok(row.insert(conn).await?)
}
