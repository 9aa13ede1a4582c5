mod common;

use assert_matches::assert_matches;
use chrono::NaiveDate;
use common::{create_customer, create_product, create_supplier, receive_stock, TestApp};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use stockflow_api::entities::journal_line::JournalSide;
use stockflow_api::entities::stock_movement::MovementType;
use stockflow_api::errors::ServiceError;
use stockflow_api::services::reservations::{CreateSalesOrderInput, OrderLineInput};
use uuid::Uuid;

fn mfg(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

struct ShippedOrder {
    order_id: Uuid,
    delivery_note_id: Uuid,
    product: Uuid,
    warehouse: Uuid,
}

/// Two batches (older of 5, newer of 10), one approved order of 8, shipped.
async fn ship_split_order(app: &TestApp) -> ShippedOrder {
    let warehouse = Uuid::new_v4();
    let supplier = create_supplier(app, "Acme Supply").await;
    let customer = create_customer(app, "Globex").await;
    let product = create_product(app, "SKU-0200").await;
    receive_stock(app, supplier, product, warehouse, dec!(5), "OLD-LOT", mfg(2024, 1, 1)).await;
    receive_stock(app, supplier, product, warehouse, dec!(10), "NEW-LOT", mfg(2024, 6, 1)).await;

    let order = app
        .state
        .services
        .sales_orders
        .create_order(CreateSalesOrderInput {
            customer_id: customer,
            warehouse_id: warehouse,
            lines: vec![OrderLineInput {
                product_id: product,
                quantity: dec!(8),
                unit_price: dec!(12.5),
            }],
        })
        .await
        .unwrap();
    app.state.services.sales_orders.approve_order(order.id).await.unwrap();

    let note = app.state.services.fulfillment.ship_order(order.id).await.unwrap();
    ShippedOrder {
        order_id: order.id,
        delivery_note_id: note.id,
        product,
        warehouse,
    }
}

#[tokio::test]
async fn shipping_picks_oldest_batches_first_and_splits() {
    let app = TestApp::new().await;
    let shipped = ship_split_order(&app).await;

    let (note, lines) = app
        .state
        .services
        .fulfillment
        .get_delivery(shipped.delivery_note_id)
        .await
        .unwrap();
    assert_eq!(note.sales_order_id, shipped.order_id);
    assert_eq!(lines.len(), 2, "8 units across batches of 5 and 10 must split");

    let mut quantities: Vec<Decimal> = lines.iter().map(|l| l.quantity).collect();
    quantities.sort();
    assert_eq!(quantities, vec![dec!(3), dec!(5)]);

    let item = app
        .state
        .services
        .stock
        .get_stock_item(shipped.product, shipped.warehouse)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(item.quantity_on_hand, dec!(7));
    assert_eq!(item.reserved_quantity, dec!(0));

    let outbound: Vec<_> = app
        .state
        .services
        .stock
        .movements_for_product(shipped.product, shipped.warehouse)
        .await
        .unwrap()
        .into_iter()
        .filter(|m| m.movement_type == MovementType::Outbound)
        .collect();
    assert_eq!(outbound.len(), 2);
    assert!(outbound.iter().all(|m| m.reference_id == Some(note.id)));

    let (order, _) = app.state.services.sales_orders.get_order(shipped.order_id).await.unwrap();
    assert_eq!(order.status, "SHIPPED");
}

#[tokio::test]
async fn shipping_fails_shut_when_batches_cannot_cover_the_order() {
    use sea_orm::sea_query::Expr;
    use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
    use stockflow_api::entities::batch;

    let app = TestApp::new().await;
    let warehouse = Uuid::new_v4();
    let supplier = create_supplier(&app, "Acme Supply").await;
    let customer = create_customer(&app, "Globex").await;
    let product = create_product(&app, "SKU-0201").await;
    receive_stock(&app, supplier, product, warehouse, dec!(10), "LOT-1", mfg(2024, 1, 1)).await;

    let order = app
        .state
        .services
        .sales_orders
        .create_order(CreateSalesOrderInput {
            customer_id: customer,
            warehouse_id: warehouse,
            lines: vec![OrderLineInput {
                product_id: product,
                quantity: dec!(6),
                unit_price: dec!(10),
            }],
        })
        .await
        .unwrap();
    app.state.services.sales_orders.approve_order(order.id).await.unwrap();

    // Simulate batch drift: the lot is drained behind the ledger's back.
    batch::Entity::update_many()
        .col_expr(batch::Column::AvailableQuantity, Expr::value(dec!(2)))
        .filter(batch::Column::ProductId.eq(product))
        .exec(app.state.db.as_ref())
        .await
        .unwrap();

    let err = app.state.services.fulfillment.ship_order(order.id).await.unwrap_err();
    assert_matches!(err, ServiceError::InsufficientStock(_));

    // The whole shipment rolled back: order still APPROVED, ledger intact,
    // nothing drawn from the batch.
    let (after, _) = app.state.services.sales_orders.get_order(order.id).await.unwrap();
    assert_eq!(after.status, "APPROVED");

    let item = app
        .state
        .services
        .stock
        .get_stock_item(product, warehouse)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(item.quantity_on_hand, dec!(10));
    assert_eq!(item.reserved_quantity, dec!(6));

    let lot = batch::Entity::find()
        .filter(batch::Column::ProductId.eq(product))
        .one(app.state.db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(lot.available_quantity, dec!(2));
}

#[tokio::test]
async fn shipping_a_draft_order_is_rejected() {
    let app = TestApp::new().await;
    let warehouse = Uuid::new_v4();
    let supplier = create_supplier(&app, "Acme Supply").await;
    let customer = create_customer(&app, "Globex").await;
    let product = create_product(&app, "SKU-0202").await;
    receive_stock(&app, supplier, product, warehouse, dec!(10), "LOT-1", mfg(2024, 1, 1)).await;

    let order = app
        .state
        .services
        .sales_orders
        .create_order(CreateSalesOrderInput {
            customer_id: customer,
            warehouse_id: warehouse,
            lines: vec![OrderLineInput {
                product_id: product,
                quantity: dec!(2),
                unit_price: dec!(10),
            }],
        })
        .await
        .unwrap();

    let err = app.state.services.fulfillment.ship_order(order.id).await.unwrap_err();
    assert_matches!(err, ServiceError::InvalidTransition(_));
}

#[tokio::test]
async fn invoicing_a_delivery_posts_a_balanced_journal_entry() {
    let app = TestApp::new().await;
    let shipped = ship_split_order(&app).await;

    let invoice = app
        .state
        .services
        .billing
        .invoice_delivery(shipped.delivery_note_id)
        .await
        .unwrap();
    assert_eq!(invoice.status, "POSTED");
    assert_eq!(invoice.total_amount, dec!(100)); // 8 * 12.5
    assert_eq!(invoice.sales_order_id, shipped.order_id);

    let (_, inv_lines) = app.state.services.billing.get_invoice(invoice.id).await.unwrap();
    assert_eq!(inv_lines.len(), 1, "batch split collapses to one line per product");
    assert_eq!(inv_lines[0].quantity, dec!(8));
    assert_eq!(inv_lines[0].line_total, dec!(100));

    let (entry, journal_lines) = app
        .state
        .services
        .billing
        .journal_entry_for(invoice.id)
        .await
        .unwrap();
    assert_eq!(entry.source_type, "SALES");
    assert_eq!(journal_lines.len(), 2);

    let debits: Decimal = journal_lines
        .iter()
        .filter(|l| l.side == JournalSide::Debit)
        .map(|l| l.amount)
        .sum();
    let credits: Decimal = journal_lines
        .iter()
        .filter(|l| l.side == JournalSide::Credit)
        .map(|l| l.amount)
        .sum();
    assert_eq!(debits, dec!(100));
    assert_eq!(credits, dec!(100));

    let signed: Decimal = journal_lines.iter().map(|l| l.signed_amount()).sum();
    assert_eq!(signed, Decimal::ZERO);
}

#[tokio::test]
async fn invoicing_the_same_delivery_twice_returns_the_original() {
    let app = TestApp::new().await;
    let shipped = ship_split_order(&app).await;

    let first = app
        .state
        .services
        .billing
        .invoice_delivery(shipped.delivery_note_id)
        .await
        .unwrap();
    let second = app
        .state
        .services
        .billing
        .invoice_delivery(shipped.delivery_note_id)
        .await
        .unwrap();
    assert_eq!(first.id, second.id);
    assert_eq!(first.invoice_number, second.invoice_number);

    let (_, lines) = app.state.services.billing.get_invoice(first.id).await.unwrap();
    assert_eq!(lines.len(), 1, "replay must not duplicate invoice lines");
}

#[tokio::test]
async fn shipped_orders_can_be_closed() {
    let app = TestApp::new().await;
    let shipped = ship_split_order(&app).await;

    let closed = app
        .state
        .services
        .fulfillment
        .close_order(shipped.order_id)
        .await
        .unwrap();
    assert_eq!(closed.status, "CLOSED");

    let err = app
        .state
        .services
        .fulfillment
        .close_order(shipped.order_id)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidTransition(_));
}
