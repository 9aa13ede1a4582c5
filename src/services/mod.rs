//! Business services.
//!
//! Each service owns one slice of the domain and runs its multi-step
//! operations inside a single database transaction. Services share the
//! connection pool and the outbound event channel; cross-service calls go
//! through the stock ledger primitives, which are generic over the caller's
//! transaction.

pub mod billing;
pub mod fulfillment;
pub mod goods_receipt;
pub mod parties;
pub mod payments;
pub mod products;
pub mod purchasing;
pub mod reservations;
pub mod stock;

pub use billing::BillingService;
pub use fulfillment::FulfillmentService;
pub use goods_receipt::GoodsReceiptService;
pub use parties::PartyService;
pub use payments::PaymentService;
pub use products::ProductService;
pub use purchasing::PurchaseOrderService;
pub use reservations::SalesOrderService;
pub use stock::StockLedgerService;

use crate::events::EventSender;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use uuid::Uuid;

/// All services wired against one pool and one event channel.
#[derive(Clone)]
pub struct AppServices {
    pub stock: StockLedgerService,
    pub sales_orders: SalesOrderService,
    pub purchase_orders: PurchaseOrderService,
    pub goods_receipts: GoodsReceiptService,
    pub fulfillment: FulfillmentService,
    pub billing: BillingService,
    pub payments: PaymentService,
    pub parties: PartyService,
    pub products: ProductService,
}

impl AppServices {
    pub fn new(db: Arc<DatabaseConnection>, events: EventSender) -> Self {
        Self {
            stock: StockLedgerService::new(db.clone(), events.clone()),
            sales_orders: SalesOrderService::new(db.clone(), events.clone()),
            purchase_orders: PurchaseOrderService::new(db.clone(), events.clone()),
            goods_receipts: GoodsReceiptService::new(db.clone(), events.clone()),
            fulfillment: FulfillmentService::new(db.clone(), events.clone()),
            billing: BillingService::new(db.clone(), events.clone()),
            payments: PaymentService::new(db.clone(), events.clone()),
            parties: PartyService::new(db.clone()),
            products: ProductService::new(db),
        }
    }
}

/// Human-readable document number, e.g. `SO-9F3A2B1C`.
///
/// Uniqueness is enforced by the document tables' unique indexes; the
/// 8-hex-digit suffix makes accidental collisions vanishingly rare within
/// a deployment's lifetime.
pub fn generate_document_number(prefix: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}-{}", prefix, suffix[..8].to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_numbers_carry_prefix_and_length() {
        let n = generate_document_number("SO");
        assert!(n.starts_with("SO-"));
        assert_eq!(n.len(), 11);
        assert!(n[3..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn document_numbers_differ() {
        assert_ne!(generate_document_number("GRN"), generate_document_number("GRN"));
    }
}
