//! Outbound notification channel.
//!
//! Business services emit domain events after their transaction commits.
//! Delivery is fire-and-forget: a full or closed channel is logged and never
//! fails the business operation that produced the event.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Domain events emitted by the services.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    SalesOrderCreated {
        order_id: Uuid,
        customer_id: Uuid,
    },
    SalesOrderApproved(Uuid),
    SalesOrderCancelled(Uuid),
    SalesOrderShipped {
        order_id: Uuid,
        delivery_note_id: Uuid,
    },
    SalesOrderClosed(Uuid),

    StockReserved {
        product_id: Uuid,
        warehouse_id: Uuid,
        quantity: Decimal,
        order_id: Uuid,
    },
    StockAdjusted {
        product_id: Uuid,
        warehouse_id: Uuid,
        quantity_change: Decimal,
        reason: Option<String>,
    },

    PurchaseOrderCreated(Uuid),
    PurchaseOrderSubmitted(Uuid),
    PurchaseOrderCancelled(Uuid),

    /// Completion notification consumed by the downstream reporting
    /// collaborator.
    GoodsReceiptCompleted {
        grn_id: Uuid,
        purchase_order_id: Uuid,
        completed_at: DateTime<Utc>,
    },

    InvoicePosted {
        invoice_id: Uuid,
        sales_order_id: Uuid,
        total_amount: Decimal,
    },
    PaymentAllocated {
        payment_id: Uuid,
        invoice_id: Uuid,
        allocated_amount: Decimal,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging instead of failing when the channel is
    /// unavailable. The notification is never part of the producing
    /// transaction's outcome.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.sender.send(event).await {
            warn!("Dropping event, channel unavailable: {}", e);
        }
    }
}

/// Consumer loop for the event channel. Runs until every sender is dropped.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::GoodsReceiptCompleted {
                grn_id,
                purchase_order_id,
                completed_at,
            } => {
                info!(
                    grn_id = %grn_id,
                    purchase_order_id = %purchase_order_id,
                    completed_at = %completed_at,
                    "Goods receipt completed"
                );
            }
            Event::InvoicePosted {
                invoice_id,
                total_amount,
                ..
            } => {
                info!(invoice_id = %invoice_id, total = %total_amount, "Invoice posted");
            }
            Event::PaymentAllocated {
                payment_id,
                invoice_id,
                allocated_amount,
            } => {
                info!(
                    payment_id = %payment_id,
                    invoice_id = %invoice_id,
                    amount = %allocated_amount,
                    "Payment allocated"
                );
            }
            other => {
                info!("Received event: {:?}", other);
            }
        }
    }

    info!("Event processing loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_or_log_does_not_fail_on_closed_channel() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = EventSender::new(tx);
        // Must not panic or return an error path to the caller.
        sender.send_or_log(Event::SalesOrderApproved(Uuid::new_v4())).await;
    }

    #[test]
    fn events_serialize_for_downstream_consumers() {
        let event = Event::InvoicePosted {
            invoice_id: Uuid::nil(),
            sales_order_id: Uuid::nil(),
            total_amount: Decimal::new(10050, 2),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("InvoicePosted"));
        assert!(json.contains("100.50"));
    }

    #[tokio::test]
    async fn events_round_trip_through_channel() {
        let (tx, mut rx) = mpsc::channel(4);
        let sender = EventSender::new(tx);
        let id = Uuid::new_v4();
        sender.send(Event::SalesOrderCancelled(id)).await.unwrap();
        match rx.recv().await {
            Some(Event::SalesOrderCancelled(got)) => assert_eq!(got, id),
            other => panic!("unexpected event: {:?}", other),
        }
    }
}
