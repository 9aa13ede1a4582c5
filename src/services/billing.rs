//! Billing: invoices and the sales journal.
//!
//! An invoice is generated from a delivery note, never from the order
//! directly, so only shipped goods are billed. The journal entry posted
//! with it is re-summed before commit; an unbalanced entry aborts the
//! transaction.

use crate::entities::{
    customer_invoice, customer_invoice_line, delivery_note, delivery_note_line, journal_entry,
    journal_line, sales_order_line,
};
use crate::entities::journal_line::JournalSide;
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::{generate_document_number, reservations};
use crate::state_machine::InvoiceStatus;
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set, TransactionTrait,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

pub const ACCOUNT_RECEIVABLE: (&str, &str) = ("1100", "Accounts Receivable");
pub const ACCOUNT_SALES_REVENUE: (&str, &str) = ("4000", "Sales Revenue");

#[derive(Clone)]
pub struct BillingService {
    db: Arc<DatabaseConnection>,
    events: EventSender,
}

impl BillingService {
    pub fn new(db: Arc<DatabaseConnection>, events: EventSender) -> Self {
        Self { db, events }
    }

    /// Generates the invoice for a delivery, posting the matching sales
    /// journal entry in the same transaction.
    ///
    /// Idempotent per delivery: a second call returns the invoice created
    /// by the first and writes nothing.
    #[instrument(skip(self))]
    pub async fn invoice_delivery(
        &self,
        delivery_note_id: Uuid,
    ) -> Result<customer_invoice::Model, ServiceError> {
        let txn = self.db.begin().await?;

        if let Some(existing) = customer_invoice::Entity::find()
            .filter(customer_invoice::Column::DeliveryNoteId.eq(delivery_note_id))
            .one(&txn)
            .await?
        {
            txn.commit().await?;
            info!(invoice_id = %existing.id, %delivery_note_id, "Delivery already invoiced");
            return Ok(existing);
        }

        let note = delivery_note::Entity::find_by_id(delivery_note_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::not_found(format!("delivery note {}", delivery_note_id))
            })?;
        let order = reservations::find_order(&txn, note.sales_order_id).await?;

        let delivered = delivery_note_line::Entity::find()
            .filter(delivery_note_line::Column::DeliveryNoteId.eq(delivery_note_id))
            .all(&txn)
            .await?;
        if delivered.is_empty() {
            return Err(ServiceError::InvalidOperation(format!(
                "delivery note {} has no lines",
                delivery_note_id
            )));
        }

        let order_lines = sales_order_line::Entity::find()
            .filter(sales_order_line::Column::SalesOrderId.eq(order.id))
            .all(&txn)
            .await?;
        let price_by_line: HashMap<Uuid, Decimal> =
            order_lines.iter().map(|l| (l.id, l.unit_price)).collect();

        // Batch splits collapse back to one invoice line per product.
        let mut billed: HashMap<Uuid, (Decimal, Decimal)> = HashMap::new();
        for dn_line in &delivered {
            let unit_price = *price_by_line.get(&dn_line.sales_order_line_id).ok_or_else(|| {
                ServiceError::InternalError(format!(
                    "delivery line {} references unknown order line {}",
                    dn_line.id, dn_line.sales_order_line_id
                ))
            })?;
            let entry = billed
                .entry(dn_line.product_id)
                .or_insert((Decimal::ZERO, unit_price));
            entry.0 += dn_line.quantity;
        }

        let total: Decimal = billed.values().map(|(qty, price)| qty * price).sum();
        let invoice_id = Uuid::new_v4();
        let issued_at = Utc::now();
        let invoice = customer_invoice::ActiveModel {
            id: Set(invoice_id),
            invoice_number: Set(generate_document_number("INV")),
            customer_id: Set(order.customer_id),
            sales_order_id: Set(order.id),
            delivery_note_id: Set(delivery_note_id),
            status: Set(InvoiceStatus::Posted.to_string()),
            total_amount: Set(total),
            paid_amount: Set(Decimal::ZERO),
            issued_at: Set(issued_at),
            created_at: Set(issued_at),
            updated_at: Set(None),
        };
        let invoice = invoice.insert(&txn).await?;

        for (product_id, (quantity, unit_price)) in &billed {
            let line = customer_invoice_line::ActiveModel {
                id: Set(Uuid::new_v4()),
                invoice_id: Set(invoice_id),
                product_id: Set(*product_id),
                quantity: Set(*quantity),
                unit_price: Set(*unit_price),
                line_total: Set(*quantity * *unit_price),
                created_at: Set(Utc::now()),
            };
            line.insert(&txn).await?;
        }

        post_journal_entry(
            &txn,
            "SALES",
            Some(invoice_id),
            Some(format!("Invoice {} for order {}", invoice.invoice_number, order.order_number)),
            &[
                (ACCOUNT_RECEIVABLE, JournalSide::Debit, total),
                (ACCOUNT_SALES_REVENUE, JournalSide::Credit, total),
            ],
        )
        .await?;

        txn.commit().await?;
        info!(
            invoice_id = %invoice.id,
            invoice_number = %invoice.invoice_number,
            total = %total,
            "Invoice posted"
        );

        self.events
            .send_or_log(Event::InvoicePosted {
                invoice_id: invoice.id,
                sales_order_id: order.id,
                total_amount: total,
            })
            .await;
        Ok(invoice)
    }

    #[instrument(skip(self))]
    pub async fn get_invoice(
        &self,
        invoice_id: Uuid,
    ) -> Result<(customer_invoice::Model, Vec<customer_invoice_line::Model>), ServiceError> {
        let invoice = find_invoice(self.db.as_ref(), invoice_id).await?;
        let lines = customer_invoice_line::Entity::find()
            .filter(customer_invoice_line::Column::InvoiceId.eq(invoice_id))
            .all(self.db.as_ref())
            .await?;
        Ok((invoice, lines))
    }

    #[instrument(skip(self))]
    pub async fn journal_entry_for(
        &self,
        source_id: Uuid,
    ) -> Result<(journal_entry::Model, Vec<journal_line::Model>), ServiceError> {
        let entry = journal_entry::Entity::find()
            .filter(journal_entry::Column::SourceId.eq(source_id))
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| {
                ServiceError::not_found(format!("journal entry for source {}", source_id))
            })?;
        let lines = journal_line::Entity::find()
            .filter(journal_line::Column::JournalEntryId.eq(entry.id))
            .all(self.db.as_ref())
            .await?;
        Ok((entry, lines))
    }
}

pub async fn find_invoice<C: ConnectionTrait>(
    conn: &C,
    invoice_id: Uuid,
) -> Result<customer_invoice::Model, ServiceError> {
    customer_invoice::Entity::find_by_id(invoice_id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::not_found(format!("invoice {}", invoice_id)))
}

/// Writes a journal entry with its lines and verifies it balances before
/// returning. An unbalanced set of lines is an internal fault, never user
/// input, and aborts the caller's transaction.
pub async fn post_journal_entry<C: ConnectionTrait>(
    txn: &C,
    source_type: &str,
    source_id: Option<Uuid>,
    memo: Option<String>,
    lines: &[((&str, &str), JournalSide, Decimal)],
) -> Result<journal_entry::Model, ServiceError> {
    let entry_id = Uuid::new_v4();
    let entry = journal_entry::ActiveModel {
        id: Set(entry_id),
        source_type: Set(source_type.to_string()),
        source_id: Set(source_id),
        memo: Set(memo),
        posted_at: Set(Utc::now()),
        created_at: Set(Utc::now()),
    };
    let entry = entry.insert(txn).await?;

    let mut balance = Decimal::ZERO;
    for ((code, name), side, amount) in lines {
        if *amount < Decimal::ZERO {
            return Err(ServiceError::InternalError(format!(
                "negative journal amount {} on account {}",
                amount, code
            )));
        }
        balance += match side {
            JournalSide::Debit => *amount,
            JournalSide::Credit => -*amount,
        };
        let line = journal_line::ActiveModel {
            id: Set(Uuid::new_v4()),
            journal_entry_id: Set(entry_id),
            account_code: Set(code.to_string()),
            account_name: Set(name.to_string()),
            side: Set(*side),
            amount: Set(*amount),
            created_at: Set(Utc::now()),
        };
        line.insert(txn).await?;
    }

    if balance != Decimal::ZERO {
        return Err(ServiceError::InternalError(format!(
            "journal entry for {} does not balance: off by {}",
            source_type, balance
        )));
    }
    Ok(entry)
}
