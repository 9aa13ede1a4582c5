//! Payments and allocation against invoices.
//!
//! Allocation is guarded per invoice: cumulative allocations never exceed
//! the invoice total, and the invoice status is recomputed from the
//! cumulative paid amount rather than set blindly.

use crate::entities::{customer_invoice, payment, payment_allocation};
use crate::entities::journal_line::JournalSide;
use crate::entities::payment::PaymentKind;
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::billing::{self, ACCOUNT_RECEIVABLE};
use crate::services::generate_document_number;
use crate::state_machine::{validate_transition, InvoiceStatus, OrderEntityKind};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set, TransactionTrait,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

pub const ACCOUNT_CASH: (&str, &str) = ("1000", "Cash");

#[derive(Debug, Clone, Deserialize)]
pub struct AllocationInput {
    pub invoice_id: Uuid,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RecordPaymentInput {
    pub party_id: Uuid,
    pub amount: Decimal,
    #[validate(length(min = 1, message = "payment method must not be empty"))]
    pub method: String,
    /// Client-supplied replay guard. Resubmitting the same key returns the
    /// originally recorded payment.
    pub idempotency_key: Option<String>,
    pub allocations: Vec<AllocationInput>,
}

#[derive(Clone)]
pub struct PaymentService {
    db: Arc<DatabaseConnection>,
    events: EventSender,
}

impl PaymentService {
    pub fn new(db: Arc<DatabaseConnection>, events: EventSender) -> Self {
        Self { db, events }
    }

    /// Records a receipt and applies it to invoices.
    #[instrument(skip(self, input), fields(party_id = %input.party_id, amount = %input.amount))]
    pub async fn record_payment(
        &self,
        input: RecordPaymentInput,
    ) -> Result<payment::Model, ServiceError> {
        input
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;
        if input.amount <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "payment amount must be positive".into(),
            ));
        }
        let allocated_total: Decimal = input.allocations.iter().map(|a| a.amount).sum();
        if allocated_total > input.amount {
            return Err(ServiceError::ValidationError(format!(
                "allocations of {} exceed the payment amount {}",
                allocated_total, input.amount
            )));
        }
        for alloc in &input.allocations {
            if alloc.amount <= Decimal::ZERO {
                return Err(ServiceError::ValidationError(format!(
                    "allocation for invoice {} must be positive",
                    alloc.invoice_id
                )));
            }
        }

        let txn = self.db.begin().await?;

        if let Some(key) = &input.idempotency_key {
            if let Some(existing) = payment::Entity::find()
                .filter(payment::Column::IdempotencyKey.eq(key.clone()))
                .one(&txn)
                .await?
            {
                txn.commit().await?;
                info!(payment_id = %existing.id, "Replayed payment by idempotency key");
                return Ok(existing);
            }
        }

        let payment_id = Uuid::new_v4();
        let now = Utc::now();
        let row = payment::ActiveModel {
            id: Set(payment_id),
            payment_number: Set(generate_document_number("PAY")),
            party_id: Set(input.party_id),
            kind: Set(PaymentKind::Receipt),
            method: Set(input.method.clone()),
            amount: Set(input.amount),
            idempotency_key: Set(input.idempotency_key.clone()),
            received_at: Set(now),
            created_at: Set(now),
        };
        let recorded = row.insert(&txn).await?;

        for alloc in &input.allocations {
            allocate(&txn, payment_id, alloc.invoice_id, alloc.amount).await?;
        }

        if allocated_total > Decimal::ZERO {
            billing::post_journal_entry(
                &txn,
                "PAYMENT",
                Some(payment_id),
                Some(format!("Payment {}", recorded.payment_number)),
                &[
                    (ACCOUNT_CASH, JournalSide::Debit, allocated_total),
                    (ACCOUNT_RECEIVABLE, JournalSide::Credit, allocated_total),
                ],
            )
            .await?;
        }

        txn.commit().await?;
        info!(
            payment_id = %recorded.id,
            payment_number = %recorded.payment_number,
            "Payment recorded"
        );

        for alloc in &input.allocations {
            self.events
                .send_or_log(Event::PaymentAllocated {
                    payment_id: recorded.id,
                    invoice_id: alloc.invoice_id,
                    allocated_amount: alloc.amount,
                })
                .await;
        }
        Ok(recorded)
    }

    #[instrument(skip(self))]
    pub async fn get_payment(&self, payment_id: Uuid) -> Result<payment::Model, ServiceError> {
        payment::Entity::find_by_id(payment_id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("payment {}", payment_id)))
    }

    #[instrument(skip(self))]
    pub async fn allocations_for_invoice(
        &self,
        invoice_id: Uuid,
    ) -> Result<Vec<payment_allocation::Model>, ServiceError> {
        let rows = payment_allocation::Entity::find()
            .filter(payment_allocation::Column::InvoiceId.eq(invoice_id))
            .all(self.db.as_ref())
            .await?;
        Ok(rows)
    }
}

/// Applies one allocation and recomputes the invoice status from the
/// cumulative paid amount.
///
/// The invoice's paid_amount is incremented through a single guarded
/// update, so two concurrent payments can never jointly push it past
/// total_amount.
async fn allocate<C: ConnectionTrait>(
    txn: &C,
    payment_id: Uuid,
    invoice_id: Uuid,
    amount: Decimal,
) -> Result<(), ServiceError> {
    let invoice = billing::find_invoice(txn, invoice_id).await?;

    let res = customer_invoice::Entity::update_many()
        .col_expr(
            customer_invoice::Column::PaidAmount,
            Expr::col(customer_invoice::Column::PaidAmount).add(amount),
        )
        .col_expr(customer_invoice::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(customer_invoice::Column::Id.eq(invoice_id))
        .filter(
            Expr::expr(Expr::col(customer_invoice::Column::PaidAmount).add(amount))
                .lte(Expr::col(customer_invoice::Column::TotalAmount)),
        )
        .exec(txn)
        .await?;

    if res.rows_affected == 0 {
        return Err(ServiceError::AllocationExceedsInvoice(format!(
            "invoice {} total is {}, already paid {}, cannot allocate {}",
            invoice.invoice_number, invoice.total_amount, invoice.paid_amount, amount
        )));
    }

    let row = payment_allocation::ActiveModel {
        id: Set(Uuid::new_v4()),
        payment_id: Set(payment_id),
        invoice_id: Set(invoice_id),
        allocated_amount: Set(amount),
        created_at: Set(Utc::now()),
    };
    row.insert(txn).await?;

    let invoice = billing::find_invoice(txn, invoice_id).await?;
    let next = if invoice.paid_amount == invoice.total_amount {
        InvoiceStatus::Paid
    } else {
        InvoiceStatus::PartiallyPaid
    };
    validate_transition(
        OrderEntityKind::CustomerInvoice,
        &invoice.status,
        &next.to_string(),
    )?;

    let mut active: customer_invoice::ActiveModel = invoice.into();
    active.status = Set(next.to_string());
    active.update(txn).await?;
    Ok(())
}
