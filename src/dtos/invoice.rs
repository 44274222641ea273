use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calc::variance::CategoryVariance;
use crate::models::config::CostCategory;
use crate::models::invoice::{Invoice, InvoiceLineItem};

#[derive(Deserialize)]
pub struct InvoiceLineItemRequest {
    pub cost_category: CostCategory,
    pub cost_name: String,
    pub quantity: Decimal,
    pub unit_rate: Option<Decimal>,
    pub amount: Decimal,
}

#[derive(Deserialize)]
pub struct CreateInvoiceRequest {
    pub invoice_number: String,
    pub warehouse_id: i64,
    pub billing_period_start: NaiveDate,
    pub billing_period_end: NaiveDate,
    pub line_items: Vec<InvoiceLineItemRequest>,
}

#[derive(Serialize)]
pub struct InvoiceLineItemResponse {
    pub id: i64,
    pub cost_category: String,
    pub cost_name: String,
    pub quantity: Decimal,
    pub unit_rate: Option<Decimal>,
    pub amount: Decimal,
}

impl From<InvoiceLineItem> for InvoiceLineItemResponse {
    fn from(item: InvoiceLineItem) -> Self {
        Self {
            id: item.id,
            cost_category: item.cost_category,
            cost_name: item.cost_name,
            quantity: item.quantity,
            unit_rate: item.unit_rate,
            amount: item.amount,
        }
    }
}

#[derive(Serialize)]
pub struct InvoiceResponse {
    pub id: i64,
    pub invoice_number: String,
    pub warehouse_id: i64,
    pub billing_period_start: NaiveDate,
    pub billing_period_end: NaiveDate,
    pub total_amount: Decimal,
    pub status: String,
    pub dispute_reason: Option<String>,
    pub payment_method: Option<String>,
    pub payment_reference: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub line_items: Vec<InvoiceLineItemResponse>,
}

impl InvoiceResponse {
    pub fn from_parts(invoice: Invoice, line_items: Vec<InvoiceLineItem>) -> Self {
        Self {
            id: invoice.id,
            invoice_number: invoice.invoice_number,
            warehouse_id: invoice.warehouse_id,
            billing_period_start: invoice.billing_period_start,
            billing_period_end: invoice.billing_period_end,
            total_amount: invoice.total_amount,
            status: invoice.status,
            dispute_reason: invoice.dispute_reason,
            payment_method: invoice.payment_method,
            payment_reference: invoice.payment_reference,
            paid_at: invoice.paid_at,
            created_at: invoice.created_at,
            updated_at: invoice.updated_at,
            line_items: line_items.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Serialize)]
pub struct CreateInvoiceResponse {
    pub invoice: InvoiceResponse,
    /// True when an identical invoice already existed for this number; the
    /// replay returns the original, it is not an error.
    pub idempotent: bool,
    pub message: Option<String>,
}

fn default_tolerance() -> Decimal {
    Decimal::new(1, 2)
}

#[derive(Deserialize)]
pub struct ReconcileInvoiceRequest {
    /// Maximum per-category |submitted - calculated| treated as matching.
    #[serde(default = "default_tolerance")]
    pub tolerance: Decimal,
    /// Operator accepts a material variance and reconciles anyway.
    #[serde(default)]
    pub accept_variance: bool,
}

#[derive(Serialize)]
pub struct ReconcileInvoiceResponse {
    pub invoice: InvoiceResponse,
    pub variances: Vec<CategoryVariance>,
    pub reconciled: bool,
    pub message: String,
}

#[derive(Deserialize)]
pub struct DisputeInvoiceRequest {
    pub reason: String,
}

#[derive(Deserialize)]
pub struct AcceptPaymentRequest {
    pub payment_method: String,
    pub payment_reference: String,
}

#[derive(Serialize)]
pub struct AcceptPaymentResponse {
    pub invoice: InvoiceResponse,
    pub idempotent: bool,
}
