use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Invoice lifecycle: pending -> reconciled | disputed -> paid (terminal).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Pending,
    Reconciled,
    Disputed,
    Paid,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Pending => "pending",
            InvoiceStatus::Reconciled => "reconciled",
            InvoiceStatus::Disputed => "disputed",
            InvoiceStatus::Paid => "paid",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(InvoiceStatus::Pending),
            "reconciled" => Some(InvoiceStatus::Reconciled),
            "disputed" => Some(InvoiceStatus::Disputed),
            "paid" => Some(InvoiceStatus::Paid),
            _ => None,
        }
    }

    /// Paid invoices are immutable; no edits, no deletion.
    pub fn is_terminal(&self) -> bool {
        matches!(self, InvoiceStatus::Paid)
    }

    pub fn can_reconcile_or_dispute(&self) -> bool {
        matches!(self, InvoiceStatus::Pending)
    }

    pub fn can_accept_payment(&self) -> bool {
        matches!(self, InvoiceStatus::Reconciled | InvoiceStatus::Disputed)
    }
}

#[derive(Debug, FromRow)]
pub struct Invoice {
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
}

#[derive(Debug, FromRow)]
pub struct InvoiceLineItem {
    pub id: i64,
    pub invoice_id: i64,
    pub cost_category: String,
    pub cost_name: String,
    pub quantity: Decimal,
    pub unit_rate: Option<Decimal>,
    pub amount: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_transitions_are_gated_by_status() {
        assert!(InvoiceStatus::Pending.can_reconcile_or_dispute());
        assert!(!InvoiceStatus::Reconciled.can_reconcile_or_dispute());

        assert!(InvoiceStatus::Reconciled.can_accept_payment());
        assert!(InvoiceStatus::Disputed.can_accept_payment());
        assert!(!InvoiceStatus::Pending.can_accept_payment());
        assert!(!InvoiceStatus::Paid.can_accept_payment());

        assert!(InvoiceStatus::Paid.is_terminal());
        assert!(!InvoiceStatus::Disputed.is_terminal());
    }
}
