use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Receive,
    Ship,
    AdjustIn,
    AdjustOut,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Receive => "RECEIVE",
            TransactionType::Ship => "SHIP",
            TransactionType::AdjustIn => "ADJUST_IN",
            TransactionType::AdjustOut => "ADJUST_OUT",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "RECEIVE" => Some(TransactionType::Receive),
            "SHIP" => Some(TransactionType::Ship),
            "ADJUST_IN" => Some(TransactionType::AdjustIn),
            "ADJUST_OUT" => Some(TransactionType::AdjustOut),
            _ => None,
        }
    }

    pub fn is_inbound(&self) -> bool {
        matches!(self, TransactionType::Receive | TransactionType::AdjustIn)
    }
}

/// One row of the immutable movement ledger. Quantity fields change only
/// through the audited amendment path, which stamps `amended_at`.
#[derive(Debug, FromRow)]
pub struct InventoryTransaction {
    pub id: i64,
    pub transaction_type: String,
    pub warehouse_id: i64,
    pub sku_id: i64,
    pub batch_lot: String,
    pub cartons_in: i32,
    pub cartons_out: i32,
    pub storage_pallets_in: i32,
    pub shipping_pallets_out: i32,
    pub storage_cartons_per_pallet: Option<i32>,
    pub shipping_cartons_per_pallet: Option<i32>,
    pub transaction_date: NaiveDate,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub amended_at: Option<DateTime<Utc>>,
    pub amendment_note: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transaction_type_is_a_closed_set() {
        assert_eq!(TransactionType::parse("RECEIVE"), Some(TransactionType::Receive));
        assert_eq!(TransactionType::parse("receive"), None);
        assert_eq!(TransactionType::parse("TRANSFER"), None);
    }

    #[test]
    fn direction_follows_the_type() {
        assert!(TransactionType::Receive.is_inbound());
        assert!(TransactionType::AdjustIn.is_inbound());
        assert!(!TransactionType::Ship.is_inbound());
        assert!(!TransactionType::AdjustOut.is_inbound());
    }
}
