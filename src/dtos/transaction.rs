use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::dtos::balance::BalanceResponse;
use crate::models::transaction::{InventoryTransaction, TransactionType};

#[derive(Deserialize)]
pub struct CreateTransactionRequest {
    pub transaction_type: TransactionType,
    pub warehouse_id: i64,
    pub sku_id: i64,
    pub batch_lot: String,
    #[serde(default)]
    pub cartons_in: i32,
    #[serde(default)]
    pub cartons_out: i32,
    /// Independently supplied pallet figures; derived when absent.
    pub storage_pallets_in: Option<i32>,
    pub shipping_pallets_out: Option<i32>,
    /// Per-transaction override of the configured conversion factors.
    pub storage_cartons_per_pallet: Option<i32>,
    pub shipping_cartons_per_pallet: Option<i32>,
    pub transaction_date: NaiveDate,
    pub notes: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateTransactionsRequest {
    pub transactions: Vec<CreateTransactionRequest>,
}

#[derive(Serialize)]
pub struct TransactionResponse {
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

impl From<InventoryTransaction> for TransactionResponse {
    fn from(txn: InventoryTransaction) -> Self {
        Self {
            id: txn.id,
            transaction_type: txn.transaction_type,
            warehouse_id: txn.warehouse_id,
            sku_id: txn.sku_id,
            batch_lot: txn.batch_lot,
            cartons_in: txn.cartons_in,
            cartons_out: txn.cartons_out,
            storage_pallets_in: txn.storage_pallets_in,
            shipping_pallets_out: txn.shipping_pallets_out,
            storage_cartons_per_pallet: txn.storage_cartons_per_pallet,
            shipping_cartons_per_pallet: txn.shipping_cartons_per_pallet,
            transaction_date: txn.transaction_date,
            notes: txn.notes,
            created_at: txn.created_at,
            amended_at: txn.amended_at,
            amendment_note: txn.amendment_note,
        }
    }
}

/// Per-record outcome for bulk ingestion. A rejected record never fails the
/// whole batch.
#[derive(Serialize)]
pub struct TransactionResult {
    pub ok: bool,
    pub transaction: Option<TransactionResponse>,
    pub error: Option<String>,
    pub warnings: Vec<String>,
}

#[derive(Serialize)]
pub struct CreateTransactionsResponse {
    pub accepted: usize,
    pub rejected: usize,
    pub results: Vec<TransactionResult>,
}

#[derive(Deserialize)]
pub struct AmendTransactionRequest {
    pub cartons_in: Option<i32>,
    pub cartons_out: Option<i32>,
    pub amendment_note: Option<String>,
}

#[derive(Serialize)]
pub struct AmendTransactionResponse {
    pub transaction: TransactionResponse,
    pub balance: BalanceResponse,
    pub warnings: Vec<String>,
}

#[derive(Serialize)]
pub struct MovementHistoryEntry {
    pub id: i64,
    pub transaction_type: String,
    pub cartons_in: i32,
    pub cartons_out: i32,
    pub transaction_date: NaiveDate,
    pub running_balance: i64,
}

#[derive(Serialize)]
pub struct MovementHistoryResponse {
    pub warehouse_id: i64,
    pub sku_id: i64,
    pub batch_lot: String,
    pub current_cartons: i64,
    pub movements: Vec<MovementHistoryEntry>,
}
