use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::PgPool;

use crate::{
    calc::balance::{apply_movement, units_for, validate_receive_reduction},
    calc::pallets::{pallets_for, PalletBasis},
    calc::resolver::resolve_as_of,
    dtos::transaction::*,
    error::AppError,
    models::balance::InventoryBalance,
    models::catalog::Sku,
    models::config::WarehouseSkuConfig,
    models::transaction::{InventoryTransaction, TransactionType},
    state::AppState,
};

const TXN_COLUMNS: &str = "id, transaction_type, warehouse_id, sku_id, batch_lot, cartons_in, \
     cartons_out, storage_pallets_in, shipping_pallets_out, storage_cartons_per_pallet, \
     shipping_cartons_per_pallet, transaction_date, notes, created_at, amended_at, amendment_note";

const BALANCE_COLUMNS: &str = "id, warehouse_id, sku_id, batch_lot, current_cartons, \
     current_pallets, current_units, storage_cartons_per_pallet, shipping_cartons_per_pallet, \
     last_transaction_date, updated_at";

const CONFIG_COLUMNS: &str = "id, warehouse_id, sku_id, storage_cartons_per_pallet, \
     shipping_cartons_per_pallet, max_stacking_height, effective_date, end_date, created_at";

// ==================== Create Transactions (bulk ingestion) ====================

/// Accepts normalized movement records from the ingestion surface. Each record
/// is its own atomic unit: a rejected record rolls back alone and never fails
/// the batch.
pub async fn create_transactions(
    State(AppState { db_pool }): State<AppState>,
    Json(req): Json<CreateTransactionsRequest>,
) -> Result<Json<CreateTransactionsResponse>, AppError> {
    if req.transactions.is_empty() {
        return Err(AppError::validation("transactions must not be empty"));
    }

    let mut results = Vec::with_capacity(req.transactions.len());
    let mut accepted = 0usize;

    for record in &req.transactions {
        match create_one(&db_pool, record).await {
            Ok((txn, warnings)) => {
                accepted += 1;
                results.push(TransactionResult {
                    ok: true,
                    transaction: Some(txn),
                    error: None,
                    warnings,
                });
            }
            Err(e) => {
                results.push(TransactionResult {
                    ok: false,
                    transaction: None,
                    error: Some(e.message()),
                    warnings: Vec::new(),
                });
            }
        }
    }

    let rejected = results.len() - accepted;
    tracing::info!(accepted, rejected, "processed inventory transaction batch");

    Ok(Json(CreateTransactionsResponse {
        accepted,
        rejected,
        results,
    }))
}

async fn create_one(
    db_pool: &PgPool,
    req: &CreateTransactionRequest,
) -> Result<(TransactionResponse, Vec<String>), AppError> {
    if req.batch_lot.trim().is_empty() {
        return Err(AppError::validation("batch_lot must not be empty"));
    }
    if req.cartons_in < 0 || req.cartons_out < 0 {
        return Err(AppError::validation("carton quantities must not be negative"));
    }
    let txn_type = req.transaction_type;
    if txn_type.is_inbound() {
        if req.cartons_in <= 0 || req.cartons_out != 0 {
            return Err(AppError::validation(format!(
                "{} requires cartons_in > 0 and cartons_out = 0",
                txn_type.as_str()
            )));
        }
    } else if req.cartons_out <= 0 || req.cartons_in != 0 {
        return Err(AppError::validation(format!(
            "{} requires cartons_out > 0 and cartons_in = 0",
            txn_type.as_str()
        )));
    }

    let sku = sqlx::query_as::<_, Sku>(
        "SELECT id, sku_code, description, units_per_carton, pack_size, carton_dimensions_cm, \
         created_at FROM skus WHERE id = $1",
    )
    .bind(req.sku_id)
    .fetch_optional(db_pool)
    .await?
    .ok_or_else(|| AppError::not_found(format!("SKU {} not found", req.sku_id)))?;

    let warehouse_exists = sqlx::query_scalar::<_, i64>("SELECT id FROM warehouses WHERE id = $1")
        .bind(req.warehouse_id)
        .fetch_optional(db_pool)
        .await?;
    if warehouse_exists.is_none() {
        return Err(AppError::not_found(format!(
            "Warehouse {} not found",
            req.warehouse_id
        )));
    }

    let mut warnings = Vec::new();
    let mut tx = db_pool.begin().await?;

    // Materialize the balance row and take the row lock; concurrent writers to
    // the same (warehouse, SKU, batch) serialize here.
    sqlx::query(
        "INSERT INTO inventory_balances (warehouse_id, sku_id, batch_lot) VALUES ($1, $2, $3) \
         ON CONFLICT (warehouse_id, sku_id, batch_lot) DO NOTHING",
    )
    .bind(req.warehouse_id)
    .bind(req.sku_id)
    .bind(&req.batch_lot)
    .execute(&mut *tx)
    .await?;

    let balance = sqlx::query_as::<_, InventoryBalance>(&format!(
        "SELECT {BALANCE_COLUMNS} FROM inventory_balances \
         WHERE warehouse_id = $1 AND sku_id = $2 AND batch_lot = $3 FOR UPDATE"
    ))
    .bind(req.warehouse_id)
    .bind(req.sku_id)
    .bind(&req.batch_lot)
    .fetch_one(&mut *tx)
    .await?;

    let new_cartons = apply_movement(balance.current_cartons, req.cartons_in, req.cartons_out)
        .map_err(|e| AppError::validation(e.to_string()))?;

    // Basis precedence: per-transaction override, then the configuration
    // resolved as of the transaction date, then whatever the batch last used.
    let configs = sqlx::query_as::<_, WarehouseSkuConfig>(&format!(
        "SELECT {CONFIG_COLUMNS} FROM warehouse_sku_configs \
         WHERE warehouse_id = $1 AND sku_id = $2 ORDER BY effective_date"
    ))
    .bind(req.warehouse_id)
    .bind(req.sku_id)
    .fetch_all(&mut *tx)
    .await?;

    let resolved = resolve_as_of(&configs, req.transaction_date)
        .map_err(|e| AppError::integrity(e.to_string()))?;

    let storage_basis = PalletBasis::select(
        req.storage_cartons_per_pallet,
        resolved
            .map(|c| c.storage_cartons_per_pallet)
            .or(balance.storage_cartons_per_pallet),
    );
    let shipping_basis = PalletBasis::select(
        req.shipping_cartons_per_pallet,
        resolved
            .map(|c| c.shipping_cartons_per_pallet)
            .or(balance.shipping_cartons_per_pallet),
    );

    let storage_pallets_in = if txn_type.is_inbound() {
        match req.storage_pallets_in {
            Some(pallets) if pallets >= 0 => pallets,
            _ => match storage_basis.cartons_per_pallet() {
                Some(cpp) => pallets_for(req.cartons_in, cpp),
                None => {
                    warnings.push(
                        "missing pallet basis: no storage cartons-per-pallet override or \
                         configuration applies to this transaction date"
                            .to_string(),
                    );
                    0
                }
            },
        }
    } else {
        0
    };

    let shipping_pallets_out = if txn_type.is_inbound() {
        0
    } else {
        match req.shipping_pallets_out {
            Some(pallets) if pallets >= 0 => pallets,
            _ => match shipping_basis.cartons_per_pallet() {
                Some(cpp) => pallets_for(req.cartons_out, cpp),
                None => {
                    warnings.push(
                        "missing pallet basis: no shipping cartons-per-pallet override or \
                         configuration applies to this transaction date"
                            .to_string(),
                    );
                    0
                }
            },
        }
    };

    let txn = sqlx::query_as::<_, InventoryTransaction>(&format!(
        "INSERT INTO inventory_transactions \
         (transaction_type, warehouse_id, sku_id, batch_lot, cartons_in, cartons_out, \
          storage_pallets_in, shipping_pallets_out, storage_cartons_per_pallet, \
          shipping_cartons_per_pallet, transaction_date, notes) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
         RETURNING {TXN_COLUMNS}"
    ))
    .bind(txn_type.as_str())
    .bind(req.warehouse_id)
    .bind(req.sku_id)
    .bind(&req.batch_lot)
    .bind(req.cartons_in)
    .bind(req.cartons_out)
    .bind(storage_pallets_in)
    .bind(shipping_pallets_out)
    .bind(storage_basis.cartons_per_pallet())
    .bind(shipping_basis.cartons_per_pallet())
    .bind(req.transaction_date)
    .bind(&req.notes)
    .fetch_one(&mut *tx)
    .await?;

    let new_storage_cpp = storage_basis
        .cartons_per_pallet()
        .or(balance.storage_cartons_per_pallet);
    let new_shipping_cpp = shipping_basis
        .cartons_per_pallet()
        .or(balance.shipping_cartons_per_pallet);
    let current_pallets = new_storage_cpp
        .map(|cpp| pallets_for(new_cartons, cpp))
        .unwrap_or(0);
    let last_transaction_date = balance
        .last_transaction_date
        .map_or(req.transaction_date, |d| d.max(req.transaction_date));

    sqlx::query(
        "UPDATE inventory_balances SET current_cartons = $1, current_pallets = $2, \
         current_units = $3, storage_cartons_per_pallet = $4, shipping_cartons_per_pallet = $5, \
         last_transaction_date = $6, updated_at = NOW() WHERE id = $7",
    )
    .bind(new_cartons)
    .bind(current_pallets)
    .bind(units_for(new_cartons, sku.units_per_carton))
    .bind(new_storage_cpp)
    .bind(new_shipping_cpp)
    .bind(last_transaction_date)
    .bind(balance.id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    for warning in &warnings {
        tracing::warn!(
            transaction_id = txn.id,
            batch_lot = %txn.batch_lot,
            "{warning}"
        );
    }

    Ok((txn.into(), warnings))
}

// ==================== Amend Transaction (audited correction path) ====================

pub async fn amend_transaction(
    State(AppState { db_pool }): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<AmendTransactionRequest>,
) -> Result<Json<AmendTransactionResponse>, AppError> {
    if req.cartons_in.is_none() && req.cartons_out.is_none() {
        return Err(AppError::validation(
            "amendment must change cartons_in or cartons_out",
        ));
    }

    let mut tx = db_pool.begin().await?;

    let txn = sqlx::query_as::<_, InventoryTransaction>(&format!(
        "SELECT {TXN_COLUMNS} FROM inventory_transactions WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::not_found("Transaction not found"))?;

    let txn_type = TransactionType::parse(&txn.transaction_type).ok_or_else(|| {
        AppError::integrity(format!(
            "transaction {} has unknown type \"{}\"",
            txn.id, txn.transaction_type
        ))
    })?;

    let new_in = req.cartons_in.unwrap_or(txn.cartons_in);
    let new_out = req.cartons_out.unwrap_or(txn.cartons_out);
    if new_in < 0 || new_out < 0 {
        return Err(AppError::validation("carton quantities must not be negative"));
    }
    if txn_type.is_inbound() && new_out != 0 {
        return Err(AppError::validation(format!(
            "{} transactions cannot carry cartons_out",
            txn_type.as_str()
        )));
    }
    if !txn_type.is_inbound() && new_in != 0 {
        return Err(AppError::validation(format!(
            "{} transactions cannot carry cartons_in",
            txn_type.as_str()
        )));
    }

    // Reducing a receipt is only allowed down to what the batch has already
    // shipped since that receipt, even if the net balance would survive.
    if txn_type == TransactionType::Receive && new_in < txn.cartons_in {
        let already_shipped = sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(SUM(cartons_out), 0)::BIGINT FROM inventory_transactions \
             WHERE warehouse_id = $1 AND sku_id = $2 AND batch_lot = $3 \
               AND transaction_date >= $4 AND id <> $5",
        )
        .bind(txn.warehouse_id)
        .bind(txn.sku_id)
        .bind(&txn.batch_lot)
        .bind(txn.transaction_date)
        .bind(txn.id)
        .fetch_one(&mut *tx)
        .await?;

        let already_shipped = i32::try_from(already_shipped).map_err(|_| {
            AppError::validation(format!(
                "shipped total for batch \"{}\" exceeds the supported carton range",
                txn.batch_lot
            ))
        })?;
        validate_receive_reduction(new_in, already_shipped, &txn.batch_lot)
            .map_err(|e| AppError::validation(e.to_string()))?;
    }

    let balance = sqlx::query_as::<_, InventoryBalance>(&format!(
        "SELECT {BALANCE_COLUMNS} FROM inventory_balances \
         WHERE warehouse_id = $1 AND sku_id = $2 AND batch_lot = $3 FOR UPDATE"
    ))
    .bind(txn.warehouse_id)
    .bind(txn.sku_id)
    .bind(&txn.batch_lot)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::not_found("No inventory balance exists for this transaction's scope"))?;

    let diff = (new_in - new_out) - (txn.cartons_in - txn.cartons_out);
    let (diff_in, diff_out) = if diff >= 0 { (diff, 0) } else { (0, -diff) };
    let new_cartons = apply_movement(balance.current_cartons, diff_in, diff_out)
        .map_err(|e| AppError::validation(e.to_string()))?;

    let mut warnings = Vec::new();

    // Recompute the transaction's pallet figures from the basis it was
    // recorded with.
    let storage_cpp = txn
        .storage_cartons_per_pallet
        .or(balance.storage_cartons_per_pallet);
    let shipping_cpp = txn
        .shipping_cartons_per_pallet
        .or(balance.shipping_cartons_per_pallet);

    let storage_pallets_in = if txn_type.is_inbound() {
        match storage_cpp {
            Some(cpp) => pallets_for(new_in, cpp),
            None => {
                warnings.push("missing pallet basis: storage pallets left unchanged".to_string());
                txn.storage_pallets_in
            }
        }
    } else {
        0
    };
    let shipping_pallets_out = if txn_type.is_inbound() {
        0
    } else {
        match shipping_cpp {
            Some(cpp) => pallets_for(new_out, cpp),
            None => {
                warnings.push("missing pallet basis: shipping pallets left unchanged".to_string());
                txn.shipping_pallets_out
            }
        }
    };

    let amended = sqlx::query_as::<_, InventoryTransaction>(&format!(
        "UPDATE inventory_transactions SET cartons_in = $1, cartons_out = $2, \
         storage_pallets_in = $3, shipping_pallets_out = $4, amended_at = NOW(), \
         amendment_note = $5 WHERE id = $6 RETURNING {TXN_COLUMNS}"
    ))
    .bind(new_in)
    .bind(new_out)
    .bind(storage_pallets_in)
    .bind(shipping_pallets_out)
    .bind(&req.amendment_note)
    .bind(txn.id)
    .fetch_one(&mut *tx)
    .await?;

    let units_per_carton = sqlx::query_scalar::<_, i32>(
        "SELECT units_per_carton FROM skus WHERE id = $1",
    )
    .bind(txn.sku_id)
    .fetch_one(&mut *tx)
    .await?;

    let current_pallets = storage_cpp
        .map(|cpp| pallets_for(new_cartons, cpp))
        .unwrap_or(0);

    let updated_balance = sqlx::query_as::<_, InventoryBalance>(&format!(
        "UPDATE inventory_balances SET current_cartons = $1, current_pallets = $2, \
         current_units = $3, updated_at = NOW() WHERE id = $4 RETURNING {BALANCE_COLUMNS}"
    ))
    .bind(new_cartons)
    .bind(current_pallets)
    .bind(units_for(new_cartons, units_per_carton))
    .bind(balance.id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(Json(AmendTransactionResponse {
        transaction: amended.into(),
        balance: updated_balance.into(),
        warnings,
    }))
}

// ==================== Queries ====================

#[derive(Deserialize)]
pub struct TransactionListQuery {
    pub warehouse_id: Option<i64>,
    pub sku_id: Option<i64>,
    pub batch_lot: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

pub async fn list_transactions(
    State(AppState { db_pool }): State<AppState>,
    Query(query): Query<TransactionListQuery>,
) -> Result<Json<Vec<TransactionResponse>>, AppError> {
    let transactions = sqlx::query_as::<_, InventoryTransaction>(&format!(
        "SELECT {TXN_COLUMNS} FROM inventory_transactions \
         WHERE ($1::BIGINT IS NULL OR warehouse_id = $1) \
           AND ($2::BIGINT IS NULL OR sku_id = $2) \
           AND ($3::TEXT IS NULL OR batch_lot = $3) \
           AND ($4::DATE IS NULL OR transaction_date >= $4) \
           AND ($5::DATE IS NULL OR transaction_date <= $5) \
         ORDER BY transaction_date DESC, id DESC"
    ))
    .bind(query.warehouse_id)
    .bind(query.sku_id)
    .bind(query.batch_lot)
    .bind(query.start_date)
    .bind(query.end_date)
    .fetch_all(&db_pool)
    .await?;

    Ok(Json(transactions.into_iter().map(Into::into).collect()))
}

#[derive(sqlx::FromRow)]
struct MovementRow {
    id: i64,
    transaction_type: String,
    cartons_in: i32,
    cartons_out: i32,
    transaction_date: NaiveDate,
    running_balance: i64,
}

/// Full movement history for one batch with a running balance, for the
/// dashboard and for auditing corrections.
pub async fn movement_history(
    State(AppState { db_pool }): State<AppState>,
    Path((warehouse_id, sku_id, batch_lot)): Path<(i64, i64, String)>,
) -> Result<Json<MovementHistoryResponse>, AppError> {
    let rows = sqlx::query_as::<_, MovementRow>(
        "SELECT id, transaction_type, cartons_in, cartons_out, transaction_date, \
           SUM(cartons_in - cartons_out) \
             OVER (ORDER BY transaction_date, id)::BIGINT AS running_balance \
         FROM inventory_transactions \
         WHERE warehouse_id = $1 AND sku_id = $2 AND batch_lot = $3 \
         ORDER BY transaction_date, id",
    )
    .bind(warehouse_id)
    .bind(sku_id)
    .bind(&batch_lot)
    .fetch_all(&db_pool)
    .await?;

    if rows.is_empty() {
        return Err(AppError::not_found("No transactions recorded for this batch"));
    }

    let current_cartons = rows.last().map(|r| r.running_balance).unwrap_or(0);
    let movements = rows
        .into_iter()
        .map(|r| MovementHistoryEntry {
            id: r.id,
            transaction_type: r.transaction_type,
            cartons_in: r.cartons_in,
            cartons_out: r.cartons_out,
            transaction_date: r.transaction_date,
            running_balance: r.running_balance,
        })
        .collect();

    Ok(Json(MovementHistoryResponse {
        warehouse_id,
        sku_id,
        batch_lot,
        current_cartons,
        movements,
    }))
}
