use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::{
    dtos::balance::{BalanceResponse, BalanceSummaryResponse},
    error::AppError,
    models::balance::InventoryBalance,
    state::AppState,
};

const BALANCE_COLUMNS: &str = "id, warehouse_id, sku_id, batch_lot, current_cartons, \
     current_pallets, current_units, storage_cartons_per_pallet, shipping_cartons_per_pallet, \
     last_transaction_date, updated_at";

#[derive(Deserialize)]
pub struct BalanceListQuery {
    pub warehouse_id: Option<i64>,
    pub sku_id: Option<i64>,
    /// Include batches that have been fully drained. Off by default.
    #[serde(default)]
    pub include_empty: bool,
}

pub async fn list_balances(
    State(AppState { db_pool }): State<AppState>,
    Query(query): Query<BalanceListQuery>,
) -> Result<Json<Vec<BalanceResponse>>, AppError> {
    let balances = sqlx::query_as::<_, InventoryBalance>(&format!(
        "SELECT {BALANCE_COLUMNS} FROM inventory_balances \
         WHERE ($1::BIGINT IS NULL OR warehouse_id = $1) \
           AND ($2::BIGINT IS NULL OR sku_id = $2) \
           AND ($3::BOOLEAN OR current_cartons > 0) \
         ORDER BY warehouse_id, sku_id, batch_lot"
    ))
    .bind(query.warehouse_id)
    .bind(query.sku_id)
    .bind(query.include_empty)
    .fetch_all(&db_pool)
    .await?;

    Ok(Json(balances.into_iter().map(Into::into).collect()))
}

#[derive(Deserialize)]
pub struct BalanceSummaryQuery {
    pub warehouse_id: Option<i64>,
}

#[derive(sqlx::FromRow)]
struct SummaryRow {
    total_cartons: i64,
    total_pallets: i64,
    total_units: i64,
    unique_skus: i64,
    total_items: i64,
}

pub async fn balance_summary(
    State(AppState { db_pool }): State<AppState>,
    Query(query): Query<BalanceSummaryQuery>,
) -> Result<Json<BalanceSummaryResponse>, AppError> {
    let row = sqlx::query_as::<_, SummaryRow>(
        "SELECT COALESCE(SUM(current_cartons), 0)::BIGINT AS total_cartons, \
                COALESCE(SUM(current_pallets), 0)::BIGINT AS total_pallets, \
                COALESCE(SUM(current_units), 0)::BIGINT AS total_units, \
                COUNT(DISTINCT sku_id)::BIGINT AS unique_skus, \
                COUNT(*)::BIGINT AS total_items \
         FROM inventory_balances \
         WHERE current_cartons > 0 \
           AND ($1::BIGINT IS NULL OR warehouse_id = $1)",
    )
    .bind(query.warehouse_id)
    .fetch_one(&db_pool)
    .await?;

    Ok(Json(BalanceSummaryResponse {
        total_cartons: row.total_cartons,
        total_pallets: row.total_pallets,
        total_units: row.total_units,
        unique_skus: row.unique_skus,
        total_items: row.total_items,
    }))
}
