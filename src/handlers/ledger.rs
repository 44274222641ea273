use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{Duration, NaiveDate};
use serde::Deserialize;
use sqlx::{Postgres, Transaction};

use crate::{
    calc::balance::replay_balance,
    calc::calendar::{billing_period, billing_period_for, mondays_between, week_ending},
    calc::pallets::cubic_feet_per_carton,
    calc::resolver::resolve_as_of,
    calc::storage::{weekly_charge, StorageBasis},
    dtos::ledger::*,
    error::AppError,
    models::catalog::BillingMode,
    models::config::{CostRate, WarehouseSkuConfig},
    models::ledger::StorageLedgerEntry,
    state::AppState,
};

const LEDGER_COLUMNS: &str = "id, warehouse_id, sku_id, batch_lot, week_ending_date, \
     cartons_end_of_week, quantity_charged, storage_unit, applicable_weekly_rate, \
     calculated_weekly_cost, billing_period_start, billing_period_end, updated_at";

// ==================== Aggregation ====================

/// Rebuilds the storage ledger for one Monday-to-Sunday week. Rerunning is
/// safe: existing rows for the week are overwritten in place.
pub async fn aggregate_week(
    State(AppState { db_pool }): State<AppState>,
    Json(req): Json<AggregateWeekRequest>,
) -> Result<Json<AggregateResponse>, AppError> {
    let mode = warehouse_billing_mode(&db_pool, req.warehouse_id).await?;
    let week_end = week_ending(req.week_ending_date);
    let period = billing_period_for(week_end)
        .ok_or_else(|| AppError::integrity("no billing period covers this week"))?;

    let mut warnings = Vec::new();
    let mut tx = db_pool.begin().await?;
    let upserted =
        aggregate_week_into(&mut tx, req.warehouse_id, mode, week_end, period, &mut warnings)
            .await?;
    tx.commit().await?;

    tracing::info!(
        warehouse_id = req.warehouse_id,
        week_ending = %week_end,
        entries = upserted,
        "aggregated storage ledger week"
    );

    Ok(Json(AggregateResponse {
        entries_upserted: upserted,
        warnings,
    }))
}

/// Rebuilds the storage ledger for every week of a 16th-to-15th billing
/// period, atomically.
pub async fn aggregate_period(
    State(AppState { db_pool }): State<AppState>,
    Json(req): Json<AggregatePeriodRequest>,
) -> Result<Json<AggregateResponse>, AppError> {
    let mode = warehouse_billing_mode(&db_pool, req.warehouse_id).await?;
    let period = billing_period(req.year, req.month)
        .ok_or_else(|| AppError::validation("invalid billing period year or month"))?;

    let mut warnings = Vec::new();
    let mut upserted = 0usize;
    let mut tx = db_pool.begin().await?;
    for monday in mondays_between(period.0, period.1) {
        let week_end = monday + Duration::days(6);
        upserted +=
            aggregate_week_into(&mut tx, req.warehouse_id, mode, week_end, period, &mut warnings)
                .await?;
    }
    tx.commit().await?;

    tracing::info!(
        warehouse_id = req.warehouse_id,
        period_start = %period.0,
        period_end = %period.1,
        entries = upserted,
        "aggregated storage ledger billing period"
    );

    Ok(Json(AggregateResponse {
        entries_upserted: upserted,
        warnings,
    }))
}

async fn warehouse_billing_mode(
    db_pool: &sqlx::PgPool,
    warehouse_id: i64,
) -> Result<BillingMode, AppError> {
    let mode = sqlx::query_scalar::<_, String>("SELECT billing_mode FROM warehouses WHERE id = $1")
        .bind(warehouse_id)
        .fetch_optional(db_pool)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Warehouse {warehouse_id} not found")))?;

    BillingMode::parse(&mode).ok_or_else(|| {
        AppError::integrity(format!(
            "warehouse {warehouse_id} has unknown billing mode \"{mode}\""
        ))
    })
}

#[derive(sqlx::FromRow)]
struct ScopeRow {
    sku_id: i64,
    batch_lot: String,
}

#[derive(sqlx::FromRow)]
struct MovementRow {
    cartons_in: i32,
    cartons_out: i32,
}

async fn aggregate_week_into(
    tx: &mut Transaction<'_, Postgres>,
    warehouse_id: i64,
    mode: BillingMode,
    week_end: NaiveDate,
    period: (NaiveDate, NaiveDate),
    warnings: &mut Vec<String>,
) -> Result<usize, AppError> {
    // The Storage rate applicable to this warehouse's billing mode, as of the
    // week ending. Two live versions is a configuration fault, not a
    // tie to break.
    let rates = sqlx::query_as::<_, CostRate>(
        "SELECT id, warehouse_id, cost_category, cost_name, cost_value, unit_of_measure, \
           effective_date, end_date, created_at \
         FROM cost_rates \
         WHERE warehouse_id = $1 AND cost_category = 'Storage' \
           AND cost_name ILIKE '%' || $2 || '%' \
         ORDER BY effective_date",
    )
    .bind(warehouse_id)
    .bind(mode.storage_rate_name())
    .fetch_all(&mut **tx)
    .await?;

    let rate = match resolve_as_of(&rates, week_end) {
        Ok(Some(rate)) => rate.cost_value,
        Ok(None) => {
            let warning = format!(
                "no Storage rate named for \"{}\" is effective on {week_end}; week skipped",
                mode.storage_rate_name()
            );
            tracing::warn!(warehouse_id, "{warning}");
            warnings.push(warning);
            return Ok(0);
        }
        Err(e) => return Err(AppError::integrity(e.to_string())),
    };

    let scopes = sqlx::query_as::<_, ScopeRow>(
        "SELECT DISTINCT sku_id, batch_lot FROM inventory_transactions \
         WHERE warehouse_id = $1 AND transaction_date <= $2",
    )
    .bind(warehouse_id)
    .bind(week_end)
    .fetch_all(&mut **tx)
    .await?;

    let mut upserted = 0usize;
    for scope in scopes {
        let movements = sqlx::query_as::<_, MovementRow>(
            "SELECT cartons_in, cartons_out FROM inventory_transactions \
             WHERE warehouse_id = $1 AND sku_id = $2 AND batch_lot = $3 \
               AND transaction_date <= $4 \
             ORDER BY transaction_date, id",
        )
        .bind(warehouse_id)
        .bind(scope.sku_id)
        .bind(&scope.batch_lot)
        .bind(week_end)
        .fetch_all(&mut **tx)
        .await?;

        let cartons = replay_balance(movements.iter().map(|m| (m.cartons_in, m.cartons_out)));
        if cartons == 0 {
            continue;
        }

        let basis = match mode {
            BillingMode::PalletWeek => {
                match pallet_basis_for(tx, warehouse_id, scope.sku_id, &scope.batch_lot, week_end)
                    .await?
                {
                    Ok(cartons_per_pallet) => StorageBasis::PalletWeek { cartons_per_pallet },
                    Err(warning) => {
                        tracing::warn!(warehouse_id, sku_id = scope.sku_id, "{warning}");
                        warnings.push(warning);
                        continue;
                    }
                }
            }
            BillingMode::CubicFootMonth => {
                let dimensions = sqlx::query_scalar::<_, Option<String>>(
                    "SELECT carton_dimensions_cm FROM skus WHERE id = $1",
                )
                .bind(scope.sku_id)
                .fetch_one(&mut **tx)
                .await?;
                StorageBasis::CubicFootMonth {
                    cubic_feet_per_carton: cubic_feet_per_carton(dimensions.as_deref()),
                }
            }
        };

        let charge = weekly_charge(cartons, basis, rate);

        sqlx::query(
            "INSERT INTO storage_ledger_entries \
             (warehouse_id, sku_id, batch_lot, week_ending_date, cartons_end_of_week, \
              quantity_charged, storage_unit, applicable_weekly_rate, calculated_weekly_cost, \
              billing_period_start, billing_period_end) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             ON CONFLICT (warehouse_id, sku_id, batch_lot, week_ending_date) DO UPDATE SET \
               cartons_end_of_week = EXCLUDED.cartons_end_of_week, \
               quantity_charged = EXCLUDED.quantity_charged, \
               storage_unit = EXCLUDED.storage_unit, \
               applicable_weekly_rate = EXCLUDED.applicable_weekly_rate, \
               calculated_weekly_cost = EXCLUDED.calculated_weekly_cost, \
               billing_period_start = EXCLUDED.billing_period_start, \
               billing_period_end = EXCLUDED.billing_period_end, \
               updated_at = NOW()",
        )
        .bind(warehouse_id)
        .bind(scope.sku_id)
        .bind(&scope.batch_lot)
        .bind(week_end)
        .bind(cartons)
        .bind(charge.quantity_charged)
        .bind(charge.storage_unit)
        .bind(charge.applicable_weekly_rate)
        .bind(charge.calculated_weekly_cost)
        .bind(period.0)
        .bind(period.1)
        .execute(&mut **tx)
        .await?;

        upserted += 1;
    }

    Ok(upserted)
}

/// Cartons-per-pallet for a scope's weekly snapshot: the configuration in
/// effect at the week ending, else the basis the batch's movements were
/// recorded with.
async fn pallet_basis_for(
    tx: &mut Transaction<'_, Postgres>,
    warehouse_id: i64,
    sku_id: i64,
    batch_lot: &str,
    week_end: NaiveDate,
) -> Result<Result<i32, String>, AppError> {
    let configs = sqlx::query_as::<_, WarehouseSkuConfig>(
        "SELECT id, warehouse_id, sku_id, storage_cartons_per_pallet, \
           shipping_cartons_per_pallet, max_stacking_height, effective_date, end_date, created_at \
         FROM warehouse_sku_configs WHERE warehouse_id = $1 AND sku_id = $2 \
         ORDER BY effective_date",
    )
    .bind(warehouse_id)
    .bind(sku_id)
    .fetch_all(&mut **tx)
    .await?;

    let resolved = resolve_as_of(&configs, week_end).map_err(|e| AppError::integrity(e.to_string()))?;
    if let Some(config) = resolved {
        if config.storage_cartons_per_pallet > 0 {
            return Ok(Ok(config.storage_cartons_per_pallet));
        }
    }

    let recorded = sqlx::query_scalar::<_, Option<i32>>(
        "SELECT storage_cartons_per_pallet FROM inventory_transactions \
         WHERE warehouse_id = $1 AND sku_id = $2 AND batch_lot = $3 \
           AND transaction_date <= $4 AND storage_cartons_per_pallet IS NOT NULL \
         ORDER BY transaction_date DESC, id DESC LIMIT 1",
    )
    .bind(warehouse_id)
    .bind(sku_id)
    .bind(batch_lot)
    .bind(week_end)
    .fetch_optional(&mut **tx)
    .await?
    .flatten();

    match recorded {
        Some(cpp) if cpp > 0 => Ok(Ok(cpp)),
        _ => Ok(Err(format!(
            "missing pallet basis for SKU {sku_id} batch \"{batch_lot}\" in week ending {week_end}; scope skipped"
        ))),
    }
}

// ==================== Queries ====================

#[derive(Deserialize)]
pub struct LedgerListQuery {
    pub warehouse_id: Option<i64>,
    pub sku_id: Option<i64>,
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
}

pub async fn list_ledger_entries(
    State(AppState { db_pool }): State<AppState>,
    Query(query): Query<LedgerListQuery>,
) -> Result<Json<Vec<StorageLedgerEntryResponse>>, AppError> {
    let entries = sqlx::query_as::<_, StorageLedgerEntry>(&format!(
        "SELECT {LEDGER_COLUMNS} FROM storage_ledger_entries \
         WHERE ($1::BIGINT IS NULL OR warehouse_id = $1) \
           AND ($2::BIGINT IS NULL OR sku_id = $2) \
           AND ($3::DATE IS NULL OR week_ending_date >= $3) \
           AND ($4::DATE IS NULL OR week_ending_date <= $4) \
         ORDER BY week_ending_date, sku_id, batch_lot"
    ))
    .bind(query.warehouse_id)
    .bind(query.sku_id)
    .bind(query.period_start)
    .bind(query.period_end)
    .fetch_all(&db_pool)
    .await?;

    Ok(Json(entries.into_iter().map(Into::into).collect()))
}

#[derive(sqlx::FromRow)]
struct TrendRow {
    week_ending_date: NaiveDate,
    total_quantity_charged: i64,
    total_weekly_cost: rust_decimal::Decimal,
}

pub async fn weekly_cost_trend(
    State(AppState { db_pool }): State<AppState>,
    Query(query): Query<LedgerListQuery>,
) -> Result<Json<Vec<WeeklyCostPoint>>, AppError> {
    let rows = sqlx::query_as::<_, TrendRow>(
        "SELECT week_ending_date, \
                COALESCE(SUM(quantity_charged), 0)::BIGINT AS total_quantity_charged, \
                COALESCE(SUM(calculated_weekly_cost), 0) AS total_weekly_cost \
         FROM storage_ledger_entries \
         WHERE ($1::BIGINT IS NULL OR warehouse_id = $1) \
           AND ($2::BIGINT IS NULL OR sku_id = $2) \
           AND ($3::DATE IS NULL OR week_ending_date >= $3) \
           AND ($4::DATE IS NULL OR week_ending_date <= $4) \
         GROUP BY week_ending_date ORDER BY week_ending_date",
    )
    .bind(query.warehouse_id)
    .bind(query.sku_id)
    .bind(query.period_start)
    .bind(query.period_end)
    .fetch_all(&db_pool)
    .await?;

    Ok(Json(
        rows.into_iter()
            .map(|r| WeeklyCostPoint {
                week_ending_date: r.week_ending_date,
                total_quantity_charged: r.total_quantity_charged,
                total_weekly_cost: r.total_weekly_cost,
            })
            .collect(),
    ))
}
