use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use sqlx::{PgPool, Postgres, Transaction};

use crate::{
    calc::resolver::{find_overlapping, resolve_as_of},
    dtos::config::*,
    error::AppError,
    models::config::{CostRate, WarehouseSkuConfig},
    state::AppState,
};

const CONFIG_COLUMNS: &str = "id, warehouse_id, sku_id, storage_cartons_per_pallet, \
     shipping_cartons_per_pallet, max_stacking_height, effective_date, end_date, created_at";

const RATE_COLUMNS: &str = "id, warehouse_id, cost_category, cost_name, cost_value, \
     unit_of_measure, effective_date, end_date, created_at";

/// Stable advisory lock key for a version scope. `FOR UPDATE` on the scope's
/// existing rows locks nothing when the scope is empty, so two concurrent
/// first-version creations would both pass the overlap check; the advisory
/// lock serializes them regardless of row count. FNV-1a over the
/// NUL-separated parts, stable across processes.
fn scope_lock_key(parts: &[&str]) -> i64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for part in parts {
        for byte in part.as_bytes().iter().chain(std::iter::once(&0u8)) {
            hash ^= u64::from(*byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
    }
    hash as i64
}

async fn lock_scope(
    tx: &mut Transaction<'_, Postgres>,
    parts: &[&str],
) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(scope_lock_key(parts))
        .execute(&mut **tx)
        .await?;
    Ok(())
}

fn format_interval(effective_date: NaiveDate, end_date: Option<NaiveDate>) -> String {
    match end_date {
        Some(end) => format!("{} to {}", effective_date, end),
        None => format!("{} onwards (open-ended)", effective_date),
    }
}

fn validate_interval(effective_date: NaiveDate, end_date: Option<NaiveDate>) -> Result<(), AppError> {
    if let Some(end) = end_date {
        if end < effective_date {
            return Err(AppError::validation(
                "end_date must not be before effective_date",
            ));
        }
    }
    Ok(())
}

// ==================== Warehouse/SKU Pallet Configurations ====================

async fn config_versions(
    db_pool: &PgPool,
    warehouse_id: i64,
    sku_id: i64,
) -> Result<Vec<WarehouseSkuConfig>, sqlx::Error> {
    sqlx::query_as::<_, WarehouseSkuConfig>(&format!(
        r#"SELECT {CONFIG_COLUMNS} FROM warehouse_sku_configs
           WHERE warehouse_id = $1 AND sku_id = $2
           ORDER BY effective_date"#
    ))
    .bind(warehouse_id)
    .bind(sku_id)
    .fetch_all(db_pool)
    .await
}

pub async fn create_config(
    State(AppState { db_pool }): State<AppState>,
    Json(req): Json<CreateWarehouseSkuConfigRequest>,
) -> Result<(StatusCode, Json<WarehouseSkuConfigResponse>), AppError> {
    if req.storage_cartons_per_pallet <= 0 || req.shipping_cartons_per_pallet <= 0 {
        return Err(AppError::validation(
            "cartons-per-pallet values must be positive",
        ));
    }
    validate_interval(req.effective_date, req.end_date)?;

    let mut tx = db_pool.begin().await?;

    // Serialize creations on the scope so two concurrent ones cannot both
    // pass the overlap check.
    lock_scope(
        &mut tx,
        &[
            "warehouse_sku_configs",
            &req.warehouse_id.to_string(),
            &req.sku_id.to_string(),
        ],
    )
    .await?;

    let versions = sqlx::query_as::<_, WarehouseSkuConfig>(&format!(
        r#"SELECT {CONFIG_COLUMNS} FROM warehouse_sku_configs
           WHERE warehouse_id = $1 AND sku_id = $2
           ORDER BY effective_date"#
    ))
    .bind(req.warehouse_id)
    .bind(req.sku_id)
    .fetch_all(&mut *tx)
    .await?;

    if let Some(existing) = find_overlapping(&versions, req.effective_date, req.end_date) {
        return Err(AppError::validation(format!(
            "an active pallet configuration already exists for this warehouse/SKU from {}; supersede it by setting its end_date first",
            format_interval(existing.effective_date, existing.end_date)
        )));
    }

    let config = sqlx::query_as::<_, WarehouseSkuConfig>(&format!(
        r#"INSERT INTO warehouse_sku_configs
           (warehouse_id, sku_id, storage_cartons_per_pallet, shipping_cartons_per_pallet,
            max_stacking_height, effective_date, end_date)
           VALUES ($1, $2, $3, $4, $5, $6, $7)
           RETURNING {CONFIG_COLUMNS}"#
    ))
    .bind(req.warehouse_id)
    .bind(req.sku_id)
    .bind(req.storage_cartons_per_pallet)
    .bind(req.shipping_cartons_per_pallet)
    .bind(req.max_stacking_height)
    .bind(req.effective_date)
    .bind(req.end_date)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(config.into())))
}

pub async fn list_configs(
    State(AppState { db_pool }): State<AppState>,
    Query(params): Query<std::collections::HashMap<String, String>>,
) -> Result<Json<Vec<WarehouseSkuConfigResponse>>, AppError> {
    let warehouse_id: Option<i64> = params.get("warehouse_id").and_then(|v| v.parse().ok());
    let sku_id: Option<i64> = params.get("sku_id").and_then(|v| v.parse().ok());

    let configs = sqlx::query_as::<_, WarehouseSkuConfig>(&format!(
        r#"SELECT {CONFIG_COLUMNS} FROM warehouse_sku_configs
           WHERE ($1::BIGINT IS NULL OR warehouse_id = $1)
             AND ($2::BIGINT IS NULL OR sku_id = $2)
           ORDER BY warehouse_id, sku_id, effective_date"#
    ))
    .bind(warehouse_id)
    .bind(sku_id)
    .fetch_all(&db_pool)
    .await?;

    Ok(Json(configs.into_iter().map(Into::into).collect()))
}

/// Boolean overlap check surfaced to the configuration maintenance surface
/// before it commits a new version.
pub async fn check_config_overlap(
    State(AppState { db_pool }): State<AppState>,
    Query(query): Query<ConfigOverlapQuery>,
) -> Result<Json<OverlapCheckResponse>, AppError> {
    validate_interval(query.effective_date, query.end_date)?;
    let versions = config_versions(&db_pool, query.warehouse_id, query.sku_id).await?;
    let overlapping = find_overlapping(&versions, query.effective_date, query.end_date);

    Ok(Json(OverlapCheckResponse {
        overlap: overlapping.is_some(),
        message: overlapping.map(|existing| {
            format!(
                "proposed interval intersects the version effective {}",
                format_interval(existing.effective_date, existing.end_date)
            )
        }),
    }))
}

/// Pure as-of-date resolution. "No active configuration" is a 404 the caller
/// may fall back from; overlapping versions are an integrity fault.
pub async fn resolve_config(
    State(AppState { db_pool }): State<AppState>,
    Query(query): Query<ConfigResolveQuery>,
) -> Result<Json<WarehouseSkuConfigResponse>, AppError> {
    let versions = config_versions(&db_pool, query.warehouse_id, query.sku_id).await?;
    let resolved = resolve_as_of(&versions, query.as_of)
        .map_err(|e| AppError::integrity(e.to_string()))?
        .ok_or_else(|| {
            AppError::not_found(format!(
                "no pallet configuration active on {} for this warehouse/SKU",
                query.as_of
            ))
        })?;

    Ok(Json(WarehouseSkuConfigResponse {
        id: resolved.id,
        warehouse_id: resolved.warehouse_id,
        sku_id: resolved.sku_id,
        storage_cartons_per_pallet: resolved.storage_cartons_per_pallet,
        shipping_cartons_per_pallet: resolved.shipping_cartons_per_pallet,
        max_stacking_height: resolved.max_stacking_height,
        effective_date: resolved.effective_date,
        end_date: resolved.end_date,
        created_at: resolved.created_at,
    }))
}

// ==================== Cost Rates ====================

async fn rate_versions(
    db_pool: &PgPool,
    warehouse_id: i64,
    cost_category: &str,
    cost_name: &str,
) -> Result<Vec<CostRate>, sqlx::Error> {
    sqlx::query_as::<_, CostRate>(&format!(
        r#"SELECT {RATE_COLUMNS} FROM cost_rates
           WHERE warehouse_id = $1 AND cost_category = $2 AND cost_name = $3
           ORDER BY effective_date"#
    ))
    .bind(warehouse_id)
    .bind(cost_category)
    .bind(cost_name)
    .fetch_all(db_pool)
    .await
}

async fn rate_versions_in_tx(
    tx: &mut Transaction<'_, Postgres>,
    warehouse_id: i64,
    cost_category: &str,
    cost_name: &str,
) -> Result<Vec<CostRate>, sqlx::Error> {
    sqlx::query_as::<_, CostRate>(&format!(
        r#"SELECT {RATE_COLUMNS} FROM cost_rates
           WHERE warehouse_id = $1 AND cost_category = $2 AND cost_name = $3
           ORDER BY effective_date"#
    ))
    .bind(warehouse_id)
    .bind(cost_category)
    .bind(cost_name)
    .fetch_all(&mut **tx)
    .await
}

pub async fn create_rate(
    State(AppState { db_pool }): State<AppState>,
    Json(req): Json<CreateCostRateRequest>,
) -> Result<(StatusCode, Json<CostRateResponse>), AppError> {
    if req.cost_name.trim().is_empty() {
        return Err(AppError::validation("cost_name must not be empty"));
    }
    if req.cost_value <= rust_decimal::Decimal::ZERO {
        return Err(AppError::validation("cost_value must be positive"));
    }
    validate_interval(req.effective_date, req.end_date)?;

    let mut tx = db_pool.begin().await?;

    lock_scope(
        &mut tx,
        &[
            "cost_rates",
            &req.warehouse_id.to_string(),
            req.cost_category.as_str(),
            &req.cost_name,
        ],
    )
    .await?;

    let versions = rate_versions_in_tx(
        &mut tx,
        req.warehouse_id,
        req.cost_category.as_str(),
        &req.cost_name,
    )
    .await?;

    if let Some(existing) = find_overlapping(&versions, req.effective_date, req.end_date) {
        return Err(AppError::validation(format!(
            "an active rate already exists for \"{}\" from {}; supersede it by setting its end_date first",
            req.cost_name,
            format_interval(existing.effective_date, existing.end_date)
        )));
    }

    let rate = sqlx::query_as::<_, CostRate>(&format!(
        r#"INSERT INTO cost_rates
           (warehouse_id, cost_category, cost_name, cost_value, unit_of_measure,
            effective_date, end_date)
           VALUES ($1, $2, $3, $4, $5, $6, $7)
           RETURNING {RATE_COLUMNS}"#
    ))
    .bind(req.warehouse_id)
    .bind(req.cost_category.as_str())
    .bind(&req.cost_name)
    .bind(req.cost_value)
    .bind(&req.unit_of_measure)
    .bind(req.effective_date)
    .bind(req.end_date)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(rate.into())))
}

pub async fn list_rates(
    State(AppState { db_pool }): State<AppState>,
    Query(params): Query<std::collections::HashMap<String, String>>,
) -> Result<Json<Vec<CostRateResponse>>, AppError> {
    let warehouse_id: Option<i64> = params.get("warehouse_id").and_then(|v| v.parse().ok());
    let cost_category = match params.get("cost_category") {
        Some(raw) => Some(
            crate::models::config::CostCategory::parse(raw)
                .ok_or_else(|| AppError::validation(format!("unknown cost category \"{raw}\"")))?,
        ),
        None => None,
    };
    let active_only = params.get("active_only").map(|v| v == "true").unwrap_or(false);

    let rates = sqlx::query_as::<_, CostRate>(&format!(
        r#"SELECT {RATE_COLUMNS} FROM cost_rates
           WHERE ($1::BIGINT IS NULL OR warehouse_id = $1)
             AND ($2::TEXT IS NULL OR cost_category = $2)
             AND (NOT $3 OR (effective_date <= CURRENT_DATE
                             AND (end_date IS NULL OR end_date >= CURRENT_DATE)))
           ORDER BY warehouse_id, cost_category, cost_name, effective_date"#
    ))
    .bind(warehouse_id)
    .bind(cost_category.map(|c| c.as_str()))
    .bind(active_only)
    .fetch_all(&db_pool)
    .await?;

    Ok(Json(rates.into_iter().map(Into::into).collect()))
}

pub async fn check_rate_overlap(
    State(AppState { db_pool }): State<AppState>,
    Query(query): Query<RateOverlapQuery>,
) -> Result<Json<OverlapCheckResponse>, AppError> {
    validate_interval(query.effective_date, query.end_date)?;
    let versions = rate_versions(
        &db_pool,
        query.warehouse_id,
        query.cost_category.as_str(),
        &query.cost_name,
    )
    .await?;
    let overlapping = find_overlapping(&versions, query.effective_date, query.end_date);

    Ok(Json(OverlapCheckResponse {
        overlap: overlapping.is_some(),
        message: overlapping.map(|existing| {
            format!(
                "proposed interval intersects the version effective {}",
                format_interval(existing.effective_date, existing.end_date)
            )
        }),
    }))
}

pub async fn resolve_rate(
    State(AppState { db_pool }): State<AppState>,
    Query(query): Query<RateResolveQuery>,
) -> Result<Json<CostRateResponse>, AppError> {
    let versions = rate_versions(
        &db_pool,
        query.warehouse_id,
        query.cost_category.as_str(),
        &query.cost_name,
    )
    .await?;
    let resolved = resolve_as_of(&versions, query.as_of)
        .map_err(|e| AppError::integrity(e.to_string()))?
        .ok_or_else(|| {
            AppError::not_found(format!(
                "no \"{}\" rate active on {} for this warehouse",
                query.cost_name, query.as_of
            ))
        })?;

    Ok(Json(CostRateResponse {
        id: resolved.id,
        warehouse_id: resolved.warehouse_id,
        cost_category: resolved.cost_category.clone(),
        cost_name: resolved.cost_name.clone(),
        cost_value: resolved.cost_value,
        unit_of_measure: resolved.unit_of_measure.clone(),
        effective_date: resolved.effective_date,
        end_date: resolved.end_date,
        created_at: resolved.created_at,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_lock_key_is_stable() {
        let parts = ["warehouse_sku_configs", "7", "42"];
        assert_eq!(scope_lock_key(&parts), scope_lock_key(&parts));
    }

    #[test]
    fn distinct_scopes_get_distinct_keys() {
        let config_scope = scope_lock_key(&["warehouse_sku_configs", "7", "42"]);
        let other_sku = scope_lock_key(&["warehouse_sku_configs", "7", "43"]);
        let rate_scope = scope_lock_key(&["cost_rates", "7", "Storage", "pallet"]);
        assert_ne!(config_scope, other_sku);
        assert_ne!(config_scope, rate_scope);
    }

    #[test]
    fn part_boundaries_are_unambiguous() {
        // "ab" + "c" must not collide with "a" + "bc"
        assert_ne!(scope_lock_key(&["ab", "c"]), scope_lock_key(&["a", "bc"]));
    }
}
