use axum::{
    extract::State,
    http::StatusCode,
    Json,
};

use crate::{
    dtos::catalog::*,
    error::AppError,
    models::catalog::{Sku, Warehouse},
    state::AppState,
};

const SKU_COLUMNS: &str =
    "id, sku_code, description, units_per_carton, pack_size, carton_dimensions_cm, created_at";

const WAREHOUSE_COLUMNS: &str = "id, code, name, billing_mode, created_at";

// ==================== SKUs ====================

pub async fn create_sku(
    State(AppState { db_pool }): State<AppState>,
    Json(req): Json<CreateSkuRequest>,
) -> Result<(StatusCode, Json<SkuResponse>), AppError> {
    if req.sku_code.trim().is_empty() {
        return Err(AppError::validation("sku_code must not be empty"));
    }
    if req.units_per_carton <= 0 {
        return Err(AppError::validation("units_per_carton must be positive"));
    }
    if req.pack_size <= 0 {
        return Err(AppError::validation("pack_size must be positive"));
    }

    let sku = sqlx::query_as::<_, Sku>(&format!(
        r#"INSERT INTO skus (sku_code, description, units_per_carton, pack_size, carton_dimensions_cm)
           VALUES ($1, $2, $3, $4, $5)
           RETURNING {SKU_COLUMNS}"#
    ))
    .bind(&req.sku_code)
    .bind(&req.description)
    .bind(req.units_per_carton)
    .bind(req.pack_size)
    .bind(&req.carton_dimensions_cm)
    .fetch_one(&db_pool)
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::conflict(format!("SKU code \"{}\" already exists", req.sku_code))
        }
        _ => AppError::from(e),
    })?;

    Ok((StatusCode::CREATED, Json(sku.into())))
}

pub async fn list_skus(
    State(AppState { db_pool }): State<AppState>,
) -> Result<Json<Vec<SkuResponse>>, AppError> {
    let skus = sqlx::query_as::<_, Sku>(&format!(
        "SELECT {SKU_COLUMNS} FROM skus ORDER BY sku_code"
    ))
    .fetch_all(&db_pool)
    .await?;

    Ok(Json(skus.into_iter().map(Into::into).collect()))
}

// ==================== Warehouses ====================

pub async fn create_warehouse(
    State(AppState { db_pool }): State<AppState>,
    Json(req): Json<CreateWarehouseRequest>,
) -> Result<(StatusCode, Json<WarehouseResponse>), AppError> {
    if req.code.trim().is_empty() || req.name.trim().is_empty() {
        return Err(AppError::validation("code and name must not be empty"));
    }

    let warehouse = sqlx::query_as::<_, Warehouse>(&format!(
        r#"INSERT INTO warehouses (code, name, billing_mode)
           VALUES ($1, $2, $3)
           RETURNING {WAREHOUSE_COLUMNS}"#
    ))
    .bind(&req.code)
    .bind(&req.name)
    .bind(req.billing_mode.as_str())
    .fetch_one(&db_pool)
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::conflict(format!("Warehouse code \"{}\" already exists", req.code))
        }
        _ => AppError::from(e),
    })?;

    Ok((StatusCode::CREATED, Json(warehouse.into())))
}

pub async fn list_warehouses(
    State(AppState { db_pool }): State<AppState>,
) -> Result<Json<Vec<WarehouseResponse>>, AppError> {
    let warehouses = sqlx::query_as::<_, Warehouse>(&format!(
        "SELECT {WAREHOUSE_COLUMNS} FROM warehouses ORDER BY code"
    ))
    .fetch_all(&db_pool)
    .await?;

    Ok(Json(warehouses.into_iter().map(Into::into).collect()))
}
