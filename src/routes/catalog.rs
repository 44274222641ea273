use axum::{routing::get, Router};

use crate::handlers::catalog::{create_sku, create_warehouse, list_skus, list_warehouses};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/skus", get(list_skus).post(create_sku))
        .route("/warehouses", get(list_warehouses).post(create_warehouse))
}
