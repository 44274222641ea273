use axum::{
    routing::{get, post, put},
    Router,
};

use crate::handlers::transaction::{
    amend_transaction, create_transactions, list_transactions, movement_history,
};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/transactions", get(list_transactions).post(create_transactions))
        .route("/transactions/{id}/amend", put(amend_transaction))
        .route(
            "/transactions/history/{warehouse_id}/{sku_id}/{batch_lot}",
            get(movement_history),
        )
}
