use axum::{routing::get, Router};

use crate::handlers::balance::{balance_summary, list_balances};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/balances", get(list_balances))
        .route("/balances/summary", get(balance_summary))
}
