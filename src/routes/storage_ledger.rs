use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::ledger::{
    aggregate_period, aggregate_week, list_ledger_entries, weekly_cost_trend,
};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/storage-ledger", get(list_ledger_entries))
        .route("/storage-ledger/aggregate-week", post(aggregate_week))
        .route("/storage-ledger/aggregate-period", post(aggregate_period))
        .route("/storage-ledger/trend", get(weekly_cost_trend))
}
