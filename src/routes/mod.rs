pub mod balances;
pub mod catalog;
pub mod configs;
pub mod invoices;
pub mod storage_ledger;
pub mod transactions;

use axum::Router;
use crate::state::AppState;

pub fn create_router() -> Router<AppState> {
    Router::new()
        .merge(catalog::routes())
        .merge(configs::routes())
        .merge(transactions::routes())
        .merge(balances::routes())
        .merge(storage_ledger::routes())
        .merge(invoices::routes())
}
