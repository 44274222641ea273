use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::invoice::{
    accept_payment, create_invoice, delete_invoice, dispute_invoice, get_invoice, list_invoices,
    reconcile_invoice,
};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/invoices", get(list_invoices).post(create_invoice))
        .route("/invoices/{id}", get(get_invoice).delete(delete_invoice))
        .route("/invoices/{id}/reconcile", post(reconcile_invoice))
        .route("/invoices/{id}/dispute", post(dispute_invoice))
        .route("/invoices/{id}/payment", post(accept_payment))
}
