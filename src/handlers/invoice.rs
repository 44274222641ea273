use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{PgPool, Postgres, Transaction};

use crate::{
    calc::variance::{category_variances, totals_by_category, within_tolerance},
    dtos::invoice::*,
    error::AppError,
    models::invoice::{Invoice, InvoiceLineItem, InvoiceStatus},
    state::AppState,
};

const INVOICE_COLUMNS: &str = "id, invoice_number, warehouse_id, billing_period_start, \
     billing_period_end, total_amount, status, dispute_reason, payment_method, \
     payment_reference, paid_at, created_at, updated_at";

const LINE_ITEM_COLUMNS: &str =
    "id, invoice_id, cost_category, cost_name, quantity, unit_rate, amount";

// ==================== Create (idempotent by invoice number) ====================

pub async fn create_invoice(
    State(AppState { db_pool }): State<AppState>,
    Json(req): Json<CreateInvoiceRequest>,
) -> Result<(StatusCode, Json<CreateInvoiceResponse>), AppError> {
    if req.invoice_number.trim().is_empty() {
        return Err(AppError::validation("invoice_number must not be empty"));
    }
    if req.line_items.is_empty() {
        return Err(AppError::validation("invoice must carry at least one line item"));
    }
    if req.billing_period_end <= req.billing_period_start {
        return Err(AppError::validation(
            "billing_period_end must fall after billing_period_start",
        ));
    }
    for item in &req.line_items {
        if item.amount < Decimal::ZERO {
            return Err(AppError::validation("line item amounts must not be negative"));
        }
    }

    let total_amount: Decimal = req
        .line_items
        .iter()
        .map(|item| item.amount)
        .sum::<Decimal>()
        .round_dp(2);

    if let Some(existing) = fetch_by_number(&db_pool, &req.invoice_number).await? {
        return replay_or_conflict(&db_pool, existing, &req, total_amount).await;
    }

    let mut tx = db_pool.begin().await?;
    let inserted = insert_invoice(&mut tx, &req, total_amount).await;
    let invoice = match inserted {
        Ok(invoice) => invoice,
        // Lost the race to another submission of the same number; fall back to
        // the replay comparison against whatever won.
        Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
            drop(tx);
            let existing = fetch_by_number(&db_pool, &req.invoice_number)
                .await?
                .ok_or_else(|| AppError::integrity("invoice vanished after duplicate key"))?;
            return replay_or_conflict(&db_pool, existing, &req, total_amount).await;
        }
        Err(e) => return Err(e.into()),
    };

    let mut line_items = Vec::with_capacity(req.line_items.len());
    for item in &req.line_items {
        let row = sqlx::query_as::<_, InvoiceLineItem>(&format!(
            "INSERT INTO invoice_line_items \
             (invoice_id, cost_category, cost_name, quantity, unit_rate, amount) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {LINE_ITEM_COLUMNS}"
        ))
        .bind(invoice.id)
        .bind(item.cost_category.as_str())
        .bind(&item.cost_name)
        .bind(item.quantity)
        .bind(item.unit_rate)
        .bind(item.amount)
        .fetch_one(&mut *tx)
        .await?;
        line_items.push(row);
    }
    tx.commit().await?;

    tracing::info!(
        invoice_number = %req.invoice_number,
        warehouse_id = req.warehouse_id,
        %total_amount,
        "created invoice"
    );

    Ok((
        StatusCode::CREATED,
        Json(CreateInvoiceResponse {
            invoice: InvoiceResponse::from_parts(invoice, line_items),
            idempotent: false,
            message: None,
        }),
    ))
}

async fn insert_invoice(
    tx: &mut Transaction<'_, Postgres>,
    req: &CreateInvoiceRequest,
    total_amount: Decimal,
) -> Result<Invoice, sqlx::Error> {
    sqlx::query_as::<_, Invoice>(&format!(
        "INSERT INTO invoices \
         (invoice_number, warehouse_id, billing_period_start, billing_period_end, total_amount) \
         VALUES ($1, $2, $3, $4, $5) RETURNING {INVOICE_COLUMNS}"
    ))
    .bind(&req.invoice_number)
    .bind(req.warehouse_id)
    .bind(req.billing_period_start)
    .bind(req.billing_period_end)
    .bind(total_amount)
    .fetch_one(&mut **tx)
    .await
}

async fn fetch_by_number(db_pool: &PgPool, number: &str) -> Result<Option<Invoice>, AppError> {
    Ok(sqlx::query_as::<_, Invoice>(&format!(
        "SELECT {INVOICE_COLUMNS} FROM invoices WHERE invoice_number = $1"
    ))
    .bind(number)
    .fetch_optional(db_pool)
    .await?)
}

async fn fetch_line_items(
    db_pool: &PgPool,
    invoice_id: i64,
) -> Result<Vec<InvoiceLineItem>, AppError> {
    Ok(sqlx::query_as::<_, InvoiceLineItem>(&format!(
        "SELECT {LINE_ITEM_COLUMNS} FROM invoice_line_items WHERE invoice_id = $1 ORDER BY id"
    ))
    .bind(invoice_id)
    .fetch_all(db_pool)
    .await?)
}

/// A resubmission under an existing invoice number counts as a replay only
/// when the warehouse, total amount, and line count all match the stored
/// invoice. Anything else under the same number is a conflict.
fn is_replay(
    existing_warehouse_id: i64,
    existing_total: Decimal,
    existing_line_count: usize,
    warehouse_id: i64,
    total: Decimal,
    line_count: usize,
) -> bool {
    existing_warehouse_id == warehouse_id
        && existing_total == total
        && existing_line_count == line_count
}

async fn replay_or_conflict(
    db_pool: &PgPool,
    existing: Invoice,
    req: &CreateInvoiceRequest,
    total_amount: Decimal,
) -> Result<(StatusCode, Json<CreateInvoiceResponse>), AppError> {
    let line_items = fetch_line_items(db_pool, existing.id).await?;
    let matches = is_replay(
        existing.warehouse_id,
        existing.total_amount,
        line_items.len(),
        req.warehouse_id,
        total_amount,
        req.line_items.len(),
    );

    if !matches {
        return Err(AppError::conflict(format!(
            "invoice number \"{}\" already exists with different contents",
            req.invoice_number
        )));
    }

    tracing::info!(invoice_number = %req.invoice_number, "invoice replay ignored");
    Ok((
        StatusCode::OK,
        Json(CreateInvoiceResponse {
            invoice: InvoiceResponse::from_parts(existing, line_items),
            idempotent: true,
            message: Some("Invoice already exists with this number".to_string()),
        }),
    ))
}

// ==================== Queries ====================

#[derive(Deserialize)]
pub struct InvoiceListQuery {
    pub warehouse_id: Option<i64>,
    pub status: Option<String>,
    pub period_start: Option<chrono::NaiveDate>,
    pub period_end: Option<chrono::NaiveDate>,
}

pub async fn list_invoices(
    State(AppState { db_pool }): State<AppState>,
    Query(query): Query<InvoiceListQuery>,
) -> Result<Json<Vec<InvoiceResponse>>, AppError> {
    if let Some(status) = &query.status {
        if InvoiceStatus::parse(status).is_none() {
            return Err(AppError::validation(format!("unknown invoice status \"{status}\"")));
        }
    }

    let invoices = sqlx::query_as::<_, Invoice>(&format!(
        "SELECT {INVOICE_COLUMNS} FROM invoices \
         WHERE ($1::BIGINT IS NULL OR warehouse_id = $1) \
           AND ($2::TEXT IS NULL OR status = $2) \
           AND ($3::DATE IS NULL OR billing_period_start >= $3) \
           AND ($4::DATE IS NULL OR billing_period_end <= $4) \
         ORDER BY billing_period_start DESC, invoice_number"
    ))
    .bind(query.warehouse_id)
    .bind(&query.status)
    .bind(query.period_start)
    .bind(query.period_end)
    .fetch_all(&db_pool)
    .await?;

    let mut responses = Vec::with_capacity(invoices.len());
    for invoice in invoices {
        let line_items = fetch_line_items(&db_pool, invoice.id).await?;
        responses.push(InvoiceResponse::from_parts(invoice, line_items));
    }
    Ok(Json(responses))
}

pub async fn get_invoice(
    State(AppState { db_pool }): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<InvoiceResponse>, AppError> {
    let invoice = sqlx::query_as::<_, Invoice>(&format!(
        "SELECT {INVOICE_COLUMNS} FROM invoices WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(&db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("Invoice not found"))?;

    let line_items = fetch_line_items(&db_pool, invoice.id).await?;
    Ok(Json(InvoiceResponse::from_parts(invoice, line_items)))
}

// ==================== Reconciliation ====================

pub async fn reconcile_invoice(
    State(AppState { db_pool }): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<ReconcileInvoiceRequest>,
) -> Result<Json<ReconcileInvoiceResponse>, AppError> {
    if req.tolerance < Decimal::ZERO {
        return Err(AppError::validation("tolerance must not be negative"));
    }

    let mut tx = db_pool.begin().await?;

    let invoice = lock_invoice(&mut tx, id).await?;
    let status = parse_status(&invoice)?;
    if !status.can_reconcile_or_dispute() {
        return Err(AppError::conflict(format!(
            "invoice is {}; only pending invoices can be reconciled",
            invoice.status
        )));
    }

    let line_items = sqlx::query_as::<_, InvoiceLineItem>(&format!(
        "SELECT {LINE_ITEM_COLUMNS} FROM invoice_line_items WHERE invoice_id = $1 ORDER BY id"
    ))
    .bind(invoice.id)
    .fetch_all(&mut *tx)
    .await?;

    let submitted = totals_by_category(
        line_items
            .iter()
            .map(|item| (item.cost_category.clone(), item.amount)),
    );

    // The engine's own Storage figure for the same warehouse and period comes
    // straight from the weekly ledger. Other categories are compared against
    // zero until the engine calculates them.
    let calculated_storage = sqlx::query_scalar::<_, Decimal>(
        "SELECT COALESCE(SUM(calculated_weekly_cost), 0) FROM storage_ledger_entries \
         WHERE warehouse_id = $1 AND week_ending_date BETWEEN $2 AND $3",
    )
    .bind(invoice.warehouse_id)
    .bind(invoice.billing_period_start)
    .bind(invoice.billing_period_end)
    .fetch_one(&mut *tx)
    .await?;

    let mut calculated = std::collections::BTreeMap::new();
    if calculated_storage != Decimal::ZERO || submitted.contains_key("Storage") {
        calculated.insert("Storage".to_string(), calculated_storage.round_dp(2));
    }

    let variances = category_variances(&submitted, &calculated);
    let reconciled = within_tolerance(&variances, req.tolerance) || req.accept_variance;

    let (invoice, message) = if reconciled {
        let updated = sqlx::query_as::<_, Invoice>(&format!(
            "UPDATE invoices SET status = 'reconciled', updated_at = NOW() \
             WHERE id = $1 RETURNING {INVOICE_COLUMNS}"
        ))
        .bind(invoice.id)
        .fetch_one(&mut *tx)
        .await?;
        let message = if req.accept_variance {
            "Invoice reconciled with accepted variance".to_string()
        } else {
            "Invoice reconciled; all categories within tolerance".to_string()
        };
        (updated, message)
    } else {
        (
            invoice,
            "Variance exceeds tolerance; invoice left pending".to_string(),
        )
    };
    tx.commit().await?;

    tracing::info!(invoice_id = id, reconciled, "reconciliation run completed");

    let line_items = fetch_line_items(&db_pool, invoice.id).await?;
    Ok(Json(ReconcileInvoiceResponse {
        invoice: InvoiceResponse::from_parts(invoice, line_items),
        variances,
        reconciled,
        message,
    }))
}

pub async fn dispute_invoice(
    State(AppState { db_pool }): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<DisputeInvoiceRequest>,
) -> Result<Json<InvoiceResponse>, AppError> {
    let reason = req.reason.trim();
    if reason.is_empty() {
        return Err(AppError::validation("dispute reason must not be empty"));
    }

    let mut tx = db_pool.begin().await?;
    let invoice = lock_invoice(&mut tx, id).await?;
    let status = parse_status(&invoice)?;
    if !status.can_reconcile_or_dispute() {
        return Err(AppError::conflict(format!(
            "invoice is {}; only pending invoices can be disputed",
            invoice.status
        )));
    }

    let updated = sqlx::query_as::<_, Invoice>(&format!(
        "UPDATE invoices SET status = 'disputed', dispute_reason = $1, updated_at = NOW() \
         WHERE id = $2 RETURNING {INVOICE_COLUMNS}"
    ))
    .bind(reason)
    .bind(invoice.id)
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;

    let line_items = fetch_line_items(&db_pool, updated.id).await?;
    Ok(Json(InvoiceResponse::from_parts(updated, line_items)))
}

pub async fn accept_payment(
    State(AppState { db_pool }): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<AcceptPaymentRequest>,
) -> Result<Json<AcceptPaymentResponse>, AppError> {
    if req.payment_method.trim().is_empty() || req.payment_reference.trim().is_empty() {
        return Err(AppError::validation(
            "payment_method and payment_reference must not be empty",
        ));
    }

    let mut tx = db_pool.begin().await?;
    let invoice = lock_invoice(&mut tx, id).await?;
    let status = parse_status(&invoice)?;

    // Replaying the same payment reference against a paid invoice is a no-op.
    if status.is_terminal() {
        if invoice.payment_reference.as_deref() == Some(req.payment_reference.as_str()) {
            let line_items = fetch_line_items(&db_pool, invoice.id).await?;
            return Ok(Json(AcceptPaymentResponse {
                invoice: InvoiceResponse::from_parts(invoice, line_items),
                idempotent: true,
            }));
        }
        return Err(AppError::conflict(
            "invoice is already paid under a different payment reference",
        ));
    }
    if !status.can_accept_payment() {
        return Err(AppError::conflict(format!(
            "invoice is {}; it must be reconciled or disputed before payment",
            invoice.status
        )));
    }

    let updated = sqlx::query_as::<_, Invoice>(&format!(
        "UPDATE invoices SET status = 'paid', payment_method = $1, payment_reference = $2, \
         paid_at = NOW(), updated_at = NOW() WHERE id = $3 RETURNING {INVOICE_COLUMNS}"
    ))
    .bind(&req.payment_method)
    .bind(&req.payment_reference)
    .bind(invoice.id)
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;

    tracing::info!(invoice_id = id, "invoice marked paid");

    let line_items = fetch_line_items(&db_pool, updated.id).await?;
    Ok(Json(AcceptPaymentResponse {
        invoice: InvoiceResponse::from_parts(updated, line_items),
        idempotent: false,
    }))
}

pub async fn delete_invoice(
    State(AppState { db_pool }): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let mut tx = db_pool.begin().await?;
    let invoice = lock_invoice(&mut tx, id).await?;
    let status = parse_status(&invoice)?;
    if status.is_terminal() {
        return Err(AppError::conflict("paid invoices cannot be deleted"));
    }

    // Line items go with it via ON DELETE CASCADE; the storage ledger is
    // untouched.
    sqlx::query("DELETE FROM invoices WHERE id = $1")
        .bind(invoice.id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn lock_invoice(tx: &mut Transaction<'_, Postgres>, id: i64) -> Result<Invoice, AppError> {
    sqlx::query_as::<_, Invoice>(&format!(
        "SELECT {INVOICE_COLUMNS} FROM invoices WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| AppError::not_found("Invoice not found"))
}

fn parse_status(invoice: &Invoice) -> Result<InvoiceStatus, AppError> {
    InvoiceStatus::parse(&invoice.status).ok_or_else(|| {
        AppError::integrity(format!(
            "invoice {} has unknown status \"{}\"",
            invoice.id, invoice.status
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn identical_resubmission_is_a_replay() {
        assert!(is_replay(7, dec!(1234.50), 3, 7, dec!(1234.50), 3));
    }

    #[test]
    fn different_total_under_the_same_number_conflicts() {
        assert!(!is_replay(7, dec!(1234.50), 3, 7, dec!(1234.51), 3));
    }

    #[test]
    fn different_line_count_under_the_same_number_conflicts() {
        assert!(!is_replay(7, dec!(1234.50), 3, 7, dec!(1234.50), 4));
    }

    #[test]
    fn different_warehouse_under_the_same_number_conflicts() {
        assert!(!is_replay(7, dec!(1234.50), 3, 8, dec!(1234.50), 3));
    }
}
