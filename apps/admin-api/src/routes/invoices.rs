//! # Invoice Routes
//!
//! Users only ever see their own invoices; someone else's invoice answers
//! 404 exactly like a missing one. Status changes and deletes are admin-only.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use facturo_core::invoice::render_invoice_text;
use facturo_core::validation::validate_new_invoice;
use facturo_core::{Customer, Invoice, InvoiceStatus, InvoiceTotals, NewInvoice, Principal};

use crate::error::{ApiError, ApiResult};
use crate::extract::CurrentUser;
use crate::state::AppState;

/// An invoice with the figures and customer block the UI shows next to it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceView {
    #[serde(flatten)]
    pub invoice: Invoice,
    pub totals: InvoiceTotals,
    /// Pending past the due date reads as Overdue.
    pub effective_status: InvoiceStatus,
    pub customer: Customer,
}

impl InvoiceView {
    pub fn new(invoice: Invoice, customer: Customer, today: NaiveDate) -> Self {
        InvoiceView {
            totals: invoice.totals(),
            effective_status: invoice.effective_status(today),
            invoice,
            customer,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    customer_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: InvoiceStatus,
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<InvoiceView>>> {
    let scope = state
        .policy
        .invoice_scope(&user.principal, query.customer_id.as_deref());
    let invoices = state.db.invoices().list(scope.as_deref()).await?;

    let mut ids: Vec<String> = invoices.iter().map(|i| i.customer_id.clone()).collect();
    ids.sort();
    ids.dedup();
    let customers = state.db.customers().get_many(&ids).await?;

    let today = Utc::now().date_naive();
    let views = invoices
        .into_iter()
        .map(|invoice| {
            let customer = customers
                .get(&invoice.customer_id)
                .cloned()
                .unwrap_or_else(|| Customer::placeholder(&invoice.customer_id));
            InvoiceView::new(invoice, customer, today)
        })
        .collect();

    Ok(Json(views))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Json(req): Json<NewInvoice>,
) -> ApiResult<(StatusCode, Json<InvoiceView>)> {
    validate_new_invoice(&req)?;
    state
        .policy
        .authorize_invoice_create(&user.principal, &req.customer_id)?;

    let customer = state
        .db
        .customers()
        .get_by_id(&req.customer_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Customer", &req.customer_id))?;

    let invoice = state.db.invoices().create(req, state.invoice_defaults).await?;
    info!(id = %invoice.id, by = %user.principal.uid, "Invoice created via API");

    let view = InvoiceView::new(invoice, customer, Utc::now().date_naive());
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn get(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<InvoiceView>> {
    let invoice = load_visible(&state, &user.principal, &id).await?;
    let customer = customer_or_placeholder(&state, &invoice.customer_id).await?;
    Ok(Json(InvoiceView::new(invoice, customer, Utc::now().date_naive())))
}

/// Plain-text rendering for printing.
pub async fn print(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let invoice = load_visible(&state, &user.principal, &id).await?;
    let customer = customer_or_placeholder(&state, &invoice.customer_id).await?;
    let text = render_invoice_text(&invoice, &customer, Utc::now().date_naive());

    Ok(([(CONTENT_TYPE, "text/plain; charset=utf-8")], text))
}

pub async fn set_status(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(update): Json<StatusUpdate>,
) -> ApiResult<Json<InvoiceView>> {
    state
        .policy
        .require_admin(&user.principal, "change invoice status")?;

    let invoice = state.db.invoices().set_status(&id, update.status).await?;
    let customer = customer_or_placeholder(&state, &invoice.customer_id).await?;
    Ok(Json(InvoiceView::new(invoice, customer, Utc::now().date_naive())))
}

/// The "mark as paid" action. Idempotent: an already paid invoice is
/// returned as is.
pub async fn mark_paid(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<InvoiceView>> {
    state.policy.require_admin(&user.principal, "mark invoices as paid")?;

    let mut invoice = state
        .db
        .invoices()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Invoice", &id))?;

    if invoice.mark_paid(Utc::now()) {
        invoice = state.db.invoices().set_status(&id, invoice.status).await?;
        info!(id = %id, by = %user.principal.uid, "Invoice marked as paid");
    }

    let customer = customer_or_placeholder(&state, &invoice.customer_id).await?;
    Ok(Json(InvoiceView::new(invoice, customer, Utc::now().date_naive())))
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.policy.require_admin(&user.principal, "delete invoices")?;

    state.db.invoices().delete(&id).await?;
    info!(id = %id, by = %user.principal.uid, "Invoice deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn load_visible(state: &AppState, principal: &Principal, id: &str) -> ApiResult<Invoice> {
    let invoice = state.db.invoices().get_by_id(id).await?;
    invoice
        .and_then(|invoice| state.policy.guard_invoice(principal, invoice))
        .ok_or_else(|| ApiError::not_found("Invoice", id))
}

async fn customer_or_placeholder(state: &AppState, customer_id: &str) -> ApiResult<Customer> {
    Ok(state
        .db
        .customers()
        .get_by_id(customer_id)
        .await?
        .unwrap_or_else(|| Customer::placeholder(customer_id)))
}
