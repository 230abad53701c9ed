use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;

use facturo_core::PaymentMethod;

use crate::error::ApiResult;
use crate::extract::CurrentUser;
use crate::routes::invoices::InvoiceView;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub payment_method: PaymentMethod,
}

/// Simulated payment: the saved cart becomes a Paid invoice, stock is
/// decremented and the cart is cleared, all in one transaction.
pub async fn checkout(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Json(req): Json<CheckoutRequest>,
) -> ApiResult<(StatusCode, Json<InvoiceView>)> {
    let invoice = state
        .db
        .invoices()
        .checkout(&user.principal.uid, req.payment_method, state.invoice_defaults)
        .await?;

    let view = InvoiceView::new(invoice, user.customer, Utc::now().date_naive());
    Ok((StatusCode::CREATED, Json(view)))
}
