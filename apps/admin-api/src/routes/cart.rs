//! The caller's saved cart.
//!
//! Every mutation loads the cart, applies the change through
//! [`facturo_core::Cart`], and saves only when something changed. Invalid
//! quantities are ignored rather than rejected, so these endpoints answer
//! with the (possibly unchanged) cart.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use facturo_core::cart::parse_quantity;
use facturo_core::{Cart, CartItem, CartSummary};

use crate::error::{ApiError, ApiResult};
use crate::extract::CurrentUser;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub items: Vec<CartItem>,
    pub summary: CartSummary,
}

impl From<Cart> for CartView {
    fn from(cart: Cart) -> Self {
        let summary = CartSummary::from(&cart);
        CartView {
            items: cart.into_items(),
            summary,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItem {
    pub product_id: String,
    /// Defaults to 1. Kept raw so a non-numeric value is a no-op.
    #[serde(default)]
    pub quantity: Option<Value>,
}

pub async fn get_cart(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> ApiResult<Json<CartView>> {
    let cart = state.db.carts().load(&user.principal.uid).await?;
    Ok(Json(cart.into()))
}

pub async fn add_item(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Json(req): Json<AddItem>,
) -> ApiResult<Json<CartView>> {
    let product = state
        .db
        .products()
        .get_by_id(&req.product_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", &req.product_id))?;

    let quantity = match &req.quantity {
        None => Some(1),
        Some(raw) => parse_quantity(raw),
    };

    let uid = &user.principal.uid;
    let mut cart = state.db.carts().load(uid).await?;
    let changed = quantity.is_some_and(|q| cart.add(&product, q));

    if changed {
        state.db.carts().save(uid, &cart).await?;
    } else {
        debug!(user_id = %uid, product_id = %product.id, "Add to cart ignored");
    }

    Ok(Json(cart.into()))
}

/// Body is either the bare quantity (`3`, `"3"`) or `{"quantity": 3}`.
pub async fn set_quantity(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(product_id): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult<Json<CartView>> {
    let raw = match body {
        Value::Object(mut map) => map.remove("quantity").unwrap_or(Value::Null),
        other => other,
    };

    let uid = &user.principal.uid;
    let mut cart = state.db.carts().load(uid).await?;
    if cart.apply_quantity_input(&product_id, &raw) {
        state.db.carts().save(uid, &cart).await?;
    }

    Ok(Json(cart.into()))
}

pub async fn remove_item(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(product_id): Path<String>,
) -> ApiResult<Json<CartView>> {
    let uid = &user.principal.uid;
    let mut cart = state.db.carts().load(uid).await?;
    if cart.remove(&product_id) {
        state.db.carts().save(uid, &cart).await?;
    }

    Ok(Json(cart.into()))
}

pub async fn clear(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> ApiResult<Json<CartView>> {
    state.db.carts().clear(&user.principal.uid).await?;
    Ok(Json(Cart::new().into()))
}
