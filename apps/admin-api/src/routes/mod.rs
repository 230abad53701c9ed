//! # HTTP Routes
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  /health                         liveness + database check              │
//! │  /api/auth/signup                create account                         │
//! │  /api/auth/session               sign in (POST) / sign out (DELETE)     │
//! │  /api/me                         own profile                            │
//! │  /api/products[/{id}]            catalog (writes: admin)                │
//! │  /api/cart[/items[/{id}]]        saved cart of the caller               │
//! │  /api/checkout                   cart → Paid invoice                    │
//! │  /api/invoices[/{id}[/print|/status]]                                   │
//! │  /api/customers[/{id}[/role]]    customer management                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use axum::routing::{get, post, put};
use axum::Router;

use crate::state::AppState;

mod cart;
mod checkout;
mod customers;
mod health;
mod invoices;
mod me;
mod products;
mod session;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/auth/signup", post(session::sign_up))
        .route(
            "/api/auth/session",
            post(session::sign_in).delete(session::sign_out),
        )
        .route("/api/me", get(me::get_me).put(me::update_me))
        .route("/api/products", get(products::list).post(products::create))
        .route(
            "/api/products/{id}",
            get(products::get).put(products::update).delete(products::delete),
        )
        .route("/api/cart", get(cart::get_cart).delete(cart::clear))
        .route("/api/cart/items", post(cart::add_item))
        .route(
            "/api/cart/items/{product_id}",
            put(cart::set_quantity).delete(cart::remove_item),
        )
        .route("/api/checkout", post(checkout::checkout))
        .route("/api/invoices", get(invoices::list).post(invoices::create))
        .route(
            "/api/invoices/{id}",
            get(invoices::get).delete(invoices::delete),
        )
        .route("/api/invoices/{id}/print", get(invoices::print))
        .route("/api/invoices/{id}/status", put(invoices::set_status))
        .route("/api/invoices/{id}/paid", post(invoices::mark_paid))
        .route("/api/customers", get(customers::list))
        .route(
            "/api/customers/{id}",
            get(customers::get).put(customers::update).delete(customers::delete),
        )
        .route("/api/customers/{id}/role", put(customers::set_role))
}
