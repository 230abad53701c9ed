//! # facturo-core: Pure Business Logic for Facturo
//!
//! Catalog, cart, invoice and access rules as pure functions with zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Facturo Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Web frontend (admin panel)                      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ JSON over HTTP                         │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 admin-api (axum handlers)                       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ facturo-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐  ┌─────────┐  ┌─────────┐  ┌─────────┐           │   │
//! │  │   │  money  │  │  cart   │  │ invoice │  │ access  │           │   │
//! │  │   │ Money   │  │  Cart   │  │ Totals  │  │ Roles   │           │   │
//! │  │   │ TaxRate │  │CartItem │  │ Status  │  │ Gate    │           │   │
//! │  │   └─────────┘  └─────────┘  └─────────┘  └─────────┘           │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 facturo-db (SQLite repositories)                │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain records (Product, Customer, Invoice, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`cart`] - Cart store with stock ceilings
//! - [`invoice`] - Invoice totals, status rules, printable rendering
//! - [`access`] - Role resolution and the authorization gate
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation rules
//!
//! ## Example Usage
//!
//! ```rust
//! use facturo_core::invoice::{compute_totals, LineAmount};
//! use facturo_core::{Money, TaxRate};
//!
//! let lines = [LineAmount::new(2, Money::from_cents(100))];
//! let totals = compute_totals(&lines, TaxRate::from_bps(1900), Money::from_cents(10));
//!
//! assert_eq!(totals.subtotal.cents(), 200);
//! assert_eq!(totals.tax_amount.cents(), 38);
//! assert_eq!(totals.total.cents(), 228);
//! ```

pub mod access;
pub mod cart;
pub mod error;
pub mod invoice;
pub mod money;
pub mod types;
pub mod validation;

pub use access::{AccessPolicy, Principal, RoleResolver};
pub use cart::{Cart, CartItem, CartSummary};
pub use error::{CoreError, CoreResult, ValidationError};
pub use invoice::InvoiceTotals;
pub use money::{Money, TaxRate};
pub use types::*;

/// Minimum password length accepted at signup.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Maximum distinct products in one cart.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum lines on one invoice.
pub const MAX_INVOICE_ITEMS: usize = 100;

/// Largest unit price accepted, in minor units (100,000,000.00).
pub const MAX_PRICE_CENTS: i64 = 10_000_000_000;

/// Largest stock level or line quantity accepted.
///
/// With [`MAX_PRICE_CENTS`] and at most 100 lines, a subtotal plus 100% tax
/// stays below 2 × 10^18, well inside `i64`.
pub const MAX_QUANTITY: i64 = 1_000_000;

/// Prefix of every invoice number (`FAC-20260131-0001`).
pub const INVOICE_NUMBER_PREFIX: &str = "FAC";
