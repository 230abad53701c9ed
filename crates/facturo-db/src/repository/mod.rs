//! # Repositories
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  HTTP handler                                                          │
//! │       │  state.db.invoices().list(Some(&uid))                           │
//! │       ▼                                                                 │
//! │  InvoiceRepository ── SQL ──► SQLite                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! - [`ProductRepository`](product::ProductRepository) - catalog CRUD
//! - [`CustomerRepository`](customer::CustomerRepository) - customers and credentials
//! - [`InvoiceRepository`](invoice::InvoiceRepository) - invoices and checkout
//! - [`CartRepository`](cart::CartRepository) - saved carts

pub mod cart;
pub mod customer;
pub mod invoice;
pub mod product;
