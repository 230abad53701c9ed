//! # facturo-db: Persistence for Facturo
//!
//! SQLite storage for the catalog, customers, invoices and saved carts,
//! using sqlx for async access.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Facturo Data Flow                                │
//! │                                                                         │
//! │  facturo-api handler (POST /api/checkout)                              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     facturo-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │  product      │    │  (embedded)  │  │   │
//! │  │   │               │◄───│  customer     │    │ 001_initial  │  │   │
//! │  │   │  SqlitePool   │    │  invoice      │    │              │  │   │
//! │  │   │               │    │  cart         │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file (WAL)                                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use facturo_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./facturo.db")).await?;
//! let products = db.products().list(Some("home")).await?;
//! ```
//!
//! Business rules (totals, cart limits, access) live in `facturo-core`;
//! their failures surface here as [`DbError::Rule`].

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::cart::CartRepository;
pub use repository::customer::{CustomerRepository, NewCustomer};
pub use repository::invoice::InvoiceRepository;
pub use repository::product::ProductRepository;
