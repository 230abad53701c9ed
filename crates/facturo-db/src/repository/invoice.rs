//! # Invoice Repository
//!
//! Invoices, their ordered line items, and the checkout transaction.
//!
//! ## Checkout Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │    1. Load the user's saved cart            (empty → EmptyCart)        │
//! │    2. Next number for today: FAC-YYYYMMDD-NNNN                          │
//! │    3. Build the Paid invoice from cart lines                           │
//! │    4. For each line:                                                    │
//! │         UPDATE products SET stock = stock - qty                         │
//! │         WHERE id = ? AND stock >= qty        (0 rows → InsufficientStock)│
//! │    5. INSERT invoice + invoice_items                                    │
//! │    6. DELETE the saved cart                                             │
//! │  COMMIT                  any failure above rolls everything back        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::cart::load_cart;
use facturo_core::invoice::{build_invoice, invoice_from_cart, invoice_number_for, InvoiceDefaults};
use facturo_core::{
    CoreError, Invoice, InvoiceItem, InvoiceStatus, Money, NewInvoice, PaymentMethod, TaxRate,
    INVOICE_NUMBER_PREFIX,
};

const INVOICE_COLUMNS: &str = "id, invoice_number, customer_id, issue_date, due_date, \
     tax_rate_bps, discount_cents, status, payment_method, created_at, updated_at";

#[derive(Debug, FromRow)]
struct InvoiceRow {
    id: String,
    invoice_number: String,
    customer_id: String,
    issue_date: NaiveDate,
    due_date: NaiveDate,
    tax_rate_bps: u32,
    discount_cents: i64,
    status: InvoiceStatus,
    payment_method: Option<PaymentMethod>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl InvoiceRow {
    fn into_invoice(self, items: Vec<InvoiceItem>) -> Invoice {
        Invoice {
            id: self.id,
            invoice_number: self.invoice_number,
            customer_id: self.customer_id,
            issue_date: self.issue_date,
            due_date: self.due_date,
            items,
            tax_rate: TaxRate::from_bps(self.tax_rate_bps),
            discount: Money::from_cents(self.discount_cents),
            status: self.status,
            payment_method: self.payment_method,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct ItemRow {
    id: String,
    invoice_id: String,
    description: String,
    quantity: i64,
    unit_price_cents: i64,
}

impl From<ItemRow> for InvoiceItem {
    fn from(row: ItemRow) -> Self {
        InvoiceItem {
            id: row.id,
            description: row.description,
            quantity: row.quantity,
            unit_price: Money::from_cents(row.unit_price_cents),
        }
    }
}

#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    pool: SqlitePool,
}

impl InvoiceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        InvoiceRepository { pool }
    }

    /// Creates a Pending invoice numbered for today.
    pub async fn create(&self, req: NewInvoice, defaults: InvoiceDefaults) -> DbResult<Invoice> {
        let now = Utc::now();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let number = next_invoice_number(&mut tx, now.date_naive()).await?;
        let invoice = build_invoice(req, defaults, number, now)?;
        insert_invoice(&mut tx, &invoice).await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            id = %invoice.id,
            number = %invoice.invoice_number,
            customer_id = %invoice.customer_id,
            "Invoice created"
        );
        Ok(invoice)
    }

    /// Turns the user's saved cart into a Paid invoice. See the module docs
    /// for the steps; they commit or roll back together.
    pub async fn checkout(
        &self,
        user_id: &str,
        payment_method: PaymentMethod,
        defaults: InvoiceDefaults,
    ) -> DbResult<Invoice> {
        let now = Utc::now();
        debug!(user_id = %user_id, method = ?payment_method, "Starting checkout");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let cart = load_cart(&mut tx, user_id).await?;
        let number = next_invoice_number(&mut tx, now.date_naive()).await?;
        let invoice = invoice_from_cart(&cart, user_id, payment_method, defaults, number, now)?;

        for line in cart.items() {
            let result = sqlx::query(
                "UPDATE products SET stock = stock - ?2, updated_at = ?3 \
                 WHERE id = ?1 AND stock >= ?2",
            )
            .bind(&line.product_id)
            .bind(line.quantity)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                let available: Option<i64> =
                    sqlx::query_scalar("SELECT stock FROM products WHERE id = ?1")
                        .bind(&line.product_id)
                        .fetch_optional(&mut *tx)
                        .await?;

                return Err(match available {
                    Some(available) => CoreError::InsufficientStock {
                        product: line.name.clone(),
                        available,
                        requested: line.quantity,
                    }
                    .into(),
                    None => DbError::not_found("Product", &line.product_id),
                });
            }
        }

        insert_invoice(&mut tx, &invoice).await?;

        sqlx::query("DELETE FROM carts WHERE user_id = ?1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            id = %invoice.id,
            number = %invoice.invoice_number,
            user_id = %user_id,
            total = invoice.totals().total.cents(),
            "Checkout complete"
        );
        Ok(invoice)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Invoice>> {
        let row: Option<InvoiceRow> =
            sqlx::query_as(&format!("SELECT {INVOICE_COLUMNS} FROM invoices WHERE id = ?1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let items: Vec<ItemRow> = sqlx::query_as(
            "SELECT id, invoice_id, description, quantity, unit_price_cents \
             FROM invoice_items WHERE invoice_id = ?1 ORDER BY position",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(
            row.into_invoice(items.into_iter().map(InvoiceItem::from).collect()),
        ))
    }

    /// Newest first. `customer_id = None` lists every invoice.
    pub async fn list(&self, customer_id: Option<&str>) -> DbResult<Vec<Invoice>> {
        debug!(customer_id = ?customer_id, "Listing invoices");

        let rows: Vec<InvoiceRow> = match customer_id {
            Some(customer_id) => {
                sqlx::query_as(&format!(
                    "SELECT {INVOICE_COLUMNS} FROM invoices WHERE customer_id = ?1 \
                     ORDER BY issue_date DESC, created_at DESC"
                ))
                .bind(customer_id)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as(&format!(
                    "SELECT {INVOICE_COLUMNS} FROM invoices \
                     ORDER BY issue_date DESC, created_at DESC"
                ))
                .fetch_all(&self.pool)
                .await?
            }
        };

        let item_rows: Vec<ItemRow> = match customer_id {
            Some(customer_id) => {
                sqlx::query_as(
                    "SELECT ii.id, ii.invoice_id, ii.description, ii.quantity, ii.unit_price_cents \
                     FROM invoice_items ii JOIN invoices i ON i.id = ii.invoice_id \
                     WHERE i.customer_id = ?1 ORDER BY ii.invoice_id, ii.position",
                )
                .bind(customer_id)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as(
                    "SELECT id, invoice_id, description, quantity, unit_price_cents \
                     FROM invoice_items ORDER BY invoice_id, position",
                )
                .fetch_all(&self.pool)
                .await?
            }
        };

        let mut items_by_invoice: HashMap<String, Vec<InvoiceItem>> = HashMap::new();
        for row in item_rows {
            items_by_invoice
                .entry(row.invoice_id.clone())
                .or_default()
                .push(InvoiceItem::from(row));
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let items = items_by_invoice.remove(&row.id).unwrap_or_default();
                row.into_invoice(items)
            })
            .collect())
    }

    pub async fn set_status(&self, id: &str, status: InvoiceStatus) -> DbResult<Invoice> {
        info!(id = %id, status = ?status, "Changing invoice status");

        let result = sqlx::query("UPDATE invoices SET status = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(status)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Invoice", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Invoice", id))
    }

    /// Line items go with it (ON DELETE CASCADE).
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        info!(id = %id, "Deleting invoice");

        let result = sqlx::query("DELETE FROM invoices WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Invoice", id));
        }

        Ok(())
    }
}

/// Next `FAC-YYYYMMDD-NNNN` for `date`: one past the highest sequence used
/// that day, so numbers stay unique after deletions.
async fn next_invoice_number(conn: &mut SqliteConnection, date: NaiveDate) -> DbResult<String> {
    let prefix = format!("{}-{}-", INVOICE_NUMBER_PREFIX, date.format("%Y%m%d"));

    let highest: Option<i64> = sqlx::query_scalar(
        "SELECT MAX(CAST(substr(invoice_number, ?2) AS INTEGER)) \
         FROM invoices WHERE invoice_number LIKE ?1",
    )
    .bind(format!("{prefix}%"))
    .bind(prefix.len() as i64 + 1)
    .fetch_one(&mut *conn)
    .await?;

    let next = highest.unwrap_or(0) + 1;
    let sequence = u32::try_from(next).map_err(|_| {
        DbError::Internal(format!("invoice sequence overflow for {prefix}"))
    })?;

    Ok(invoice_number_for(date, sequence))
}

async fn insert_invoice(conn: &mut SqliteConnection, invoice: &Invoice) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO invoices (
            id, invoice_number, customer_id, issue_date, due_date,
            tax_rate_bps, discount_cents, status, payment_method,
            created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        "#,
    )
    .bind(&invoice.id)
    .bind(&invoice.invoice_number)
    .bind(&invoice.customer_id)
    .bind(invoice.issue_date)
    .bind(invoice.due_date)
    .bind(invoice.tax_rate.bps())
    .bind(invoice.discount.cents())
    .bind(invoice.status)
    .bind(invoice.payment_method)
    .bind(invoice.created_at)
    .bind(invoice.updated_at)
    .execute(&mut *conn)
    .await?;

    for (position, item) in invoice.items.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO invoice_items (
                id, invoice_id, position, description, quantity, unit_price_cents
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&item.id)
        .bind(&invoice.id)
        .bind(position as i64)
        .bind(&item.description)
        .bind(item.quantity)
        .bind(item.unit_price.cents())
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}
