//! # Customer Repository
//!
//! Customer records double as the identity store: each row carries the
//! argon2 password hash produced by the API layer. The hash never leaves
//! this module except through [`CustomerRepository::get_credentials`].

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use facturo_core::{Address, Customer, ProfileUpdate, Role};

const CUSTOMER_COLUMNS: &str =
    "id, name, email, phone, street, city, country, role, created_at, updated_at";

#[derive(Debug, FromRow)]
struct CustomerRow {
    id: String,
    name: String,
    email: String,
    phone: String,
    street: Option<String>,
    city: Option<String>,
    country: Option<String>,
    role: Role,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        let address = match (row.street, row.city, row.country) {
            (None, None, None) => None,
            (street, city, country) => Some(Address {
                street: street.unwrap_or_default(),
                city: city.unwrap_or_default(),
                country: country.unwrap_or_default(),
            }),
        };

        Customer {
            id: row.id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            address,
            role: row.role,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// A customer about to be registered.
#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub name: String,
    /// Already normalized (trimmed, lower-cased).
    pub email: String,
    pub phone: String,
    pub password_hash: String,
    pub role: Role,
}

#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Fails with `UniqueViolation { field: "email" }` when the address is taken.
    pub async fn create(&self, new: NewCustomer) -> DbResult<Customer> {
        let now = Utc::now();
        let customer = Customer {
            id: Uuid::new_v4().to_string(),
            name: new.name.trim().to_string(),
            email: new.email,
            phone: new.phone,
            address: None,
            role: new.role,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %customer.id, "Creating customer");

        sqlx::query(
            r#"
            INSERT INTO customers (
                id, name, email, phone, role, password_hash, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(&customer.phone)
        .bind(customer.role)
        .bind(&new.password_hash)
        .bind(customer.created_at)
        .bind(customer.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, &customer.email),
            other => other,
        })?;

        info!(id = %customer.id, "Customer registered");
        Ok(customer)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Customer>> {
        let row: Option<CustomerRow> =
            sqlx::query_as(&format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = ?1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(Customer::from))
    }

    /// Looks up by email (normalized before comparison).
    pub async fn get_by_email(&self, email: &str) -> DbResult<Option<Customer>> {
        let row: Option<CustomerRow> = sqlx::query_as(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE email = ?1"
        ))
        .bind(email.trim().to_lowercase())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Customer::from))
    }

    /// The customer plus their stored password hash, for sign-in.
    pub async fn get_credentials(&self, email: &str) -> DbResult<Option<(Customer, String)>> {
        let email = email.trim().to_lowercase();

        let hash: Option<String> =
            sqlx::query_scalar("SELECT password_hash FROM customers WHERE email = ?1")
                .bind(&email)
                .fetch_optional(&self.pool)
                .await?;

        let Some(hash) = hash else {
            return Ok(None);
        };

        Ok(self.get_by_email(&email).await?.map(|c| (c, hash)))
    }

    pub async fn list(&self) -> DbResult<Vec<Customer>> {
        let rows: Vec<CustomerRow> = sqlx::query_as(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers ORDER BY name, email"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Customer::from).collect())
    }

    /// Customers for the given ids, keyed by id. Missing ids are absent.
    pub async fn get_many(&self, ids: &[String]) -> DbResult<HashMap<String, Customer>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id IN ("
        ));
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(id.as_str());
        }
        separated.push_unseparated(")");

        let rows: Vec<CustomerRow> = builder.build_query_as().fetch_all(&self.pool).await?;

        Ok(rows
            .into_iter()
            .map(|row| (row.id.clone(), Customer::from(row)))
            .collect())
    }

    /// Name, phone and address; the fields a customer edits on their profile.
    pub async fn update_profile(&self, id: &str, update: ProfileUpdate) -> DbResult<Customer> {
        debug!(id = %id, "Updating customer profile");

        let (street, city, country) = match update.address {
            Some(a) => (Some(a.street), Some(a.city), Some(a.country)),
            None => (None, None, None),
        };

        let result = sqlx::query(
            r#"
            UPDATE customers SET
                name = ?2,
                phone = ?3,
                street = ?4,
                city = ?5,
                country = ?6,
                updated_at = ?7
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(update.name.trim())
        .bind(update.phone.trim())
        .bind(street)
        .bind(city)
        .bind(country)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Customer", id))
    }

    pub async fn set_role(&self, id: &str, role: Role) -> DbResult<Customer> {
        info!(id = %id, role = role.as_str(), "Changing customer role");

        let result = sqlx::query("UPDATE customers SET role = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(role)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Customer", id))
    }

    /// Deletes the record (and with it the credentials) and the saved cart.
    /// Invoices are kept.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        info!(id = %id, "Deleting customer");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let result = sqlx::query("DELETE FROM customers WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }

        sqlx::query("DELETE FROM carts WHERE user_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(())
    }
}
