//! # Product Repository
//!
//! Catalog CRUD. Reads are public; writes are admin-only, enforced by the
//! API layer before it gets here.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use facturo_core::{Money, Product, ProductInput};

const PRODUCT_COLUMNS: &str =
    "id, name, description, price_cents, image_url, category, stock, created_at, updated_at";

#[derive(Debug, FromRow)]
pub(crate) struct ProductRow {
    id: String,
    name: String,
    description: String,
    price_cents: i64,
    image_url: String,
    category: String,
    stock: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            name: row.name,
            description: row.description,
            price: Money::from_cents(row.price_cents),
            image_url: row.image_url,
            category: row.category,
            stock: row.stock,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// All products by name, optionally restricted to one category.
    pub async fn list(&self, category: Option<&str>) -> DbResult<Vec<Product>> {
        let category = category.map(str::trim).filter(|c| !c.is_empty());
        debug!(category = ?category, "Listing products");

        let rows: Vec<ProductRow> = match category {
            Some(category) => {
                sqlx::query_as(&format!(
                    "SELECT {PRODUCT_COLUMNS} FROM products WHERE category = ?1 ORDER BY name"
                ))
                .bind(category)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as(&format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY name"))
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        Ok(rows.into_iter().map(Product::from).collect())
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let row: Option<ProductRow> =
            sqlx::query_as(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(Product::from))
    }

    /// Inserts a fully formed product (id already assigned).
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, name = %product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, description, price_cents, image_url,
                category, stock, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price.cents())
        .bind(&product.image_url)
        .bind(&product.category)
        .bind(product.stock)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Creates a product from validated admin input.
    pub async fn create(&self, input: ProductInput) -> DbResult<Product> {
        let now = Utc::now();
        let product = Product {
            id: generate_product_id(),
            name: input.name.trim().to_string(),
            description: input.description,
            price: input.price,
            image_url: input.image_url,
            category: input.category.trim().to_string(),
            stock: input.stock,
            created_at: now,
            updated_at: now,
        };

        self.insert(&product).await?;
        Ok(product)
    }

    /// Replaces every editable field.
    pub async fn update(&self, id: &str, input: ProductInput) -> DbResult<Product> {
        debug!(id = %id, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                description = ?3,
                price_cents = ?4,
                image_url = ?5,
                category = ?6,
                stock = ?7,
                updated_at = ?8
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(input.name.trim())
        .bind(&input.description)
        .bind(input.price.cents())
        .bind(&input.image_url)
        .bind(input.category.trim())
        .bind(input.stock)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Hard delete. Invoices keep their own copy of description and price,
    /// and carts drop the line when they next load.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    fn input(name: &str, category: &str, stock: i64) -> ProductInput {
        ProductInput {
            name: name.to_string(),
            description: format!("{name} description"),
            price: Money::from_cents(1500),
            image_url: String::new(),
            category: category.to_string(),
            stock,
        }
    }

    #[tokio::test]
    async fn test_create_get_and_list_by_category() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        let mug = repo.create(input("Mug", "home", 3)).await.unwrap();
        repo.create(input("Cable", "tech", 10)).await.unwrap();
        repo.create(input("Apron", "home", 1)).await.unwrap();

        let fetched = repo.get_by_id(&mug.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "Mug");
        assert_eq!(fetched.price.cents(), 1500);

        let all = repo.list(None).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].name, "Apron");

        let home = repo.list(Some("home")).await.unwrap();
        assert_eq!(home.len(), 2);
        assert!(home.iter().all(|p| p.category == "home"));

        assert_eq!(repo.list(Some("  ")).await.unwrap().len(), 3);
        assert_eq!(repo.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        let mug = repo.create(input("Mug", "home", 3)).await.unwrap();
        let updated = repo.update(&mug.id, input("Big Mug", "home", 7)).await.unwrap();
        assert_eq!(updated.name, "Big Mug");
        assert_eq!(updated.stock, 7);

        repo.delete(&mug.id).await.unwrap();
        assert!(repo.get_by_id(&mug.id).await.unwrap().is_none());

        assert!(matches!(
            repo.delete(&mug.id).await,
            Err(DbError::NotFound { .. })
        ));
        assert!(matches!(
            repo.update("missing", input("x", "y", 1)).await,
            Err(DbError::NotFound { .. })
        ));
    }
}
