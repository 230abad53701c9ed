//! # Cart Repository
//!
//! One saved cart per signed-in user, stored as a JSON array of lines.
//! A missing row is an empty cart.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, warn};

use crate::error::DbResult;
use facturo_core::{Cart, CartItem};

#[derive(Debug, Clone)]
pub struct CartRepository {
    pool: SqlitePool,
}

impl CartRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CartRepository { pool }
    }

    pub async fn load(&self, user_id: &str) -> DbResult<Cart> {
        let mut conn = self.pool.acquire().await?;
        load_cart(&mut conn, user_id).await
    }

    /// Replaces the saved cart.
    pub async fn save(&self, user_id: &str, cart: &Cart) -> DbResult<()> {
        let items = serde_json::to_string(cart)?;
        debug!(user_id = %user_id, lines = cart.item_count(), "Saving cart");

        sqlx::query(
            r#"
            INSERT INTO carts (user_id, items, updated_at) VALUES (?1, ?2, ?3)
            ON CONFLICT(user_id) DO UPDATE SET
                items = excluded.items,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(user_id)
        .bind(items)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn clear(&self, user_id: &str) -> DbResult<()> {
        debug!(user_id = %user_id, "Clearing cart");

        sqlx::query("DELETE FROM carts WHERE user_id = ?1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

/// Reads a saved cart on an existing connection, so checkout can do it
/// inside its transaction.
pub(crate) async fn load_cart(conn: &mut SqliteConnection, user_id: &str) -> DbResult<Cart> {
    let raw: Option<String> = sqlx::query_scalar("SELECT items FROM carts WHERE user_id = ?1")
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?;

    let Some(raw) = raw else {
        return Ok(Cart::new());
    };

    let items: Vec<CartItem> = serde_json::from_str(&raw)?;
    let stored = items.len();
    let cart = Cart::from_items(items);
    if cart.item_count() != stored {
        warn!(
            user_id = %user_id,
            dropped = stored - cart.item_count(),
            "Dropped invalid lines from saved cart"
        );
    }

    Ok(cart)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use facturo_core::{Money, Product};

    fn product(id: &str, stock: i64) -> Product {
        Product {
            id: id.to_string(),
            name: format!("Product {id}"),
            description: String::new(),
            price: Money::from_cents(250),
            image_url: String::new(),
            category: "misc".into(),
            stock,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_missing_cart_is_empty() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        assert!(db.carts().load("nobody").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_load_and_overwrite() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.carts();

        let mut cart = Cart::new();
        cart.add(&product("p1", 5), 2);
        cart.add(&product("p2", 1), 1);
        repo.save("u1", &cart).await.unwrap();

        let loaded = repo.load("u1").await.unwrap();
        assert_eq!(loaded, cart);
        assert_eq!(loaded.total().cents(), 750);

        cart.remove("p2");
        repo.save("u1", &cart).await.unwrap();
        assert_eq!(repo.load("u1").await.unwrap().item_count(), 1);

        // Other users are untouched
        assert!(repo.load("u2").await.unwrap().is_empty());

        repo.clear("u1").await.unwrap();
        assert!(repo.load("u1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_saved_lines_are_dropped() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        sqlx::query("INSERT INTO carts (user_id, items, updated_at) VALUES (?1, ?2, ?3)")
            .bind("u1")
            .bind(
                r#"[{"productId":"p1","name":"A","unitPrice":100,"imageUrl":"","stock":2,"quantity":5},
                    {"productId":"p2","name":"B","unitPrice":100,"imageUrl":"","stock":2,"quantity":1}]"#,
            )
            .bind(Utc::now())
            .execute(db.pool())
            .await
            .unwrap();

        let cart = db.carts().load("u1").await.unwrap();
        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.items()[0].product_id, "p2");
    }
}
