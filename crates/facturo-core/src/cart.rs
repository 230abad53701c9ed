//! # Cart Store
//!
//! A per-user list of line items with stock ceilings.
//!
//! ## Operations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  Frontend Action          Cart method              Effect               │
//! │  ───────────────          ───────────              ──────               │
//! │                                                                         │
//! │  Add to cart ───────────► add(product, q) ───────► qty = min(old+q,    │
//! │                                                         stock)          │
//! │  Change quantity ───────► update_quantity(id, q) ─► q <= 0: remove      │
//! │                                                     else min(q, stock)  │
//! │  Remove ────────────────► remove(id) ────────────► item gone            │
//! │                                                                         │
//! │  Empty cart ────────────► clear() ───────────────► no items             │
//! │                                                                         │
//! │  View cart ─────────────► total() ───────────────► Σ price × qty        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Failure Semantics
//! There is no cart error type. Every method that would produce an invalid
//! line (quantity <= 0 on add, out-of-stock product, a new product beyond
//! [`crate::MAX_CART_ITEMS`], unknown id, non-numeric input) leaves the cart
//! untouched and reports `false`. The API layer only
//! persists when something changed.
//!
//! ## Invariants
//! - Items are unique by `product_id`.
//! - `1 <= quantity <= stock` for every item, where `stock` is the product's
//!   stock when it was last added.
//! - `total()` is recomputed on every call, never cached.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;

use crate::money::Money;
use crate::types::Product;
use crate::validation::{validate_cart_size, validate_price_cents, validate_stock};

// =============================================================================
// Cart Item
// =============================================================================

/// A line in the cart.
///
/// Product fields are a snapshot taken when the product was added. A later
/// price change in the catalog does not reach carts already holding it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartItem {
    pub product_id: String,
    pub name: String,
    pub unit_price: Money,
    pub image_url: String,
    /// Stock ceiling for this line.
    pub stock: i64,
    pub quantity: i64,
}

impl CartItem {
    fn from_product(product: &Product, quantity: i64) -> Self {
        CartItem {
            product_id: product.id.clone(),
            name: product.name.clone(),
            unit_price: product.price,
            image_url: product.image_url.clone(),
            stock: product.stock,
            quantity,
        }
    }

    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Cart
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(transparent)]
#[ts(export)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    pub fn new() -> Self {
        Cart::default()
    }

    /// Rebuilds a cart from persisted items, dropping lines that no longer
    /// satisfy the quantity invariant or the catalog's price and stock
    /// limits.
    pub fn from_items(items: Vec<CartItem>) -> Self {
        let mut cart = Cart::new();
        for item in items {
            if item.quantity >= 1
                && item.quantity <= item.stock
                && validate_stock(item.stock).is_ok()
                && validate_price_cents(item.unit_price.cents()).is_ok()
                && validate_cart_size(cart.items.len()).is_ok()
                && cart.find(&item.product_id).is_none()
            {
                cart.items.push(item);
            }
        }
        cart
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn into_items(self) -> Vec<CartItem> {
        self.items
    }

    fn find(&self, product_id: &str) -> Option<&CartItem> {
        self.items.iter().find(|i| i.product_id == product_id)
    }

    /// Adds `quantity` units of `product`, capped at the product's stock.
    ///
    /// ```rust
    /// # use facturo_core::{Cart, Money, Product};
    /// # use chrono::Utc;
    /// # let product = Product { id: "p1".into(), name: "Mug".into(), description: String::new(),
    /// #     price: Money::from_cents(100), image_url: String::new(), category: "home".into(),
    /// #     stock: 5, created_at: Utc::now(), updated_at: Utc::now() };
    /// let mut cart = Cart::new();
    /// cart.add(&product, 3);
    /// cart.add(&product, 4);
    /// assert_eq!(cart.items()[0].quantity, 5);
    /// ```
    pub fn add(&mut self, product: &Product, quantity: i64) -> bool {
        if quantity <= 0 || !product.in_stock() {
            return false;
        }

        if let Some(item) = self.items.iter_mut().find(|i| i.product_id == product.id) {
            let new_qty = item.quantity.saturating_add(quantity).min(product.stock);
            let changed = new_qty != item.quantity || item.stock != product.stock;
            item.quantity = new_qty;
            item.stock = product.stock;
            return changed;
        }

        if validate_cart_size(self.items.len()).is_err() {
            return false;
        }

        self.items
            .push(CartItem::from_product(product, quantity.min(product.stock)));
        true
    }

    /// Removes the line for `product_id`. Absent ids are a no-op.
    pub fn remove(&mut self, product_id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.product_id != product_id);
        self.items.len() != before
    }

    /// Sets a line's quantity. `quantity <= 0` removes the line; larger
    /// values are clamped to the line's stock.
    pub fn update_quantity(&mut self, product_id: &str, quantity: i64) -> bool {
        if quantity <= 0 {
            return self.remove(product_id);
        }

        match self.items.iter_mut().find(|i| i.product_id == product_id) {
            Some(item) => {
                let new_qty = quantity.min(item.stock);
                let changed = new_qty != item.quantity;
                item.quantity = new_qty;
                changed
            }
            None => false,
        }
    }

    /// Applies a raw quantity value from a form field.
    ///
    /// Non-numeric input leaves the cart unchanged.
    pub fn apply_quantity_input(&mut self, product_id: &str, raw: &Value) -> bool {
        match parse_quantity(raw) {
            Some(quantity) => self.update_quantity(product_id, quantity),
            None => false,
        }
    }

    pub fn clear(&mut self) -> bool {
        let changed = !self.items.is_empty();
        self.items.clear();
        changed
    }

    /// Σ unit_price × quantity.
    pub fn total(&self) -> Money {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Number of distinct products.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Interprets a JSON value as an integer quantity.
///
/// Accepts integers, whole floats (`2.0`) and strings holding an integer
/// (`"3"`, `" 3 "`). Anything else is `None`.
pub fn parse_quantity(raw: &Value) -> Option<i64> {
    match raw {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.fract() == 0.0)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

// =============================================================================
// Cart Summary
// =============================================================================

/// Display totals for the cart page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartSummary {
    pub item_count: usize,
    pub total_quantity: i64,
    pub total: Money,
}

impl From<&Cart> for CartSummary {
    fn from(cart: &Cart) -> Self {
        CartSummary {
            item_count: cart.item_count(),
            total_quantity: cart.total_quantity(),
            total: cart.total(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
