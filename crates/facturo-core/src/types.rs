//! # Domain Types
//!
//! Records shared by the cart, the invoice calculator, the access gate and
//! the persistence layer.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │    Invoice      │   │    Customer     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  name           │   │  invoice_number │   │  email (unique) │       │
//! │  │  price (Money)  │   │  items[]        │   │  role           │       │
//! │  │  stock          │   │  tax_rate (bps) │   │  address?       │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      Role       │   │ InvoiceStatus   │   │ PaymentMethod   │       │
//! │  │  Admin          │   │  Paid           │   │  Card           │       │
//! │  │  User           │   │  Pending        │   │  Pse            │       │
//! │  └─────────────────┘   │  Overdue        │   └─────────────────┘       │
//! │                        └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! JSON field names are camelCase to match the web frontend.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::{Money, TaxRate};

// =============================================================================
// Product
// =============================================================================

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Unit price in minor units.
    pub price: Money,
    pub image_url: String,
    pub category: String,
    /// Units available. Carts never hold more than this.
    pub stock: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[inline]
    pub fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

/// Fields an admin supplies when creating or editing a product.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ProductInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Money,
    #[serde(default)]
    pub image_url: String,
    pub category: String,
    pub stock: i64,
}

// =============================================================================
// Role
// =============================================================================

/// Role stored on a customer record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    Admin,
    #[default]
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }

    #[inline]
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

// =============================================================================
// Customer
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub country: String,
}

/// A registered user of the storefront.
///
/// The password hash lives only in the persistence layer and never appears
/// here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Customer {
    pub id: String,
    pub name: String,
    /// Stored lower-cased.
    pub email: String,
    pub phone: String,
    pub address: Option<Address>,
    pub role: Role,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Name shown for invoices whose customer record no longer exists.
pub const DELETED_CUSTOMER_NAME: &str = "Deleted customer";

/// Email/phone shown for a deleted customer.
pub const NOT_AVAILABLE: &str = "Not available";

impl Customer {
    /// Stand-in for a customer that was deleted after invoicing.
    pub fn placeholder(id: &str) -> Self {
        let epoch = DateTime::<Utc>::default();
        Customer {
            id: id.to_string(),
            name: DELETED_CUSTOMER_NAME.to_string(),
            email: NOT_AVAILABLE.to_string(),
            phone: NOT_AVAILABLE.to_string(),
            address: None,
            role: Role::User,
            created_at: epoch,
            updated_at: epoch,
        }
    }
}

/// Fields a customer may edit on their own profile.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ProfileUpdate {
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: Option<Address>,
}

// =============================================================================
// Invoice Status
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum InvoiceStatus {
    Paid,
    #[default]
    Pending,
    Overdue,
}

impl InvoiceStatus {
    pub fn label(&self) -> &'static str {
        match self {
            InvoiceStatus::Paid => "Paid",
            InvoiceStatus::Pending => "Pending",
            InvoiceStatus::Overdue => "Overdue",
        }
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum PaymentMethod {
    /// Credit or debit card.
    Card,
    /// Bank transfer through PSE.
    Pse,
}

impl PaymentMethod {
    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethod::Card => "Card",
            PaymentMethod::Pse => "PSE",
        }
    }
}

// =============================================================================
// Invoice
// =============================================================================

/// One line of an invoice. Description and price are frozen at creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct InvoiceItem {
    pub id: String,
    pub description: String,
    pub quantity: i64,
    pub unit_price: Money,
}

impl InvoiceItem {
    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Invoice {
    pub id: String,
    /// Human-readable number, `FAC-YYYYMMDD-NNNN`.
    pub invoice_number: String,
    pub customer_id: String,
    #[ts(as = "String")]
    pub issue_date: NaiveDate,
    #[ts(as = "String")]
    pub due_date: NaiveDate,
    /// Ordered as entered.
    pub items: Vec<InvoiceItem>,
    pub tax_rate: TaxRate,
    /// Absolute discount in minor units.
    pub discount: Money,
    pub status: InvoiceStatus,
    pub payment_method: Option<PaymentMethod>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// A line supplied when creating an invoice.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct NewInvoiceItem {
    pub description: String,
    pub quantity: i64,
    pub unit_price: Money,
}

/// Request to create an invoice. Omitted dates and rate fall back to the
/// server's configured defaults.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct NewInvoice {
    pub customer_id: String,
    #[ts(as = "Option<String>")]
    #[serde(default)]
    pub issue_date: Option<NaiveDate>,
    #[ts(as = "Option<String>")]
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    pub items: Vec<NewInvoiceItem>,
    #[serde(default)]
    pub tax_rate: Option<TaxRate>,
    #[serde(default)]
    pub discount: Money,
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_wire_names() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
        assert_eq!(serde_json::to_string(&InvoiceStatus::Overdue).unwrap(), "\"overdue\"");
        assert_eq!(serde_json::to_string(&PaymentMethod::Pse).unwrap(), "\"pse\"");
    }

    #[test]
    fn test_role_defaults_to_user() {
        assert_eq!(Role::default(), Role::User);
        assert!(!Role::default().is_admin());
    }

    #[test]
    fn test_placeholder_customer() {
        let c = Customer::placeholder("gone-1");
        assert_eq!(c.id, "gone-1");
        assert_eq!(c.name, DELETED_CUSTOMER_NAME);
        assert_eq!(c.email, NOT_AVAILABLE);
        assert_eq!(c.phone, NOT_AVAILABLE);
    }

    #[test]
    fn test_product_input_defaults() {
        let input: ProductInput = serde_json::from_str(
            r#"{"name":"Mug","price":1500,"category":"home","stock":4}"#,
        )
        .unwrap();
        assert_eq!(input.price.cents(), 1500);
        assert!(input.description.is_empty());
        assert!(input.image_url.is_empty());
    }

    #[test]
    fn test_new_invoice_optional_fields() {
        let req: NewInvoice = serde_json::from_str(
            r#"{"customerId":"c1","items":[{"description":"x","quantity":1,"unitPrice":100}]}"#,
        )
        .unwrap();
        assert!(req.issue_date.is_none());
        assert!(req.tax_rate.is_none());
        assert!(req.discount.is_zero());
        assert_eq!(req.items[0].unit_price.cents(), 100);
    }

    #[test]
    fn test_invoice_item_line_total() {
        let item = InvoiceItem {
            id: "i1".into(),
            description: "Widget".into(),
            quantity: 3,
            unit_price: Money::from_cents(250),
        };
        assert_eq!(item.line_total().cents(), 750);
    }
}
