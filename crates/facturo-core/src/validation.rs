//! # Validation Module
//!
//! Input validation for signup, products, profiles and invoices.
//!
//! ## Validation Layers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Layer 1: Frontend forms                                               │
//! │  └── Immediate feedback (empty fields, password length)                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: admin-api handlers                                           │
//! │  ├── Deserialization (types)                                           │
//! │  └── THIS MODULE: field rules                                          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: SQLite                                                       │
//! │  └── NOT NULL, UNIQUE(email), CHECK(stock >= 0), foreign keys          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use facturo_core::validation::{validate_email, validate_password};
//!
//! assert_eq!(validate_email("  Ana@Example.COM ").unwrap(), "ana@example.com");
//! assert!(validate_password("12345").is_err());
//! ```

use crate::error::ValidationError;
use crate::money::BPS_SCALE;
use crate::types::{NewInvoice, ProductInput, ProfileUpdate};
use crate::{
    MAX_CART_ITEMS, MAX_INVOICE_ITEMS, MAX_PRICE_CENTS, MAX_QUANTITY, MIN_PASSWORD_LENGTH,
};

pub type ValidationResult<T> = Result<T, ValidationError>;

const MAX_NAME_LEN: usize = 200;
const MAX_EMAIL_LEN: usize = 254;

// =============================================================================
// Identity
// =============================================================================

/// Validates an email address and returns it normalized (trimmed,
/// lower-cased).
///
/// Only the shape `local@domain.tld` is checked; deliverability is not.
pub fn validate_email(email: &str) -> ValidationResult<String> {
    let email = email.trim().to_lowercase();

    if email.is_empty() {
        return Err(ValidationError::Required {
            field: "email".to_string(),
        });
    }

    if email.len() > MAX_EMAIL_LEN {
        return Err(ValidationError::TooLong {
            field: "email".to_string(),
            max: MAX_EMAIL_LEN,
        });
    }

    let well_formed = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };

    if !well_formed {
        return Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: "must look like name@example.com".to_string(),
        });
    }

    Ok(email)
}

/// Passwords need at least [`MIN_PASSWORD_LENGTH`] characters.
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: MIN_PASSWORD_LENGTH,
        });
    }
    Ok(())
}

/// Validates a display name (customer or product).
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(())
}

pub fn validate_profile(update: &ProfileUpdate) -> ValidationResult<()> {
    validate_name("name", &update.name)
}

// =============================================================================
// Catalog
// =============================================================================

/// Zero is allowed (free items); negative prices are not.
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if !(0..=MAX_PRICE_CENTS).contains(&cents) {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: MAX_PRICE_CENTS,
        });
    }
    Ok(())
}

pub fn validate_stock(stock: i64) -> ValidationResult<()> {
    if !(0..=MAX_QUANTITY).contains(&stock) {
        return Err(ValidationError::OutOfRange {
            field: "stock".to_string(),
            min: 0,
            max: MAX_QUANTITY,
        });
    }
    Ok(())
}

pub fn validate_product(input: &ProductInput) -> ValidationResult<()> {
    validate_name("name", &input.name)?;
    validate_name("category", &input.category)?;
    validate_price_cents(input.price.cents())?;
    validate_stock(input.stock)
}

// =============================================================================
// Invoices
// =============================================================================

/// Must be between 0 and 10000 bps (0% to 100%).
pub fn validate_tax_rate_bps(bps: u32) -> ValidationResult<()> {
    if bps > BPS_SCALE {
        return Err(ValidationError::OutOfRange {
            field: "taxRate".to_string(),
            min: 0,
            max: BPS_SCALE as i64,
        });
    }
    Ok(())
}

pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    if qty > MAX_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_QUANTITY,
        });
    }
    Ok(())
}

/// Field-level checks on an invoice request.
///
/// The "at least one item" and "discount fits" rules are business rules
/// and live in [`crate::invoice`].
pub fn validate_new_invoice(req: &NewInvoice) -> ValidationResult<()> {
    if req.customer_id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "customerId".to_string(),
        });
    }

    if req.items.len() > MAX_INVOICE_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: MAX_INVOICE_ITEMS as i64,
        });
    }

    for item in &req.items {
        validate_name("description", &item.description)?;
        validate_quantity(item.quantity)?;
        validate_price_cents(item.unit_price.cents())?;
    }

    if let Some(rate) = req.tax_rate {
        validate_tax_rate_bps(rate.bps())?;
    }

    if req.discount.is_negative() {
        return Err(ValidationError::OutOfRange {
            field: "discount".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    if let (Some(issue), Some(due)) = (req.issue_date, req.due_date) {
        if due < issue {
            return Err(ValidationError::InvalidFormat {
                field: "dueDate".to_string(),
                reason: "must not be before the issue date".to_string(),
            });
        }
    }

    Ok(())
}

// =============================================================================
// Cart
// =============================================================================

/// Rejects adding a new distinct product once the cart holds
/// [`MAX_CART_ITEMS`].
pub fn validate_cart_size(current_items: usize) -> ValidationResult<()> {
    if current_items >= MAX_CART_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "cart items".to_string(),
            min: 0,
            max: MAX_CART_ITEMS as i64,
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::{Money, TaxRate};
    use crate::types::NewInvoiceItem;
    use chrono::NaiveDate;

    fn invoice_request() -> NewInvoice {
        NewInvoice {
            customer_id: "c1".into(),
            issue_date: None,
            due_date: None,
            items: vec![NewInvoiceItem {
                description: "Consulting".into(),
                quantity: 2,
                unit_price: Money::from_cents(100),
            }],
            tax_rate: Some(TaxRate::from_bps(1900)),
            discount: Money::from_cents(10),
            payment_method: None,
        }
    }

    #[test]
    fn test_validate_email() {
        assert_eq!(validate_email("Ana@Example.com").unwrap(), "ana@example.com");
        assert!(validate_email("").is_err());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("a@b").is_err());
        assert!(validate_email("a@@b.com").is_err());
        assert!(validate_email("a b@c.com").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("123456").is_ok());
        let err = validate_password("12345").unwrap_err();
        assert_eq!(err.to_string(), "password must be at least 6 characters");
    }

    #[test]
    fn test_validate_product() {
        let mut input = ProductInput {
            name: "Mug".into(),
            description: String::new(),
            price: Money::from_cents(1500),
            image_url: String::new(),
            category: "home".into(),
            stock: 3,
        };
        assert!(validate_product(&input).is_ok());

        input.stock = -1;
        assert!(validate_product(&input).is_err());

        input.stock = 0;
        input.price = Money::from_cents(-1);
        assert!(validate_product(&input).is_err());

        input.price = Money::from_cents(MAX_PRICE_CENTS + 1);
        assert!(validate_product(&input).is_err());

        input.price = Money::from_cents(MAX_PRICE_CENTS);
        input.stock = MAX_QUANTITY + 1;
        assert!(validate_product(&input).is_err());
        input.stock = MAX_QUANTITY;
        assert!(validate_product(&input).is_ok());

        input.price = Money::zero();
        input.name = "   ".into();
        assert!(validate_product(&input).is_err());
    }

    #[test]
    fn test_validate_new_invoice() {
        assert!(validate_new_invoice(&invoice_request()).is_ok());

        let mut req = invoice_request();
        req.items[0].quantity = 0;
        assert!(validate_new_invoice(&req).is_err());

        let mut req = invoice_request();
        req.items[0].quantity = MAX_QUANTITY + 1;
        assert!(validate_new_invoice(&req).is_err());

        let mut req = invoice_request();
        req.items[0].unit_price = Money::from_cents(i64::MAX);
        assert!(validate_new_invoice(&req).is_err());

        let mut req = invoice_request();
        let line = req.items[0].clone();
        req.items = vec![line; MAX_INVOICE_ITEMS + 1];
        assert!(validate_new_invoice(&req).is_err());

        let mut req = invoice_request();
        req.tax_rate = Some(TaxRate::from_bps(10_001));
        assert!(validate_new_invoice(&req).is_err());

        let mut req = invoice_request();
        req.discount = Money::from_cents(-5);
        assert!(validate_new_invoice(&req).is_err());

        let mut req = invoice_request();
        req.issue_date = NaiveDate::from_ymd_opt(2026, 2, 1);
        req.due_date = NaiveDate::from_ymd_opt(2026, 1, 1);
        assert!(validate_new_invoice(&req).is_err());
    }

    #[test]
    fn test_validate_cart_size() {
        assert!(validate_cart_size(0).is_ok());
        assert!(validate_cart_size(MAX_CART_ITEMS - 1).is_ok());
        assert!(validate_cart_size(MAX_CART_ITEMS).is_err());
    }
}
