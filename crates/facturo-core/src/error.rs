//! # Error Types
//!
//! Domain errors for facturo-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  facturo-core errors (this file)                                       │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  facturo-db errors (separate crate)                                    │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  admin-api errors                                                      │
//! │  └── ApiError         - What the frontend sees (JSON)                  │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ApiError → Frontend               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Cart mutations have no error type at all: invalid input is ignored.
//! These errors cover everything around the cart.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

#[derive(Debug, Error)]
pub enum CoreError {
    /// Discount larger than subtotal + tax.
    ///
    /// The calculator itself happily returns a negative total; callers
    /// check before persisting.
    #[error("Discount {discount} exceeds invoice amount {available}")]
    DiscountTooLarge { discount: i64, available: i64 },

    /// An invoice needs at least one line.
    #[error("Invoice must have at least one item")]
    EmptyInvoice,

    /// An amount left the representable range of `Money`.
    #[error("Amount out of range while computing {context}")]
    AmountOverflow { context: String },

    /// Checkout on an empty cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// Stock dropped below the cart quantity between add and checkout.
    ///
    /// ```text
    /// Add to Cart (qty 3, stock 3)
    ///      │
    ///      ▼
    /// Another customer buys 2
    ///      │
    ///      ▼
    /// Checkout: InsufficientStock { product: "Mug", available: 1, requested: 3 }
    /// ```
    #[error("Insufficient stock for {product}: available {available}, requested {requested}")]
    InsufficientStock {
        product: String,
        available: i64,
        requested: i64,
    },

    /// The configured admin account cannot be demoted or deleted.
    #[error("The primary admin account cannot be {action}")]
    ProtectedAccount { action: String },

    #[error("Not allowed to {action}")]
    Forbidden { action: String },

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors, raised before any business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    #[error("{field} must be positive")]
    MustBePositive { field: String },

    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            product: "Mug".to_string(),
            available: 1,
            requested: 3,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Mug: available 1, requested 3"
        );

        let err = CoreError::ProtectedAccount {
            action: "deleted".to_string(),
        };
        assert_eq!(err.to_string(), "The primary admin account cannot be deleted");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::TooShort {
            field: "password".to_string(),
            min: 6,
        };
        assert_eq!(err.to_string(), "password must be at least 6 characters");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::Required {
            field: "email".to_string(),
        }
        .into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
