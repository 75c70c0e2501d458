//! # Error Types
//!
//! Domain-specific error types for stockbook-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  stockbook-core errors (this file)                                     │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  stockbook-db errors                                                   │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  server errors                                                         │
//! │  └── ApiError         - What the browser sees (serialized)             │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Browser      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Item cannot be found among the owner's items.
    #[error("Item not found: {0}")]
    ItemNotFound(String),

    /// Another item already uses this SKU.
    ///
    /// The message is shown verbatim in the UI.
    #[error("An item with SKU '{sku}' already exists")]
    DuplicateSku { sku: String },

    /// Selling more than the item has in stock.
    #[error("Insufficient stock for {name}: available {available}, requested {requested}")]
    InsufficientStock {
        name: String,
        available: i64,
        requested: i64,
    },

    /// Sale or purchase has no lines.
    #[error("Cart is empty")]
    EmptyCart,

    /// Cart has exceeded the maximum number of lines.
    #[error("Cart cannot have more than {max} lines")]
    CartTooLarge { max: usize },

    /// Retail sales stop below one box.
    #[error("Retail sales are limited to {max} units (cart has {total})")]
    RetailQuantityExceeded { total: i64, max: i64 },

    /// Wholesale sales start at one box.
    #[error("Wholesale sales require at least {min} units (cart has {total})")]
    WholesaleQuantityTooSmall { total: i64, min: i64 },

    /// Cash and credit amounts do not add up to the sale total.
    #[error("Payment of {received} does not match sale total {expected}")]
    PaymentMismatch { expected: Money, received: Money },

    /// Neither cash nor credit was selected.
    #[error("Select at least one payment method")]
    NoPaymentMethod,

    /// A payment method that is switched off carries an amount.
    #[error("{method} amount must be zero when {method} is not selected")]
    UnselectedPaymentAmount { method: String },

    /// Spreadsheet import could not be read.
    #[error("Import failed: {0}")]
    Import(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// A computed amount does not fit.
    #[error("{field} is too large")]
    TooLarge { field: String },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, unparseable amount).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_sku_message_is_user_facing() {
        let err = CoreError::DuplicateSku {
            sku: "COLA-330".to_string(),
        };
        assert_eq!(err.to_string(), "An item with SKU 'COLA-330' already exists");
    }

    #[test]
    fn test_payment_mismatch_formats_money() {
        let err = CoreError::PaymentMismatch {
            expected: Money::from_cents(1000),
            received: Money::from_cents(950),
        };
        assert_eq!(
            err.to_string(),
            "Payment of $9.50 does not match sale total $10.00"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "sku".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
