//! # Validation Module
//!
//! Field-level input validation for Stockbook.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Browser UI                                                   │
//! │  └── Basic format checks (empty, length)                               │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Server service (Rust)                                        │
//! │  ├── Type validation (JSON deserialization)                            │
//! │  └── THIS MODULE: normalization + field rules                          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  └── UNIQUE (owner_id, sku)                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use stockbook_core::validation::{normalize_sku, validate_quantity};
//!
//! assert_eq!(normalize_sku("  cola-330 ").unwrap(), "COLA-330");
//! validate_quantity(5).unwrap();
//! ```

use crate::error::ValidationError;
use crate::types::{ExpenseDraft, ItemDraft};
use crate::{MAX_CART_LINES, MAX_LINE_QUANTITY, MAX_PRICE_CENTS, MAX_STOCK_LEVEL};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

pub const MAX_NAME_LEN: usize = 200;
pub const MAX_SKU_LEN: usize = 50;
pub const MAX_TEXT_LEN: usize = 1000;
pub const MIN_PASSWORD_LEN: usize = 8;

// =============================================================================
// String Validators
// =============================================================================

/// Trims and upper-cases a SKU, then validates it.
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Letters, numbers, hyphens and underscores only
///
/// ## Example
/// ```rust
/// use stockbook_core::validation::normalize_sku;
///
/// assert_eq!(normalize_sku("coke-330").unwrap(), "COKE-330");
/// assert!(normalize_sku("").is_err());
/// assert!(normalize_sku("has space").is_err());
/// ```
pub fn normalize_sku(sku: &str) -> ValidationResult<String> {
    let sku = sku.trim().to_uppercase();

    if sku.is_empty() {
        return Err(ValidationError::Required {
            field: "sku".to_string(),
        });
    }

    if sku.chars().count() > MAX_SKU_LEN {
        return Err(ValidationError::TooLong {
            field: "sku".to_string(),
            max: MAX_SKU_LEN,
        });
    }

    if !sku
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "sku".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(sku)
}

/// Validates a required name-like field and returns it trimmed.
pub fn validate_name(field: &str, value: &str) -> ValidationResult<String> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(value.to_string())
}

/// Trims an optional free-text field; blank becomes `None`.
pub fn normalize_optional_text(
    field: &str,
    value: Option<&str>,
) -> ValidationResult<Option<String>> {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };

    if value.chars().count() > MAX_TEXT_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_TEXT_LEN,
        });
    }

    Ok(Some(value.to_string()))
}

/// Validates an email address and returns it lower-cased.
///
/// Only the shape is checked: one `@` with a non-empty local part and a
/// dotted domain.
pub fn normalize_email(email: &str) -> ValidationResult<String> {
    let email = email.trim().to_lowercase();

    if email.is_empty() {
        return Err(ValidationError::Required {
            field: "email".to_string(),
        });
    }

    let invalid = || ValidationError::InvalidFormat {
        field: "email".to_string(),
        reason: "must look like name@example.com".to_string(),
    };

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty()
        || domain.contains('@')
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
        || email.chars().any(char::is_whitespace)
    {
        return Err(invalid());
    }

    Ok(email)
}

/// Validates a new password.
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::InvalidFormat {
            field: "password".to_string(),
            reason: format!("must be at least {} characters", MIN_PASSWORD_LEN),
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity (units or boxes).
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_LINE_QUANTITY
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a stock level; zero is allowed.
pub fn validate_stock_level(qty: i64) -> ValidationResult<()> {
    if !(0..=MAX_STOCK_LEVEL).contains(&qty) {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 0,
            max: MAX_STOCK_LEVEL,
        });
    }

    Ok(())
}

/// Validates a price in cents.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed (free items)
/// - Must not exceed MAX_PRICE_CENTS
///
/// ## Example
/// ```rust
/// use stockbook_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents(1099).is_ok());
/// assert!(validate_price_cents(0).is_ok());
/// assert!(validate_price_cents(-100).is_err());
/// assert!(validate_price_cents(100_000_000_000_000_000).is_err());
/// ```
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

/// Validates an expense amount in cents.
pub fn validate_amount_cents(cents: i64) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "amount".to_string(),
        });
    }
    if cents > MAX_PRICE_CENTS {
        return Err(ValidationError::OutOfRange {
            field: "amount".to_string(),
            min: 1,
            max: MAX_PRICE_CENTS,
        });
    }

    Ok(())
}

/// Validates a manual stock adjustment.
///
/// Zero is rejected; the magnitude may not exceed MAX_STOCK_LEVEL.
pub fn validate_stock_delta(delta: i64) -> ValidationResult<()> {
    if delta == 0 {
        return Err(ValidationError::InvalidFormat {
            field: "delta".to_string(),
            reason: "must not be zero".to_string(),
        });
    }
    if !(-MAX_STOCK_LEVEL..=MAX_STOCK_LEVEL).contains(&delta) {
        return Err(ValidationError::OutOfRange {
            field: "delta".to_string(),
            min: -MAX_STOCK_LEVEL,
            max: MAX_STOCK_LEVEL,
        });
    }

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates cart size (number of distinct lines).
pub fn validate_cart_size(current_lines: usize) -> ValidationResult<()> {
    if current_lines >= MAX_CART_LINES {
        return Err(ValidationError::OutOfRange {
            field: "cart lines".to_string(),
            min: 0,
            max: MAX_CART_LINES as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Draft Validators
// =============================================================================

/// Normalizes an item draft in place: trimmed name, upper-cased SKU,
/// blank optionals dropped.
pub fn normalize_item_draft(draft: ItemDraft) -> ValidationResult<ItemDraft> {
    validate_price_cents(draft.price_cents)?;
    validate_stock_level(draft.quantity)?;

    Ok(ItemDraft {
        name: validate_name("name", &draft.name)?,
        sku: normalize_sku(&draft.sku)?,
        price_cents: draft.price_cents,
        quantity: draft.quantity,
        description: normalize_optional_text("description", draft.description.as_deref())?,
        vendor: normalize_optional_text("vendor", draft.vendor.as_deref())?,
    })
}

/// Normalizes an expense draft.
pub fn normalize_expense_draft(draft: ExpenseDraft) -> ValidationResult<ExpenseDraft> {
    validate_amount_cents(draft.amount_cents)?;

    Ok(ExpenseDraft {
        name: validate_name("name", &draft.name)?,
        category: draft.category,
        amount_cents: draft.amount_cents,
        description: normalize_optional_text("description", draft.description.as_deref())?,
        expense_date: draft.expense_date,
    })
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string format.
///
/// ## Example
/// ```rust
/// use stockbook_core::validation::validate_uuid;
///
/// assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("not-a-uuid").is_err());
/// ```
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ExpenseCategory;

    #[test]
    fn test_normalize_sku() {
        assert_eq!(normalize_sku("coke-330").unwrap(), "COKE-330");
        assert_eq!(normalize_sku("  abc_1 ").unwrap(), "ABC_1");

        assert!(normalize_sku("").is_err());
        assert!(normalize_sku("   ").is_err());
        assert!(normalize_sku("has space").is_err());
        assert!(normalize_sku(&"A".repeat(51)).is_err());
    }

    #[test]
    fn test_validate_name() {
        assert_eq!(validate_name("name", "  Cola ").unwrap(), "Cola");
        assert!(validate_name("name", "").is_err());
        assert!(validate_name("name", &"A".repeat(300)).is_err());
    }

    #[test]
    fn test_normalize_optional_text() {
        assert_eq!(normalize_optional_text("notes", Some("  ")).unwrap(), None);
        assert_eq!(normalize_optional_text("notes", None).unwrap(), None);
        assert_eq!(
            normalize_optional_text("notes", Some(" hi ")).unwrap(),
            Some("hi".to_string())
        );
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email(" Owner@Shop.COM ").unwrap(), "owner@shop.com");
        assert!(normalize_email("").is_err());
        assert!(normalize_email("owner").is_err());
        assert!(normalize_email("@shop.com").is_err());
        assert!(normalize_email("owner@shop").is_err());
        assert!(normalize_email("a@b@c.com").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("longenough").is_ok());
        assert!(validate_password("short").is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(MAX_LINE_QUANTITY).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(MAX_LINE_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_validate_price_and_amount() {
        assert!(validate_price_cents(0).is_ok());
        assert!(validate_price_cents(-1).is_err());
        assert!(validate_amount_cents(1).is_ok());
        assert!(validate_amount_cents(0).is_err());

        assert!(validate_price_cents(MAX_PRICE_CENTS).is_ok());
        assert!(validate_price_cents(MAX_PRICE_CENTS + 1).is_err());
        assert!(validate_amount_cents(MAX_PRICE_CENTS).is_ok());
        assert!(validate_amount_cents(i64::MAX).is_err());
    }

    #[test]
    fn test_validate_stock_delta() {
        assert!(validate_stock_delta(-3).is_ok());
        assert!(validate_stock_delta(MAX_STOCK_LEVEL).is_ok());
        assert!(validate_stock_delta(0).is_err());
        assert!(validate_stock_delta(MAX_STOCK_LEVEL + 1).is_err());
        assert!(validate_stock_delta(i64::MIN).is_err());
    }

    #[test]
    fn test_validate_cart_size() {
        assert!(validate_cart_size(0).is_ok());
        assert!(validate_cart_size(MAX_CART_LINES - 1).is_ok());
        assert!(validate_cart_size(MAX_CART_LINES).is_err());
    }

    #[test]
    fn test_normalize_item_draft() {
        let draft = ItemDraft {
            name: " Cola ".to_string(),
            sku: "cola".to_string(),
            price_cents: 150,
            quantity: 0,
            description: Some("".to_string()),
            vendor: Some(" Acme ".to_string()),
        };

        let normalized = normalize_item_draft(draft).unwrap();
        assert_eq!(normalized.name, "Cola");
        assert_eq!(normalized.sku, "COLA");
        assert_eq!(normalized.description, None);
        assert_eq!(normalized.vendor.as_deref(), Some("Acme"));
    }

    #[test]
    fn test_normalize_expense_draft_rejects_zero_amount() {
        let draft = ExpenseDraft {
            name: "Rent".to_string(),
            category: ExpenseCategory::Rent,
            amount_cents: 0,
            description: None,
            expense_date: None,
        };
        assert!(normalize_expense_draft(draft).is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("").is_err());
        assert!(validate_uuid("not-a-uuid").is_err());
    }
}
