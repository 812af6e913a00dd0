//! # Validation Module
//!
//! Input validation utilities for Beacon POS.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Acquisition (beacon-scan)                                    │
//! │  ├── Framing stripped, code alphabet enforced by normalize()           │
//! │  └── Malformed input never reaches the store                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Dispatch (beacon-engine)                                     │
//! │  └── THIS MODULE: business rule validation before any mutation         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / UNIQUE constraints                                     │
//! │  └── CHECK (current_stock >= 0)                                        │
//! │                                                                         │
//! │  Defense in depth: multiple layers catch different errors              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::MAX_OPERATION_QUANTITY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product name.
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 200 characters
///
/// ## Example
/// ```rust
/// use beacon_core::validation::validate_product_name;
///
/// assert!(validate_product_name("Lash Extension Kit").is_ok());
/// assert!(validate_product_name("").is_err());
/// ```
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates a category label.
///
/// ## Rules
/// - May be empty (uncategorized stock is allowed)
/// - Must be at most 100 characters
pub fn validate_category(category: &str) -> ValidationResult<()> {
    if category.trim().len() > 100 {
        return Err(ValidationError::TooLong {
            field: "category".to_string(),
            max: 100,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a quantity for stock and sale operations.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_OPERATION_QUANTITY (999)
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Scan found product → operator picks StockOut, qty 20                  │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_quantity(20) ← THIS FUNCTION                                 │
/// │       │                                                                 │
/// │       ├── qty <= 0?  → Error: "quantity must be positive"              │
/// │       ├── qty > 999? → Error: "quantity must be between 1 and 999"     │
/// │       └── OK → proceed to stock check                                  │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_OPERATION_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_OPERATION_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a cost or price in cents.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed (free samples, promotional stock)
///
/// ## Example
/// ```rust
/// use beacon_core::validation::validate_cents;
///
/// assert!(validate_cents("cost", 15000).is_ok());
/// assert!(validate_cents("cost", 0).is_ok());
/// assert!(validate_cents("cost", -100).is_err());
/// ```
pub fn validate_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates initial stock for product creation.
///
/// ## Rules
/// - Must be non-negative (>= 0); zero means "catalog entry only"
pub fn validate_initial_stock(stock: i64) -> ValidationResult<()> {
    if stock < 0 {
        return Err(ValidationError::OutOfRange {
            field: "initial stock".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
