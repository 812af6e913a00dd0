//! # Error Types
//!
//! Domain-specific error types for beacon-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  beacon-core errors (this file)                                        │
//! │  ├── CoreError        - Business rule and code-derivation failures     │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  beacon-scan errors (separate crate)                                   │
//! │  ├── ScanError        - Decode failures (per frame, recoverable)       │
//! │  └── CaptureError     - Channel/device failures                        │
//! │                                                                         │
//! │  beacon-db errors (separate crate)                                     │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  beacon-engine errors (separate crate)                                 │
//! │  └── EngineError      - What the interaction surface sees              │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → EngineError → operator message    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (code, quantities, attempt counts)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to a user-facing message

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations or code-derivation
/// failures. They should be caught and translated to operator-facing
/// messages by the engine layer.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Raw input cannot be normalized into a Code.
    ///
    /// ## When This Occurs
    /// - Empty input (or input that is all framing/whitespace)
    /// - Input longer than `MAX_CODE_LENGTH`
    /// - Characters outside the code alphabet
    ///
    /// Raised before any store query is made.
    #[error("Malformed code: {reason}")]
    MalformedCode { reason: String },

    /// Barcode generation failed to find a free value.
    ///
    /// ## When This Occurs
    /// Every draw within the attempt bound collided with the existing-code
    /// set. Effectively unreachable with a real catalog against a 12-digit
    /// space, but handled rather than assumed away: creation is blocked
    /// until a barcode is supplied manually.
    #[error("Barcode generation exhausted after {attempts} attempts")]
    GenerationExhausted { attempts: u32 },

    /// Insufficient stock to complete a stock-out or sale.
    ///
    /// ## User Workflow
    /// ```text
    /// StockOut(qty: 20)
    ///      │
    ///      ▼
    /// Check stock: available=7
    ///      │
    ///      ▼
    /// InsufficientStock { sku: "LAS-LASHKIT-0807", available: 7, requested: 20 }
    ///      │
    ///      ▼
    /// UI shows: "Only 7 in stock for LAS-LASHKIT-0807"
    /// ```
    #[error("Insufficient stock for {sku}: available {available}, requested {requested}")]
    InsufficientStock {
        sku: String,
        available: i64,
        requested: i64,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates a MalformedCode error with the given reason.
    pub fn malformed(reason: impl Into<String>) -> Self {
        CoreError::MalformedCode {
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when operator input doesn't meet requirements.
/// Used for early validation before business logic runs.
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

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., non-numeric barcode, bad characters).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Duplicate value (e.g., duplicate SKU or barcode).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
