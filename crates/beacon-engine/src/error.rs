//! # Engine Error Type
//!
//! Unified error surface for the resolution/dispatch layer.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Beacon POS                             │
//! │                                                                         │
//! │  CoreError ──┐                                                          │
//! │  DbError   ──┼──► EngineError ──► code() + user_message()               │
//! │  Capture   ──┤         │                                                │
//! │  Render    ──┘         ▼                                                │
//! │              machine code for the surface's control flow,              │
//! │              actionable sentence for the operator                      │
//! │                                                                         │
//! │  Every failure maps to a SPECIFIC next step — rescan, type it in,      │
//! │  correct the quantity — never a generic "an error occurred".           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use thiserror::Error;

use beacon_core::error::CoreError;
use beacon_db::DbError;
use beacon_scan::error::{CaptureError, FrameError, ScanError};
use beacon_scan::render::RenderError;

// =============================================================================
// Engine Error
// =============================================================================

/// Anything the resolution/dispatch layer can fail with.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Business rule or code-derivation failure.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Product store failure.
    #[error(transparent)]
    Db(#[from] DbError),

    /// Acquisition channel failure.
    #[error(transparent)]
    Capture(#[from] CaptureError),

    /// Label rendering failure.
    #[error(transparent)]
    Render(#[from] RenderError),

    /// Raster I/O failure while writing label files.
    #[error(transparent)]
    Frame(#[from] FrameError),
}

/// Machine-readable error codes for the interaction surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Input could not be normalized into a code.
    MalformedCode,
    /// Barcode or SKU collides with an existing product.
    DuplicateCode,
    /// Stock-out or sale exceeds current stock.
    InsufficientStock,
    /// Automatic barcode generation gave up.
    GenerationExhausted,
    /// Camera or image channel unusable.
    CaptureUnavailable,
    /// Referenced product does not exist.
    NotFound,
    /// Operator input failed a business rule.
    Validation,
    /// Storage-layer failure not caused by operator input.
    Storage,
    /// Anything else.
    Internal,
}

impl EngineError {
    /// The machine-readable category of this failure.
    pub fn code(&self) -> ErrorCode {
        match self {
            EngineError::Core(CoreError::MalformedCode { .. }) => ErrorCode::MalformedCode,
            EngineError::Core(CoreError::GenerationExhausted { .. }) => {
                ErrorCode::GenerationExhausted
            }
            EngineError::Core(CoreError::InsufficientStock { .. }) => {
                ErrorCode::InsufficientStock
            }
            EngineError::Core(CoreError::Validation(_)) => ErrorCode::Validation,

            EngineError::Db(DbError::UniqueViolation { .. }) => ErrorCode::DuplicateCode,
            EngineError::Db(DbError::CheckViolation { .. }) => ErrorCode::InsufficientStock,
            EngineError::Db(DbError::NotFound { .. }) => ErrorCode::NotFound,
            EngineError::Db(_) => ErrorCode::Storage,

            EngineError::Capture(CaptureError::Malformed { .. }) => ErrorCode::MalformedCode,
            EngineError::Capture(CaptureError::Unavailable { .. })
            | EngineError::Capture(CaptureError::ChannelClosed) => ErrorCode::CaptureUnavailable,
            EngineError::Capture(CaptureError::Decode(_)) => ErrorCode::Internal,

            EngineError::Render(_) => ErrorCode::Internal,
            EngineError::Frame(_) => ErrorCode::Internal,
        }
    }

    /// An actionable sentence for the operator.
    pub fn user_message(&self) -> String {
        match self {
            EngineError::Core(CoreError::MalformedCode { reason }) => format!(
                "That input is not a valid code ({}). Rescan the label or type the code manually.",
                reason
            ),
            EngineError::Core(CoreError::GenerationExhausted { attempts }) => format!(
                "Automatic barcode generation gave up after {} attempts. Enter a barcode manually to finish creating the product.",
                attempts
            ),
            EngineError::Core(CoreError::InsufficientStock {
                sku,
                available,
                requested,
            }) => format!(
                "Only {} in stock for {} (requested {}). Correct the quantity and try again.",
                available, sku, requested
            ),
            EngineError::Core(CoreError::Validation(err)) => {
                format!("{}. Correct the input and try again.", err)
            }

            EngineError::Db(DbError::UniqueViolation { .. }) => {
                "That barcode or SKU already belongs to another product. Use a different code or open the existing product.".to_string()
            }
            EngineError::Db(DbError::CheckViolation { message }) => format!(
                "The product store refused the update ({}). Refresh the product and try again.",
                message
            ),
            EngineError::Db(DbError::NotFound { entity, id }) => format!(
                "{} {} no longer exists. It may have been removed on this register.",
                entity, id
            ),
            EngineError::Db(err) => format!(
                "The product store is unavailable ({}). Retry, and check the database file if this persists.",
                err
            ),

            EngineError::Capture(CaptureError::Unavailable { reason }) => format!(
                "The camera is unavailable ({}). Use the USB scanner or manual entry instead.",
                reason
            ),
            EngineError::Capture(CaptureError::Malformed { raw, reason }) => format!(
                "Could not read {:?} as a code ({}). Rescan or type it manually.",
                raw, reason
            ),
            EngineError::Capture(CaptureError::Decode(ScanError::NotFound)) => {
                "No barcode was found in that image. Try a sharper, closer photo of the label.".to_string()
            }
            EngineError::Capture(CaptureError::Decode(err)) => format!(
                "The image could not be decoded ({}). Try a sharper, closer photo of the label.",
                err
            ),
            EngineError::Capture(CaptureError::ChannelClosed) => {
                "The scanning channel has stopped. Restart the camera or use manual entry.".to_string()
            }

            EngineError::Render(err) => format!(
                "The label could not be rendered ({}). SKUs print on the code sheet, not as barcodes.",
                err
            ),
            EngineError::Frame(err) => format!(
                "The label file could not be written ({}). Check the output directory.",
                err
            ),
        }
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

// =============================================================================
// Unit Tests
// =============================================================================
