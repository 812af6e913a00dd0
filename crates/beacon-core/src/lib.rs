//! # beacon-core: Pure Business Logic for Beacon POS
//!
//! This crate is the **heart** of Beacon POS. It contains all business logic
//! as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Beacon POS Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Capture Channels (beacon-scan)                  │   │
//! │  │   Camera frames ── Still image ── Wedge scanner ── Manual       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ decoded / typed text                   │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ beacon-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   code    │  │  codegen  │  │   money   │  │ validation│  │   │
//! │  │   │ normalize │  │ SKU/EAN   │  │   cents   │  │   rules   │  │   │
//! │  │   │   Code    │  │  derive   │  │  profit   │  │   checks  │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK • PURE FUNCTIONS             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │            beacon-engine (resolve + dispatch)                   │   │
//! │  │            beacon-db (SQLite product store)                     │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`code`] - Code newtype and the normalization contract
//! - [`codegen`] - Deterministic SKU and barcode derivation
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`types`] - Domain types (Product, SaleRecord, ScanEvent, etc.)
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, camera, file system access is FORBIDDEN here
//! 3. **Explicit Entropy**: Anything random or clock-derived is an argument
//! 4. **Integer Money**: All monetary values are in cents (i64) to avoid float errors
//! 5. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use beacon_core::code::normalize;
//!
//! // A wedge scanner delivers "000123456789\r\n"; the normalizer strips the
//! // HID framing and yields the canonical lookup key.
//! let code = normalize("000123456789\r\n").unwrap();
//! assert_eq!(code.as_str(), "000123456789");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod code;
pub mod codegen;
pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use beacon_core::Code` instead of
// `use beacon_core::code::Code`

pub use code::{normalize, Code};
pub use codegen::{generate_barcode, generate_sku, GeneratedSku};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum accepted length of a raw code, in characters.
///
/// ## Business Reason
/// Longer input is never a product code: wedge scanners emit at most a few
/// dozen characters per burst, and anything beyond this is a paste mistake
/// or corrupted read. Rejected as `MalformedCode` before any store query.
pub const MAX_CODE_LENGTH: usize = 64;

/// Length of generated numeric inventory barcodes.
///
/// ## Business Reason
/// 12 digits matches the UPC-A payload width, so generated codes print and
/// scan with ordinary retail label stock and hand scanners.
pub const BARCODE_LENGTH: usize = 12;

/// Upper bound on collision re-draws in [`codegen::generate_barcode`].
///
/// ## Business Reason
/// The 12-digit space holds 10^12 values; a shop catalog cannot meaningfully
/// fill it. The bound exists so a pathological existing-code set produces a
/// reportable `GenerationExhausted` instead of a spin.
pub const MAX_GENERATION_ATTEMPTS: u32 = 64;

/// Maximum quantity accepted for a single stock or sale operation.
///
/// ## Business Reason
/// Prevents accidental over-entry (e.g., typing 1000 instead of 10).
pub const MAX_OPERATION_QUANTITY: i64 = 999;
