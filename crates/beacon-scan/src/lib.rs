//! # beacon-scan: Code Acquisition and Decode Engine
//!
//! Everything between "photons or keystrokes" and "a normalized Code".
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Beacon POS Scan Path                               │
//! │                                                                         │
//! │   Camera frames      Uploaded image      Wedge scanner / typing         │
//! │        │                   │                     │                      │
//! │        ▼                   ▼                     │                      │
//! │  ┌───────────────────────────────────┐           │                      │
//! │  │      DecoderAdapter               │           │                      │
//! │  │                                   │           │                      │
//! │  │  ┌─────────────┐  sticky  ┌─────┐ │           │                      │
//! │  │  │ Ean13Decoder│ ───────► │fall-│ │           │                      │
//! │  │  │ (structured)│ downgrade│back │ │           │                      │
//! │  │  └─────────────┘          └─────┘ │           │                      │
//! │  └─────────────────┬─────────────────┘           │                      │
//! │                    │                             │                      │
//! │                    ▼                             ▼                      │
//! │              beacon_core::normalize  ◄───────────┘                      │
//! │                    │                                                    │
//! │                    ▼                                                    │
//! │          AcquiredCode → beacon-engine (resolve & dispatch)              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`frame`] - Luma frames and PGM I/O
//! - [`binarize`] - Thresholding and run-length machinery
//! - [`symbology`] - Structured EAN-13/UPC-A decoding (primary tier)
//! - [`fallback`] - Geometric decoder (repeatable-key degradation)
//! - [`adapter`] - One decode contract, session-sticky downgrade
//! - [`capture`] - Camera / still image / wedge channels + debounce
//! - [`render`] - Barcode label rasterization
//! - [`error`] - Scan, capture, and frame error types
//!
//! ## Feature Flags
//!
//! - `symbology` (default): installs the EAN-13 decoder as the primary
//!   tier. Building without it models a deployment where the structured
//!   capability is absent: every session runs on the geometric fallback,
//!   exactly the degradation path the adapter handles at runtime.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod adapter;
pub mod binarize;
pub mod capture;
pub mod error;
pub mod fallback;
pub mod frame;
pub mod render;
pub mod symbology;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use adapter::{Decoded, DecoderAdapter, StructuredDecode};
pub use capture::{
    AcquiredCode, CameraChannel, CameraConfig, CodeSource, Debouncer, FrameSource, NextCode,
    StillImage, WedgeBuffer,
};
pub use error::{CaptureError, FrameError, ScanError};
pub use fallback::{FallbackDecoder, FallbackOptions};
pub use frame::Frame;
pub use render::{render_label, LabelOptions, RenderError};
pub use symbology::Ean13Decoder;
