//! # Scan Error Types
//!
//! Error types for the decode and capture layers.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  Decode tier (per frame)                                               │
//! │  ├── ScanError::NotFound          → wait for the next frame            │
//! │  ├── ScanError::NoCandidateRegion → wait for the next frame            │
//! │  ├── ScanError::AmbiguousPattern  → wait for the next frame            │
//! │  └── ScanError::Unavailable       → sticky downgrade to fallback       │
//! │                                                                         │
//! │  Capture tier (per channel)                                            │
//! │  ├── CaptureError::Unavailable    → offer manual entry                 │
//! │  ├── CaptureError::Malformed      → resolver reports Malformed         │
//! │  ├── CaptureError::Decode         → one-shot image failed              │
//! │  └── CaptureError::ChannelClosed  → channel consumed/stopped           │
//! │                                                                         │
//! │  Nothing in this file is fatal: every variant maps to a local          │
//! │  recovery (retry, manual entry) or a typed outcome for the operator.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Scan Error
// =============================================================================

/// Per-frame decode failures.
///
/// `NotFound`, `NoCandidateRegion`, and `AmbiguousPattern` are expected
/// steady-state outcomes while the operator lines up a label — the caller
/// simply awaits the next frame. `Unavailable` is different in kind: the
/// decoder itself cannot run, and the adapter downgrades for the rest of
/// the session.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScanError {
    /// The frame was readable but contained no decodable symbol.
    ///
    /// Not an error in the operational sense; retry on the next frame.
    #[error("no symbol found in frame")]
    NotFound,

    /// No region of the frame passed the barcode proportion filter.
    #[error("no candidate barcode region in frame")]
    NoCandidateRegion,

    /// A candidate region produced mutually inconsistent readings.
    ///
    /// Raised when scan lines across one region disagree with no majority;
    /// emitting any one of them would make the derived key unstable.
    #[error("ambiguous bar pattern in candidate region")]
    AmbiguousPattern,

    /// The decoder capability itself is unusable (loader-level failure).
    ///
    /// Distinct from `NotFound` so callers can tell "no barcode in this
    /// frame" from "decoder unusable" without inspecting error text.
    #[error("decoder unavailable: {0}")]
    Unavailable(String),
}

impl ScanError {
    /// True for failures recovered by simply decoding the next frame.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ScanError::NotFound | ScanError::NoCandidateRegion | ScanError::AmbiguousPattern
        )
    }
}

// =============================================================================
// Capture Error
// =============================================================================

/// Per-channel acquisition failures.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The capture device cannot be opened or has failed mid-session.
    ///
    /// ## When This Occurs
    /// - Camera not connected or claimed by another process
    /// - Device disappears while the channel is running
    ///
    /// The interaction surface downgrades to manual entry; never a crash.
    #[error("capture device unavailable: {reason}")]
    Unavailable { reason: String },

    /// A text burst could not be normalized into a code.
    ///
    /// Carried as a capture failure so the scan cycle can report a
    /// `Malformed` outcome without ever touching the store.
    #[error("malformed input {raw:?}: {reason}")]
    Malformed { raw: String, reason: String },

    /// One-shot image decode failed.
    #[error("image decode failed: {0}")]
    Decode(#[from] ScanError),

    /// The channel is stopped or its one-shot result was already consumed.
    #[error("capture channel closed")]
    ChannelClosed,
}

// =============================================================================
// Frame Error
// =============================================================================

/// Frame construction and raster I/O failures.
#[derive(Debug, Error)]
pub enum FrameError {
    /// Pixel buffer does not match the declared dimensions.
    #[error("frame data length {len} does not match {width}x{height}")]
    InvalidDimensions {
        width: usize,
        height: usize,
        len: usize,
    },

    /// Malformed PGM payload.
    #[error("invalid PGM image: {0}")]
    Pgm(String),

    /// Underlying file I/O failure.
    #[error("image I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_classification() {
        assert!(ScanError::NotFound.is_recoverable());
        assert!(ScanError::NoCandidateRegion.is_recoverable());
        assert!(ScanError::AmbiguousPattern.is_recoverable());
        assert!(!ScanError::Unavailable("probe failed".into()).is_recoverable());
    }

    #[test]
    fn test_error_messages() {
        let err = CaptureError::Unavailable {
            reason: "camera busy".to_string(),
        };
        assert_eq!(err.to_string(), "capture device unavailable: camera busy");
    }
}
