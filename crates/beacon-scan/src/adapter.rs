//! # Decoder Adapter Module
//!
//! One decode contract over two tiers, with a session-sticky downgrade.
//!
//! ## Downgrade State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Decoder Adapter States                               │
//! │                                                                         │
//! │  construction                                                          │
//! │       │ probe structured capability (once per session)                 │
//! │       ▼                                                                 │
//! │  ┌──────────────┐  Unavailable (probe or decode)  ┌──────────────┐     │
//! │  │  STRUCTURED  │ ───────────────────────────────►│  DOWNGRADED  │     │
//! │  │  (primary)   │         one-way, logged once    │  (fallback)  │     │
//! │  └──────┬───────┘                                 └──────┬───────┘     │
//! │         │                                                │             │
//! │         │ NotFound → caller retries next frame           │             │
//! │         │ (NOT a downgrade trigger)                      │             │
//! │         ▼                                                ▼             │
//! │      Decoded { method: Structured }        Decoded { method: Fallback }│
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Probing once and keeping the flag sticky avoids re-probing cost and
//! repeated failure noise on every frame; the operator is told about the
//! downgrade exactly once.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{info, warn};

use beacon_core::code::Code;
use beacon_core::types::DecodeMethod;

use crate::error::ScanError;
use crate::fallback::FallbackDecoder;
use crate::frame::Frame;
use crate::symbology::Ean13Decoder;

// =============================================================================
// Structured Decode Capability
// =============================================================================

/// The structured (symbology-aware) decode capability.
///
/// `probe` answers "is this capability loadable at all" — a loader-level
/// question, asked once per session. `decode` may still return
/// [`ScanError::Unavailable`] later if the capability dies mid-session;
/// the adapter treats that identically to a failed probe.
pub trait StructuredDecode: Send + Sync {
    /// Loader-level availability check.
    fn probe(&self) -> Result<(), ScanError>;

    /// Decodes one frame. `NotFound` means "no symbol here", which is a
    /// normal per-frame outcome, never a capability failure.
    fn decode(&self, frame: &Frame) -> Result<Code, ScanError>;
}

impl StructuredDecode for Ean13Decoder {
    fn probe(&self) -> Result<(), ScanError> {
        // Compiled-in decoder: always loadable. The probe exists for
        // injected capabilities that may not be.
        Ok(())
    }

    fn decode(&self, frame: &Frame) -> Result<Code, ScanError> {
        Ean13Decoder::decode(self, frame)
    }
}

// =============================================================================
// Decoded Result
// =============================================================================

/// A successful decode, tagged with the tier that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub code: Code,
    pub method: DecodeMethod,
}

// =============================================================================
// Adapter
// =============================================================================

/// Polymorphic decode front end: structured tier when available, geometric
/// fallback otherwise, with a one-way in-session downgrade.
pub struct DecoderAdapter {
    structured: Option<Box<dyn StructuredDecode>>,
    fallback: FallbackDecoder,
    downgraded: AtomicBool,
}

impl DecoderAdapter {
    /// Creates the adapter with the default capability set.
    ///
    /// With the `symbology` feature the EAN-13 decoder is the primary tier;
    /// without it the session starts (and stays) on the fallback.
    pub fn new() -> Self {
        #[cfg(feature = "symbology")]
        return DecoderAdapter::with_structured(Box::new(Ean13Decoder::default()));

        #[cfg(not(feature = "symbology"))]
        DecoderAdapter::fallback_only()
    }

    /// Creates the adapter around an injected structured capability,
    /// probing it once.
    pub fn with_structured(decoder: Box<dyn StructuredDecode>) -> Self {
        let adapter = DecoderAdapter {
            structured: Some(decoder),
            fallback: FallbackDecoder::default(),
            downgraded: AtomicBool::new(false),
        };

        if let Some(structured) = &adapter.structured {
            if let Err(err) = structured.probe() {
                adapter.mark_downgraded(&err.to_string());
            }
        }

        adapter
    }

    /// Creates an adapter with no structured tier at all.
    pub fn fallback_only() -> Self {
        info!("structured decoder absent; geometric fallback active for this session");
        DecoderAdapter {
            structured: None,
            fallback: FallbackDecoder::default(),
            downgraded: AtomicBool::new(true),
        }
    }

    /// Decodes one frame through whichever tier the session is on.
    ///
    /// ## Returns
    /// * `Ok(Decoded)` - code plus the tier that produced it
    /// * `Err(ScanError::NotFound)` - structured tier saw no symbol; retry
    /// * `Err(ScanError::NoCandidateRegion | AmbiguousPattern)` - fallback
    ///   tier could not derive a key from this frame; retry
    pub fn decode(&self, frame: &Frame) -> Result<Decoded, ScanError> {
        if !self.is_downgraded() {
            if let Some(structured) = &self.structured {
                match structured.decode(frame) {
                    Ok(code) => {
                        return Ok(Decoded {
                            code,
                            method: DecodeMethod::Structured,
                        })
                    }
                    // No symbol in this frame — a normal outcome, the
                    // caller retries on the next frame.
                    Err(ScanError::NotFound) => return Err(ScanError::NotFound),
                    // Loader-level failure: downgrade for the session and
                    // serve this very call from the fallback.
                    Err(ScanError::Unavailable(reason)) => self.mark_downgraded(&reason),
                    Err(other) => return Err(other),
                }
            }
        }

        self.fallback.decode(frame).map(|code| Decoded {
            code,
            method: DecodeMethod::Fallback,
        })
    }

    /// Which tier the next decode will run on.
    pub fn method(&self) -> DecodeMethod {
        if self.structured.is_some() && !self.is_downgraded() {
            DecodeMethod::Structured
        } else {
            DecodeMethod::Fallback
        }
    }

    /// True once the session has permanently fallen back.
    pub fn is_downgraded(&self) -> bool {
        self.downgraded.load(Ordering::Acquire)
    }

    /// Flips the sticky flag; the notice is logged only on the transition.
    fn mark_downgraded(&self, reason: &str) {
        if !self.downgraded.swap(true, Ordering::AcqRel) {
            warn!(
                reason = %reason,
                "structured decoder unavailable; using geometric fallback for the rest of the session"
            );
        }
    }
}

impl Default for DecoderAdapter {
    fn default() -> Self {
        DecoderAdapter::new()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    use beacon_core::code::normalize;

    use crate::render::{render_label, LabelOptions};

    /// Stub whose probe fails outright.
    struct BrokenLoader;

    impl StructuredDecode for BrokenLoader {
        fn probe(&self) -> Result<(), ScanError> {
            Err(ScanError::Unavailable("shared library missing".into()))
        }

        fn decode(&self, _frame: &Frame) -> Result<Code, ScanError> {
            panic!("decode must never run after a failed probe");
        }
    }

    /// Stub that dies on its first decode call.
    struct DiesMidSession {
        calls: Arc<AtomicUsize>,
    }

    impl StructuredDecode for DiesMidSession {
        fn probe(&self) -> Result<(), ScanError> {
            Ok(())
        }

        fn decode(&self, _frame: &Frame) -> Result<Code, ScanError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(ScanError::Unavailable("decoder handle lost".into()))
        }
    }

    /// Stub that never finds a symbol.
    struct NeverFinds {
        calls: Arc<AtomicUsize>,
    }

    impl StructuredDecode for NeverFinds {
        fn probe(&self) -> Result<(), ScanError> {
            Ok(())
        }

        fn decode(&self, _frame: &Frame) -> Result<Code, ScanError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(ScanError::NotFound)
        }
    }

    /// A rendered label blitted into a larger white scene, the shape both
    /// tiers accept: the structured decoder reads the symbol, the fallback
    /// sees a wide bar band inside a mostly empty frame.
    fn label_frame() -> Frame {
        let code = normalize("000123456789").unwrap();
        let label = render_label(&code, &LabelOptions::default()).unwrap();

        let mut scene = Frame::filled(480, 360, 255);
        let (ox, oy) = (70, 120);
        for y in 0..label.height() {
            scene.row_mut(oy + y)[ox..ox + label.width()].copy_from_slice(label.row(y));
        }
        scene
    }

    #[test]
    fn test_default_adapter_decodes_structured() {
        let adapter = DecoderAdapter::new();
        let decoded = adapter.decode(&label_frame()).unwrap();
        assert_eq!(decoded.method, DecodeMethod::Structured);
        assert_eq!(decoded.code.as_str(), "000123456789");
        assert!(!adapter.is_downgraded());
    }

    #[test]
    fn test_failed_probe_downgrades_before_first_decode() {
        let adapter = DecoderAdapter::with_structured(Box::new(BrokenLoader));
        assert!(adapter.is_downgraded());
        assert_eq!(adapter.method(), DecodeMethod::Fallback);

        // Decodes still work — served by the fallback tier.
        let decoded = adapter.decode(&label_frame()).unwrap();
        assert_eq!(decoded.method, DecodeMethod::Fallback);
    }

    #[test]
    fn test_mid_session_failure_is_sticky() {
        let calls = Arc::new(AtomicUsize::new(0));
        let adapter = DecoderAdapter::with_structured(Box::new(DiesMidSession {
            calls: Arc::clone(&calls),
        }));

        // First decode hits the structured tier, which dies; the same call
        // is served by the fallback.
        let decoded = adapter.decode(&label_frame()).unwrap();
        assert_eq!(decoded.method, DecodeMethod::Fallback);
        assert!(adapter.is_downgraded());

        // Subsequent decodes never touch the structured tier again.
        let _ = adapter.decode(&label_frame()).unwrap();
        let _ = adapter.decode(&label_frame()).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_not_found_does_not_downgrade() {
        let calls = Arc::new(AtomicUsize::new(0));
        let adapter = DecoderAdapter::with_structured(Box::new(NeverFinds {
            calls: Arc::clone(&calls),
        }));

        assert_eq!(
            adapter.decode(&label_frame()).unwrap_err(),
            ScanError::NotFound
        );
        assert_eq!(
            adapter.decode(&label_frame()).unwrap_err(),
            ScanError::NotFound
        );

        assert!(!adapter.is_downgraded());
        assert_eq!(adapter.method(), DecodeMethod::Structured);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_fallback_and_structured_report_their_methods() {
        let adapter = DecoderAdapter::fallback_only();
        assert_eq!(adapter.method(), DecodeMethod::Fallback);
        assert!(adapter.is_downgraded());
    }
}
