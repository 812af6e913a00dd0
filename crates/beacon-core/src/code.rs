//! # Code Module
//!
//! The `Code` newtype and the normalization contract that every acquisition
//! channel funnels through.
//!
//! ## Why One Normalizer?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                 Every Channel, One Canonical Form                       │
//! │                                                                         │
//! │  Camera decode      "000123456789"        ──┐                           │
//! │  Still image        "000123456789"        ──┤                           │
//! │  Wedge scanner      "000123456789\r\n"    ──┼──► normalize()            │
//! │  Manual entry       "  las-lashkit-0807 " ──┘        │                  │
//! │                                                      ▼                  │
//! │                                          Code("000123456789")           │
//! │                                          Code("LAS-LASHKIT-0807")       │
//! │                                                                         │
//! │  Invariant: two codes compare equal iff their normalized forms are     │
//! │  byte-identical. Lookup keys never depend on which channel produced    │
//! │  them.                                                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! USB wedge scanners emulate a keyboard and terminate each burst with a
//! carriage return (some also inject a line feed or tab); those framing
//! characters are part of the transport, not the code, and are stripped
//! here so the same label scans identically on every channel.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, CoreResult};
use crate::MAX_CODE_LENGTH;

// =============================================================================
// Code Type
// =============================================================================

/// A normalized product code: either a numeric barcode or an alphanumeric SKU.
///
/// ## Invariants
/// - Non-empty, at most `MAX_CODE_LENGTH` characters
/// - Characters drawn from `[A-Z0-9_-]` (alphabetics upper-cased)
/// - No surrounding whitespace, control, or scanner framing characters
///
/// A `Code` can only be obtained through [`normalize`], so holding one is
/// proof the invariants hold. Equality and hashing are plain byte equality
/// of the inner string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Code(String);

impl Code {
    /// Returns the code as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the code, returning the inner string.
    #[inline]
    pub fn into_string(self) -> String {
        self.0
    }

    /// Returns the code length in bytes (equals characters: ASCII only).
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when every character is a decimal digit.
    ///
    /// Generated inventory barcodes are fully numeric; SKUs are not.
    pub fn is_numeric(&self) -> bool {
        self.0.bytes().all(|b| b.is_ascii_digit())
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        // Unreachable for a constructed Code, provided for completeness.
        self.0.is_empty()
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Code {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// =============================================================================
// Normalization
// =============================================================================

/// Canonicalizes raw decoded or typed input into a [`Code`].
///
/// ## What Gets Stripped
/// Leading and trailing whitespace and control characters. This covers the
/// `\r`/`\r\n` terminators injected by HID-mode wedge scanners as well as
/// copy-paste padding from manual entry.
///
/// ## What Gets Rejected
/// - Empty input, or input that is nothing but framing
/// - Input longer than [`MAX_CODE_LENGTH`] after trimming
/// - Characters outside `[A-Za-z0-9_-]` (embedded spaces included)
///
/// ## Properties
/// Pure and idempotent: `normalize(normalize(s)) == normalize(s)` for every
/// accepted `s`.
///
/// ## Example
/// ```rust
/// use beacon_core::code::normalize;
///
/// let a = normalize("las-lashkit-0807\r\n").unwrap();
/// let b = normalize("  LAS-LASHKIT-0807").unwrap();
/// assert_eq!(a, b);
///
/// assert!(normalize("").is_err());
/// assert!(normalize("bad code!").is_err());
/// ```
pub fn normalize(raw: &str) -> CoreResult<Code> {
    let trimmed = raw.trim_matches(|c: char| c.is_whitespace() || c.is_control());

    if trimmed.is_empty() {
        return Err(CoreError::malformed("empty input"));
    }

    if trimmed.len() > MAX_CODE_LENGTH {
        return Err(CoreError::malformed(format!(
            "input exceeds {} characters",
            MAX_CODE_LENGTH
        )));
    }

    if let Some(bad) = trimmed
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
    {
        return Err(CoreError::malformed(format!(
            "invalid character {:?}; codes use letters, digits, hyphens, and underscores",
            bad
        )));
    }

    Ok(Code(trimmed.to_ascii_uppercase()))
}

// =============================================================================
// Unit Tests
// =============================================================================
