//! # Symbology Module
//!
//! Structured EAN-13/UPC-A decoding — the primary decode tier.
//!
//! ## Decode Walkthrough
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    One Scan Row, Start To Finish                        │
//! │                                                                         │
//! │  luma row                                                               │
//! │   │  binarize (adaptive, global fallback) + run lengths                 │
//! │   ▼                                                                     │
//! │  modules: [4, 1,1,1, 3,2,1,1, ... , 1,1,1,1,1, ... , 1,1,1, 4]         │
//! │            │   └start guard  digits       └center guard   └end guard    │
//! │            └quiet zone (clamped wide run)                               │
//! │   │                                                                     │
//! │   ├── left half: 6 digits, 4 runs each, matched against A and B        │
//! │   │   width patterns; which of A/B won per digit forms the parity      │
//! │   │   mask that encodes digit 1                                         │
//! │   ├── right half: 6 digits against the C patterns                       │
//! │   └── modulo-10 checksum over all 13 digits                             │
//! │   ▼                                                                     │
//! │  payload: first 12 digits (check digit verified, then dropped)          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Inventory Convention
//! Generated inventory barcodes are 12 digits. Labels printed by the render
//! module carry those 12 digits plus a computed EAN-13 check digit; this
//! decoder verifies the checksum and returns the 12-digit payload, so a
//! printed label scans back to exactly the stored barcode. Scanning retail
//! EAN-13 packaging yields its 12 payload digits the same way, which is a
//! stable lookup key per physical product.

use beacon_core::code::{normalize, Code};

use crate::binarize::{binarize_row, binarize_row_adaptive, quantize_modules, runs};
use crate::error::ScanError;
use crate::frame::Frame;

/// Default number of evenly spaced rows sampled per frame.
pub const DEFAULT_SCAN_ROWS: usize = 15;

/// Minimum run count for a row to plausibly hold an EAN-13 symbol
/// (59 bar/space runs plus quiet zones when clean).
const MIN_ROW_RUNS: usize = 40;

// =============================================================================
// Width Pattern Tables
// =============================================================================
// Each digit is four runs summing to seven modules. The left half uses the
// A set or its mirrored B set (the mix encodes the implicit first digit);
// the right half uses C, which shares A's run widths.

pub(crate) const LEFT_A: [[u8; 4]; 10] = [
    [3, 2, 1, 1],
    [2, 2, 2, 1],
    [2, 1, 2, 2],
    [1, 4, 1, 1],
    [1, 1, 3, 2],
    [1, 2, 3, 1],
    [1, 1, 1, 4],
    [1, 3, 1, 2],
    [1, 2, 1, 3],
    [3, 1, 1, 2],
];

pub(crate) const LEFT_B: [[u8; 4]; 10] = [
    [1, 1, 2, 3],
    [1, 2, 2, 2],
    [2, 2, 1, 2],
    [1, 1, 4, 1],
    [2, 3, 1, 1],
    [1, 3, 2, 1],
    [4, 1, 1, 1],
    [2, 1, 3, 1],
    [3, 1, 2, 1],
    [2, 1, 1, 3],
];

pub(crate) const RIGHT_C: [[u8; 4]; 10] = LEFT_A;

/// Parity of the six left digits (false = A, true = B) indexed by the
/// implicit first digit.
pub(crate) const FIRST_DIGIT_PARITY: [[bool; 6]; 10] = [
    [false, false, false, false, false, false], // 0
    [false, false, true, false, true, true],    // 1
    [false, false, true, true, false, true],    // 2
    [false, false, true, true, true, false],    // 3
    [false, true, false, false, true, true],    // 4
    [false, true, true, false, false, true],    // 5
    [false, true, true, true, false, false],    // 6
    [false, true, false, true, false, true],    // 7
    [false, true, false, true, true, false],    // 8
    [false, true, true, false, true, false],    // 9
];

/// Computes the EAN-13 check digit over the 12 payload digits.
pub(crate) fn check_digit(payload: &[u8; 12]) -> u8 {
    let mut sum = 0u32;
    for (i, &d) in payload.iter().enumerate() {
        let weight = if i % 2 == 0 { 1 } else { 3 };
        sum += d as u32 * weight;
    }
    ((10 - (sum % 10)) % 10) as u8
}

// =============================================================================
// Decoder
// =============================================================================

/// EAN-13/UPC-A decoder over full frames.
///
/// Samples `scan_rows` evenly spaced rows; any one successful row decode
/// wins. This tolerates partial occlusion and the label not spanning the
/// whole frame.
#[derive(Debug, Clone)]
pub struct Ean13Decoder {
    scan_rows: usize,
}

impl Ean13Decoder {
    pub fn new(scan_rows: usize) -> Self {
        Ean13Decoder {
            scan_rows: scan_rows.max(1),
        }
    }

    /// Decodes the first EAN-13 symbol found in the frame.
    ///
    /// ## Returns
    /// * `Ok(Code)` - the 12-digit payload (check digit verified, dropped)
    /// * `Err(ScanError::NotFound)` - no row decoded; retry on next frame
    pub fn decode(&self, frame: &Frame) -> Result<Code, ScanError> {
        for i in 0..self.scan_rows {
            let y = frame.height() * (i + 1) / (self.scan_rows + 1);
            if y >= frame.height() {
                continue;
            }

            if let Some(digits) = decode_row(frame.row(y)) {
                let payload: String = digits[..12].iter().map(|d| (b'0' + d) as char).collect();
                // Digits only; cannot fail normalization.
                let code = normalize(&payload).map_err(|_| ScanError::NotFound)?;
                return Ok(code);
            }
        }

        Err(ScanError::NotFound)
    }
}

impl Default for Ean13Decoder {
    fn default() -> Self {
        Ean13Decoder::new(DEFAULT_SCAN_ROWS)
    }
}

// =============================================================================
// Row Decode
// =============================================================================

/// Attempts a full EAN-13 decode of one luma row.
fn decode_row(row: &[u8]) -> Option<[u8; 13]> {
    // Adaptive binarization first; fall back to global when the run count
    // says the adaptive pass shattered or merged the bars.
    let (modules, starts_dark) = {
        let bin = binarize_row_adaptive(row);
        let rl = runs(&bin);
        if rl.len() >= MIN_ROW_RUNS {
            quantize_modules(&bin, &rl)
        } else {
            let bin = binarize_row(row);
            let rl = runs(&bin);
            if rl.len() < MIN_ROW_RUNS {
                return None;
            }
            quantize_modules(&bin, &rl)
        }
    };

    // Run index → bar or space, from the opening state.
    let is_bar = |i: usize| (i % 2 == 0) == starts_dark;

    // Start guard: the first 1,1,1 triplet opening on a bar.
    let start = (0..modules.len().saturating_sub(2))
        .find(|&i| is_bar(i) && modules[i] == 1 && modules[i + 1] == 1 && modules[i + 2] == 1)?;
    let mut idx = start + 3;

    // Left half: six digits, four runs each, matched against A and B.
    let mut digits = [0u8; 13];
    let mut parity = [false; 6];
    for d in 0..6 {
        let pattern = four_runs(&modules, idx)?;
        let (digit_a, dist_a) = best_match(pattern, &LEFT_A);
        let (digit_b, dist_b) = best_match(pattern, &LEFT_B);
        if dist_a <= dist_b {
            digits[1 + d] = digit_a;
            parity[d] = false;
        } else {
            digits[1 + d] = digit_b;
            parity[d] = true;
        }
        idx += 4;
    }

    // Center guard: five alternating single modules opening on a space.
    if idx + 4 >= modules.len()
        || is_bar(idx)
        || modules[idx..idx + 5].iter().any(|&m| m != 1)
    {
        return None;
    }
    idx += 5;

    // Right half: six digits against C.
    for d in 0..6 {
        let pattern = four_runs(&modules, idx)?;
        let (digit_c, _) = best_match(pattern, &RIGHT_C);
        digits[7 + d] = digit_c;
        idx += 4;
    }

    // End guard.
    if idx + 2 >= modules.len()
        || !is_bar(idx)
        || modules[idx..idx + 3].iter().any(|&m| m != 1)
    {
        return None;
    }

    // Implicit first digit from the left-half parity mask.
    digits[0] = FIRST_DIGIT_PARITY.iter().position(|mask| *mask == parity)? as u8;

    // Checksum over the full 13.
    let mut payload = [0u8; 12];
    payload.copy_from_slice(&digits[..12]);
    if check_digit(&payload) != digits[12] {
        return None;
    }

    Some(digits)
}

fn four_runs(modules: &[u8], idx: usize) -> Option<[u8; 4]> {
    if idx + 3 >= modules.len() {
        return None;
    }
    Some([
        modules[idx],
        modules[idx + 1],
        modules[idx + 2],
        modules[idx + 3],
    ])
}

/// Nearest digit by Manhattan distance over the four run widths.
fn best_match(pattern: [u8; 4], table: &[[u8; 4]; 10]) -> (u8, u32) {
    let mut best_digit = 0u8;
    let mut best_dist = u32::MAX;
    for (digit, candidate) in table.iter().enumerate() {
        let dist: u32 = pattern
            .iter()
            .zip(candidate)
            .map(|(&p, &q)| (p as i32 - q as i32).unsigned_abs())
            .sum();
        if dist < best_dist {
            best_dist = dist;
            best_digit = digit as u8;
        }
    }
    (best_digit, best_dist)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{render_label, LabelOptions};

    #[test]
    fn test_check_digit() {
        // Known EAN-13: 4006381333931 (check digit 1)
        let payload = [4, 0, 0, 6, 3, 8, 1, 3, 3, 3, 9, 3];
        assert_eq!(check_digit(&payload), 1);

        // All zeros checks to zero
        assert_eq!(check_digit(&[0; 12]), 0);
    }

    #[test]
    fn test_decodes_rendered_label() {
        let code = normalize("000123456789").unwrap();
        let frame = render_label(&code, &LabelOptions::default()).unwrap();

        let decoder = Ean13Decoder::default();
        let decoded = decoder.decode(&frame).unwrap();
        assert_eq!(decoded, code);
    }

    #[test]
    fn test_decodes_nonzero_leading_digit() {
        let code = normalize("978014300723").unwrap();
        let frame = render_label(&code, &LabelOptions::default()).unwrap();

        let decoded = Ean13Decoder::default().decode(&frame).unwrap();
        assert_eq!(decoded, code);
    }

    #[test]
    fn test_blank_frame_is_not_found() {
        let frame = Frame::filled(320, 120, 255);
        let err = Ean13Decoder::default().decode(&frame).unwrap_err();
        assert_eq!(err, ScanError::NotFound);
    }

    #[test]
    fn test_decode_is_repeatable() {
        let code = normalize("555000111222").unwrap();
        let frame = render_label(&code, &LabelOptions::default()).unwrap();

        let decoder = Ean13Decoder::default();
        let a = decoder.decode(&frame).unwrap();
        let b = decoder.decode(&frame).unwrap();
        assert_eq!(a, b);
    }
}
