//! # Binarization Module
//!
//! Row-wise thresholding and run-length machinery shared by both decode
//! tiers.
//!
//! ## Pipeline Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  luma row ──► binarize (adaptive, global fallback) ──► bar/space runs  │
//! │                                                              │          │
//! │                                        quantize to modules ◄─┘          │
//! │                                                                         │
//! │  "modules" are bar widths expressed in units of the narrowest bar,     │
//! │  the form both the symbology decoder and the fallback hasher consume.  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Two thresholding strategies:
//! - global: single threshold from the row statistics; fast, struggles with
//!   uneven lighting
//! - adaptive: sliding-window mean via prefix sums; handles the lighting
//!   gradients real camera frames have

/// Window divisor for the adaptive threshold: window ≈ width / 32.
const ADAPTIVE_WINDOW_DIVISOR: usize = 32;
const ADAPTIVE_WINDOW_MIN: usize = 8;
const ADAPTIVE_WINDOW_MAX: usize = 64;

/// Bias toward black in the adaptive comparison. Thin bars lose pixels to
/// sensor blur; a small bias keeps them from dropping out entirely.
const ADAPTIVE_BIAS: i32 = 5;

/// Widest bar expressible in modules (EAN uses widths 1..4).
const MAX_MODULE_WIDTH: u8 = 4;

// =============================================================================
// Thresholding
// =============================================================================

/// Global threshold for a row: midpoint of the mean and the min/max middle.
///
/// No allocation, one pass. Adequate for evenly lit labels and synthetic
/// rasters; real camera rows should prefer [`binarize_row_adaptive`].
#[inline]
pub fn global_threshold(row: &[u8]) -> u8 {
    if row.is_empty() {
        return 0;
    }

    let mut min_v = u8::MAX;
    let mut max_v = 0u8;
    let mut sum: u64 = 0;
    for &v in row {
        min_v = min_v.min(v);
        max_v = max_v.max(v);
        sum += v as u64;
    }

    let mean = (sum / row.len() as u64) as u16;
    let mid = (min_v as u16 + max_v as u16) / 2;
    ((mean + mid) / 2) as u8
}

/// Global binarization of a row: `true` = bar (dark), `false` = space.
pub fn binarize_row(row: &[u8]) -> Vec<bool> {
    let threshold = global_threshold(row);
    row.iter().map(|&v| v < threshold).collect()
}

/// Adaptive binarization against a sliding-window mean.
///
/// The window mean is computed from prefix sums, so the whole row costs two
/// passes regardless of window size. Window: `width / 32`, clamped to
/// `[8, 64]`.
pub fn binarize_row_adaptive(row: &[u8]) -> Vec<bool> {
    let n = row.len();
    if n == 0 {
        return Vec::new();
    }

    let window = (n / ADAPTIVE_WINDOW_DIVISOR).clamp(ADAPTIVE_WINDOW_MIN, ADAPTIVE_WINDOW_MAX);

    let mut prefix: Vec<u32> = Vec::with_capacity(n + 1);
    prefix.push(0);
    for &v in row {
        let last = *prefix.last().unwrap();
        prefix.push(last + v as u32);
    }

    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let left = i.saturating_sub(window);
        let right = (i + window).min(n - 1);
        let len = (right - left + 1) as u32;
        let mean = ((prefix[right + 1] - prefix[left]) / len) as i32;
        out.push((row[i] as i32) < mean - ADAPTIVE_BIAS);
    }
    out
}

// =============================================================================
// Run Lengths
// =============================================================================

/// Collapses a binary row into run lengths, starting with whichever state
/// the row opens on.
pub fn runs(row_bin: &[bool]) -> Vec<usize> {
    if row_bin.is_empty() {
        return Vec::new();
    }

    let mut out = Vec::new();
    let mut current = row_bin[0];
    let mut length = 1usize;
    for &b in &row_bin[1..] {
        if b == current {
            length += 1;
        } else {
            out.push(length);
            current = b;
            length = 1;
        }
    }
    out.push(length);
    out
}

/// Quantizes run lengths into module widths.
///
/// The base module is estimated as the lower quartile of the run lengths —
/// robust against the heavy tail the quiet zones contribute. Returns the
/// module sequence and whether the first run is a bar.
pub fn quantize_modules(row_bin: &[bool], run_lengths: &[usize]) -> (Vec<u8>, bool) {
    if run_lengths.is_empty() {
        return (Vec::new(), false);
    }

    let mut sorted = run_lengths.to_vec();
    sorted.sort_unstable();
    let base = sorted[sorted.len() / 4].max(1);

    let modules = run_lengths
        .iter()
        .map(|&w| (((w + base / 2) / base).clamp(1, MAX_MODULE_WIDTH as usize)) as u8)
        .collect();

    (modules, row_bin[0])
}

// =============================================================================
// Unit Tests
// =============================================================================
