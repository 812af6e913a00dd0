//! # Fallback Decoder Module
//!
//! Geometric decoding without any symbology knowledge — the tier that keeps
//! scanning alive when the structured decoder is unavailable.
//!
//! ## Algorithm
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Fallback Decode Pipeline                             │
//! │                                                                         │
//! │  luma frame                                                             │
//! │   │ 1. sample rows, adaptive binarization                               │
//! │   ▼                                                                     │
//! │  bar-like rows (run count window, width variation, ratio cap)           │
//! │   │ 2. group consecutive bar-like rows                                  │
//! │   ▼                                                                     │
//! │  candidate bands ── proportion filter ──► none? NoCandidateRegion       │
//! │   │ 3. widest-area band wins                                            │
//! │   ▼                                                                     │
//! │  three scan lines (¼, ½, ¾ of band height)                              │
//! │   │ 4. run lengths → module signature per line                          │
//! │   ▼                                                                     │
//! │  majority vote ── no majority? AmbiguousPattern                         │
//! │   │ 5. FNV-1a over the winning signature                                │
//! │   ▼                                                                     │
//! │  12-digit derived code                                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Documented Degradation
//! The derived code is NOT the symbol's encoded payload — recovering that
//! without symbology tables is exactly what this tier cannot do. The
//! guarantee is **repeatability**: the same label under the same imaging
//! conditions hashes to the same 12-digit key on every call, so the key
//! works for inventory lookup. Labels enrolled under the fallback must be
//! looked up under the fallback; that trade-off is accepted for the
//! degraded mode.

use tracing::debug;

use beacon_core::code::{normalize, Code};

use crate::binarize::{binarize_row_adaptive, runs};
use crate::error::ScanError;
use crate::frame::Frame;

/// Module signature length fed to the hash (leading runs carry the shape;
/// tails differ with distance and tilt).
const SIGNATURE_RUNS: usize = 20;

/// The 12-digit space the derived key is folded into.
const KEY_SPACE: u64 = 1_000_000_000_000;

// =============================================================================
// Options
// =============================================================================

/// Tuning knobs for band detection.
///
/// Defaults follow plausible 1-D barcode proportions: wide rectangular
/// regions with moderate run counts and bounded width variation.
#[derive(Debug, Clone)]
pub struct FallbackOptions {
    /// Sample every Nth row during band detection.
    pub row_step: usize,
    /// Minimum interior (bar-to-bar) run count for a bar-like row.
    pub min_runs: usize,
    /// Maximum interior run count for a bar-like row.
    pub max_runs: usize,
    /// Minimum distinct run widths (flat stripes are not barcodes).
    pub min_distinct_widths: usize,
    /// Maximum widest/narrowest run ratio.
    pub max_width_ratio: usize,
    /// Minimum band height in rows.
    pub min_band_height: usize,
    /// Minimum bar-region width in pixels.
    pub min_span: usize,
}

impl Default for FallbackOptions {
    fn default() -> Self {
        FallbackOptions {
            row_step: 2,
            min_runs: 16,
            max_runs: 100,
            min_distinct_widths: 3,
            max_width_ratio: 10,
            min_band_height: 8,
            min_span: 80,
        }
    }
}

// =============================================================================
// Decoder
// =============================================================================

/// The geometric fallback decoder.
#[derive(Debug, Clone, Default)]
pub struct FallbackDecoder {
    options: FallbackOptions,
}

impl FallbackDecoder {
    pub fn new(options: FallbackOptions) -> Self {
        FallbackDecoder { options }
    }

    /// Derives a repeatable 12-digit code from the strongest bar-like
    /// region of the frame.
    ///
    /// ## Returns
    /// * `Ok(Code)` - derived lookup key
    /// * `Err(ScanError::NoCandidateRegion)` - nothing in the frame passes
    ///   the proportion filter
    /// * `Err(ScanError::AmbiguousPattern)` - scan lines across the best
    ///   region disagree with no majority
    ///
    /// Never panics on malformed imagery; every outcome is typed.
    pub fn decode(&self, frame: &Frame) -> Result<Code, ScanError> {
        let band = self
            .find_best_band(frame)
            .ok_or(ScanError::NoCandidateRegion)?;

        debug!(
            top = band.top,
            bottom = band.bottom,
            span = band.span(),
            "fallback: candidate band selected"
        );

        let signature = self.vote_signature(frame, &band)?;
        let key = fnv1a_64(&signature) % KEY_SPACE;
        let text = format!("{:012}", key);

        // Digits only; normalization cannot fail.
        normalize(&text).map_err(|_| ScanError::NoCandidateRegion)
    }

    // =========================================================================
    // Band Detection
    // =========================================================================

    /// Finds the largest region of consecutive bar-like rows that passes
    /// the proportion filter.
    fn find_best_band(&self, frame: &Frame) -> Option<Band> {
        let step = self.options.row_step.max(1);
        let mut bands: Vec<Band> = Vec::new();
        let mut current: Option<Band> = None;

        let mut y = 0;
        while y < frame.height() {
            match self.analyze_row(frame.row(y)) {
                Some((x0, x1)) => {
                    current = Some(match current.take() {
                        Some(mut band) if y - band.bottom <= step => {
                            band.bottom = y;
                            band.x0 = band.x0.min(x0);
                            band.x1 = band.x1.max(x1);
                            band
                        }
                        other => {
                            if let Some(done) = other {
                                bands.push(done);
                            }
                            Band {
                                top: y,
                                bottom: y,
                                x0,
                                x1,
                            }
                        }
                    });
                }
                None => {
                    if let Some(done) = current.take() {
                        bands.push(done);
                    }
                }
            }
            y += step;
        }
        if let Some(done) = current.take() {
            bands.push(done);
        }

        bands
            .into_iter()
            .filter(|b| self.band_passes_proportions(b, frame))
            .max_by_key(|b| b.area())
    }

    /// Classifies one row: bar-like rows return the pixel span of their
    /// bar region.
    fn analyze_row(&self, row: &[u8]) -> Option<(usize, usize)> {
        let bin = binarize_row_adaptive(row);
        let run_lengths = runs(&bin);
        if run_lengths.is_empty() {
            return None;
        }

        let starts_dark = bin[0];
        let is_dark = |i: usize| (i % 2 == 0) == starts_dark;

        let first_dark = (0..run_lengths.len()).find(|&i| is_dark(i))?;
        let last_dark = (0..run_lengths.len()).rev().find(|&i| is_dark(i))?;
        let interior = &run_lengths[first_dark..=last_dark];

        if interior.len() < self.options.min_runs || interior.len() > self.options.max_runs {
            return None;
        }

        // Width variation: a handful of distinct widths, none absurdly
        // wider than the narrowest. Uniform stripes (awnings, shelf edges)
        // fail the distinct-widths floor; long equal stretches inside an
        // otherwise varied pattern are fine — real symbologies have them
        // in their guard runs.
        let mut distinct = interior.to_vec();
        distinct.sort_unstable();
        distinct.dedup();
        if distinct.len() < self.options.min_distinct_widths {
            return None;
        }

        let narrowest = *distinct.first().unwrap_or(&1);
        let widest = *distinct.last().unwrap_or(&1);
        if widest / narrowest.max(1) > self.options.max_width_ratio {
            return None;
        }

        let x0: usize = run_lengths[..first_dark].iter().sum();
        let span: usize = interior.iter().sum();
        if span < self.options.min_span {
            return None;
        }

        Some((x0, x0 + span))
    }

    /// Wide rectangular blob check against the frame dimensions.
    ///
    /// Bars must be a wide, shallow region: at least twice as wide as
    /// tall, under 90% of the frame width (a fully saturated frame is
    /// glare or a solid object), under 30% of the frame height.
    fn band_passes_proportions(&self, band: &Band, frame: &Frame) -> bool {
        let height = band.height(self.options.row_step);
        let span = band.span();

        height >= self.options.min_band_height
            && span >= 2 * height
            && span * 10 <= frame.width() * 9
            && height * 10 <= frame.height() * 3
    }

    // =========================================================================
    // Signature Voting
    // =========================================================================

    /// Reads three scan lines across the band and majority-votes their
    /// module signatures.
    fn vote_signature(&self, frame: &Frame, band: &Band) -> Result<Vec<u8>, ScanError> {
        let height = band.bottom - band.top + 1;
        let lines = [
            band.top + height / 4,
            band.top + height / 2,
            band.top + (height * 3) / 4,
        ];

        let mut readings: Vec<Vec<u8>> = Vec::with_capacity(3);
        for &y in &lines {
            if y >= frame.height() {
                continue;
            }
            if let Some(signature) = self.read_signature(frame.row(y)) {
                readings.push(signature);
            }
        }

        match readings.len() {
            0 => Err(ScanError::NoCandidateRegion),
            1 => Ok(readings.remove(0)),
            _ => {
                // Majority wins; mutually inconsistent readings with no
                // majority make the key unstable, so refuse them.
                for i in 0..readings.len() {
                    let votes = readings.iter().filter(|r| **r == readings[i]).count();
                    if votes >= 2 {
                        return Ok(readings.swap_remove(i));
                    }
                }
                Err(ScanError::AmbiguousPattern)
            }
        }
    }

    /// Quantizes one scan line into a bounded module signature.
    fn read_signature(&self, row: &[u8]) -> Option<Vec<u8>> {
        let bin = binarize_row_adaptive(row);
        let run_lengths = runs(&bin);
        if run_lengths.is_empty() {
            return None;
        }

        let starts_dark = bin[0];
        let is_dark = |i: usize| (i % 2 == 0) == starts_dark;
        let first_dark = (0..run_lengths.len()).find(|&i| is_dark(i))?;
        let last_dark = (0..run_lengths.len()).rev().find(|&i| is_dark(i))?;
        let interior = &run_lengths[first_dark..=last_dark];

        if interior.len() < self.options.min_runs {
            return None;
        }

        let mut sorted = interior.to_vec();
        sorted.sort_unstable();
        let base = sorted[sorted.len() / 4].max(1);

        Some(
            interior
                .iter()
                .take(SIGNATURE_RUNS)
                .map(|&w| (((w + base / 2) / base).min(9)) as u8)
                .collect(),
        )
    }
}

/// A run of consecutive bar-like rows.
#[derive(Debug, Clone)]
struct Band {
    top: usize,
    bottom: usize,
    x0: usize,
    x1: usize,
}

impl Band {
    fn span(&self) -> usize {
        self.x1 - self.x0
    }

    fn height(&self, row_step: usize) -> usize {
        self.bottom - self.top + row_step
    }

    fn area(&self) -> usize {
        self.span() * (self.bottom - self.top + 1)
    }
}

/// FNV-1a 64-bit: stable across platforms and releases, which the standard
/// hasher does not guarantee — repeat scans must keep hashing identically.
fn fnv1a_64(bytes: &[u8]) -> u64 {
    let mut hash = 0xcbf2_9ce4_8422_2325u64;
    for &b in bytes {
        hash ^= b as u64;
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const UNIT: usize = 3;

    /// Three bar patterns with equal total width but different shapes.
    const PATTERN_A: [usize; 20] = [1, 1, 2, 1, 3, 1, 1, 2, 1, 1, 4, 1, 2, 1, 1, 3, 1, 1, 2, 1];
    const PATTERN_B: [usize; 20] = [2, 1, 1, 1, 4, 1, 1, 2, 1, 1, 3, 1, 1, 1, 2, 3, 1, 1, 1, 2];
    const PATTERN_C: [usize; 20] = [3, 1, 1, 2, 1, 1, 2, 1, 4, 1, 1, 1, 3, 1, 1, 2, 1, 1, 1, 2];

    /// Paints `pattern` (dark first, widths × UNIT) into rows [y0, y1).
    fn paint_band(frame: &mut Frame, y0: usize, y1: usize, pattern: &[usize]) {
        let total: usize = pattern.iter().sum::<usize>() * UNIT;
        let x_start = (frame.width() - total) / 2;
        for y in y0..y1 {
            let row = frame.row_mut(y);
            let mut x = x_start;
            let mut dark = true;
            for &w in pattern {
                let span = w * UNIT;
                if dark {
                    row[x..x + span].fill(0);
                }
                x += span;
                dark = !dark;
            }
        }
    }

    fn frame_with_band(pattern: &[usize]) -> Frame {
        let mut frame = Frame::filled(240, 160, 255);
        paint_band(&mut frame, 40, 70, pattern);
        frame
    }

    #[test]
    fn test_blank_frame_has_no_candidate() {
        let frame = Frame::filled(240, 160, 255);
        let err = FallbackDecoder::default().decode(&frame).unwrap_err();
        assert_eq!(err, ScanError::NoCandidateRegion);
    }

    #[test]
    fn test_tiny_frame_has_no_candidate() {
        let frame = Frame::filled(4, 4, 0);
        let err = FallbackDecoder::default().decode(&frame).unwrap_err();
        assert_eq!(err, ScanError::NoCandidateRegion);
    }

    #[test]
    fn test_band_decodes_to_numeric_key() {
        let frame = frame_with_band(&PATTERN_A);
        let code = FallbackDecoder::default().decode(&frame).unwrap();
        assert_eq!(code.len(), 12);
        assert!(code.is_numeric());
    }

    #[test]
    fn test_decode_is_repeatable() {
        let frame = frame_with_band(&PATTERN_A);
        let decoder = FallbackDecoder::default();
        let a = decoder.decode(&frame).unwrap();
        let b = decoder.decode(&frame).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_patterns_derive_different_keys() {
        let decoder = FallbackDecoder::default();
        let a = decoder.decode(&frame_with_band(&PATTERN_A)).unwrap();
        let b = decoder.decode(&frame_with_band(&PATTERN_B)).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_inconsistent_region_is_ambiguous() {
        // One contiguous band whose thirds carry three different patterns:
        // each scan line lands in a different third, so no majority exists.
        let mut frame = Frame::filled(240, 160, 255);
        paint_band(&mut frame, 40, 52, &PATTERN_A);
        paint_band(&mut frame, 52, 64, &PATTERN_B);
        paint_band(&mut frame, 64, 76, &PATTERN_C);

        let err = FallbackDecoder::default().decode(&frame).unwrap_err();
        assert_eq!(err, ScanError::AmbiguousPattern);
    }

    #[test]
    fn test_too_tall_region_is_rejected() {
        // Nearly square blob: fails the wide-rectangle proportion check.
        let mut frame = Frame::filled(240, 160, 255);
        paint_band(&mut frame, 20, 140, &PATTERN_A);

        let err = FallbackDecoder::default().decode(&frame).unwrap_err();
        assert_eq!(err, ScanError::NoCandidateRegion);
    }
}
