//! # Render Module
//!
//! Rasterizes inventory barcodes into printable label frames.
//!
//! ## Label Anatomy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   ████ █  █ ███ █ ██ ████ █ ██ █ ███ █ ██ ████ █  ██ █ █ ██ ████       │
//! │   ████ █  █ ███ █ ██ ████ █ ██ █ ███ █ ██ ████ █  ██ █ █ ██ ████       │
//! │   ████ █  █ ███ █ ██ ████ █ ██ █ ███ █ ██ ████ █  ██ █ █ ██ ████       │
//! │                                                                         │
//! │              0 0 0 1 2 3 4 5 6 7 8 9   ← digit strip                    │
//! │                                                                         │
//! │  quiet zone │ start │ 6 left digits │ center │ 6 right │ end │ quiet   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The symbol is EAN-13: the 12-digit inventory code is the payload and the
//! 13th (check) digit is computed here, so any retail scanner — and our own
//! structured decoder — reads the label back to exactly the stored barcode.
//! Output is a plain luma [`Frame`]; `Frame::save_pgm` writes it to disk
//! and every print pipeline accepts PGM.

use thiserror::Error;

use beacon_core::code::Code;
use beacon_core::BARCODE_LENGTH;

use crate::frame::Frame;
use crate::symbology::{check_digit, FIRST_DIGIT_PARITY, LEFT_A, LEFT_B, RIGHT_C};

/// White modules on each side of the symbol.
const QUIET_MODULES: u8 = 9;

// =============================================================================
// Options
// =============================================================================

/// Label rendering options.
#[derive(Debug, Clone)]
pub struct LabelOptions {
    /// Pixels per module (narrowest bar width).
    pub module_width: usize,
    /// Bar height in pixels.
    pub bar_height: usize,
    /// Render the payload digits under the bars.
    pub show_digits: bool,
}

impl Default for LabelOptions {
    fn default() -> Self {
        LabelOptions {
            module_width: 3,
            bar_height: 72,
            show_digits: true,
        }
    }
}

// =============================================================================
// Errors
// =============================================================================

/// Label rendering failures.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Only 12-digit numeric inventory barcodes are printable.
    #[error("code {code:?} is not a 12-digit numeric barcode")]
    UnencodableCode { code: String },
}

// =============================================================================
// Encoding
// =============================================================================

/// Expands a 12-digit payload into `(width, dark)` module runs, quiet zones
/// included.
pub(crate) fn encode_modules(payload: &[u8; 12]) -> Vec<(u8, bool)> {
    let first = payload[0] as usize;
    let parity = FIRST_DIGIT_PARITY[first];

    let mut out: Vec<(u8, bool)> = Vec::with_capacity(63);
    let mut dark = false;

    let mut push = |widths: &[u8], dark: &mut bool, out: &mut Vec<(u8, bool)>| {
        for &w in widths {
            out.push((w, *dark));
            *dark = !*dark;
        }
    };

    // Leading quiet zone (white), then strict alternation throughout.
    push(&[QUIET_MODULES], &mut dark, &mut out);

    // Start guard.
    push(&[1, 1, 1], &mut dark, &mut out);

    // Left half: digits 2..7 of the symbol, A/B chosen by the parity mask
    // that encodes payload[0].
    for (i, &d) in payload[1..7].iter().enumerate() {
        let table = if parity[i] { &LEFT_B } else { &LEFT_A };
        push(&table[d as usize], &mut dark, &mut out);
    }

    // Center guard.
    push(&[1, 1, 1, 1, 1], &mut dark, &mut out);

    // Right half: payload digits 8..12 plus the computed check digit.
    let check = check_digit(payload);
    for &d in payload[7..12].iter().chain(std::iter::once(&check)) {
        push(&RIGHT_C[d as usize], &mut dark, &mut out);
    }

    // End guard and trailing quiet zone.
    push(&[1, 1, 1], &mut dark, &mut out);
    push(&[QUIET_MODULES], &mut dark, &mut out);

    out
}

// =============================================================================
// Rasterization
// =============================================================================

/// Renders an inventory barcode into a printable label frame.
///
/// ## Errors
/// `RenderError::UnencodableCode` unless the code is exactly 12 decimal
/// digits (SKUs are not printable symbols; the code sheet lists them as
/// text instead).
///
/// ## Example
/// ```rust
/// use beacon_core::code::normalize;
/// use beacon_scan::render::{render_label, LabelOptions};
///
/// let code = normalize("000123456789").unwrap();
/// let frame = render_label(&code, &LabelOptions::default()).unwrap();
/// assert!(frame.width() > 0);
/// ```
pub fn render_label(code: &Code, options: &LabelOptions) -> Result<Frame, RenderError> {
    let payload = payload_digits(code)?;
    let modules = encode_modules(&payload);

    let module_width = options.module_width.max(1);
    let total_modules: usize = modules.iter().map(|&(w, _)| w as usize).sum();
    let width = total_modules * module_width;

    let strip_height = if options.show_digits {
        // 5-row glyphs plus one blank row above and below, in module units.
        7 * module_width
    } else {
        0
    };
    let height = options.bar_height + strip_height;

    let mut frame = Frame::filled(width, height, 255);

    // Bars.
    let mut x = 0usize;
    for &(w, dark) in &modules {
        let span = w as usize * module_width;
        if dark {
            for y in 0..options.bar_height {
                frame.row_mut(y)[x..x + span].fill(0);
            }
        }
        x += span;
    }

    // Digit strip: the 12 payload digits, centered.
    if options.show_digits {
        let glyph_w = 4 * module_width; // 3 columns + 1 spacing
        let text_width = payload.len() * glyph_w;
        let mut gx = width.saturating_sub(text_width) / 2;
        let gy = options.bar_height + module_width;
        for &d in &payload {
            draw_digit(&mut frame, gx, gy, d, module_width);
            gx += glyph_w;
        }
    }

    Ok(frame)
}

/// Extracts the 12 payload digits, rejecting anything else.
fn payload_digits(code: &Code) -> Result<[u8; 12], RenderError> {
    let s = code.as_str();
    if s.len() != BARCODE_LENGTH || !code.is_numeric() {
        return Err(RenderError::UnencodableCode {
            code: s.to_string(),
        });
    }

    let mut payload = [0u8; 12];
    for (i, b) in s.bytes().enumerate() {
        payload[i] = b - b'0';
    }
    Ok(payload)
}

/// 3×5 digit glyphs, one 3-bit row mask per row.
const DIGIT_GLYPHS: [[u8; 5]; 10] = [
    [0b111, 0b101, 0b101, 0b101, 0b111], // 0
    [0b010, 0b110, 0b010, 0b010, 0b111], // 1
    [0b111, 0b001, 0b111, 0b100, 0b111], // 2
    [0b111, 0b001, 0b111, 0b001, 0b111], // 3
    [0b101, 0b101, 0b111, 0b001, 0b001], // 4
    [0b111, 0b100, 0b111, 0b001, 0b111], // 5
    [0b111, 0b100, 0b111, 0b101, 0b111], // 6
    [0b111, 0b001, 0b001, 0b010, 0b010], // 7
    [0b111, 0b101, 0b111, 0b101, 0b111], // 8
    [0b111, 0b101, 0b111, 0b001, 0b111], // 9
];

fn draw_digit(frame: &mut Frame, x: usize, y: usize, digit: u8, scale: usize) {
    let glyph = &DIGIT_GLYPHS[digit as usize];
    for (row_idx, &mask) in glyph.iter().enumerate() {
        for col in 0..3 {
            if mask & (0b100 >> col) == 0 {
                continue;
            }
            for dy in 0..scale {
                let py = y + row_idx * scale + dy;
                if py >= frame.height() {
                    continue;
                }
                let px = x + col * scale;
                let end = (px + scale).min(frame.width());
                if px < end {
                    frame.row_mut(py)[px..end].fill(0);
                }
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
