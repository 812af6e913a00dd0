//! # Code Sheet and Label Export
//!
//! Printable artifacts for the shop's generated codes.
//!
//! Two outputs:
//! - a text code sheet listing every product's barcode, SKU, name, and
//!   stock (print, cut, stick)
//! - one PGM label raster per product, from the render module
//!
//! PDF layout is the export subsystem's job; this module only produces the
//! content it consumes.

use std::path::{Path, PathBuf};

use tracing::warn;

use beacon_core::code::normalize;
use beacon_core::types::Product;
use beacon_scan::render::{render_label, LabelOptions, RenderError};

use crate::error::EngineResult;

/// Widths for the sheet columns.
const BARCODE_WIDTH: usize = 14;
const SKU_WIDTH: usize = 22;
const NAME_WIDTH: usize = 32;

/// Builds the printable code sheet.
///
/// ## Example Output
/// ```text
/// ==========================================================================
///  AURORA BEAUTY — PRODUCT CODE SHEET
/// ==========================================================================
/// BARCODE        SKU                   PRODUCT                         STOCK
/// 000123456789   LAS-LASHKIT-0807      Lash Kit                           10
/// ...
/// --------------------------------------------------------------------------
/// 15 products listed
/// ```
pub fn code_sheet(store_name: &str, products: &[Product]) -> String {
    let total_width = BARCODE_WIDTH + 1 + SKU_WIDTH + 1 + NAME_WIDTH + 6;
    let mut out = String::new();

    out.push_str(&"=".repeat(total_width));
    out.push('\n');
    out.push_str(&format!(
        " {} — PRODUCT CODE SHEET\n",
        store_name.to_uppercase()
    ));
    out.push_str(&"=".repeat(total_width));
    out.push('\n');

    out.push_str(&format!(
        "{:<bw$} {:<sw$} {:<nw$} {:>5}\n",
        "BARCODE",
        "SKU",
        "PRODUCT",
        "STOCK",
        bw = BARCODE_WIDTH,
        sw = SKU_WIDTH,
        nw = NAME_WIDTH,
    ));

    for product in products {
        out.push_str(&format!(
            "{:<bw$} {:<sw$} {:<nw$} {:>5}\n",
            clip(&product.barcode, BARCODE_WIDTH),
            clip(&product.sku, SKU_WIDTH),
            clip(&product.name, NAME_WIDTH),
            product.current_stock,
            bw = BARCODE_WIDTH,
            sw = SKU_WIDTH,
            nw = NAME_WIDTH,
        ));
    }

    out.push_str(&"-".repeat(total_width));
    out.push('\n');
    out.push_str(&format!("{} products listed\n", products.len()));
    out
}

/// Renders one PGM label per product into `dir`, returning the written
/// paths.
///
/// Products whose barcode is not a printable 12-digit symbol (externally
/// supplied codes of other shapes) are skipped with a warning rather than
/// failing the whole batch — they still appear on the text sheet.
pub fn export_labels(dir: &Path, products: &[Product]) -> EngineResult<Vec<PathBuf>> {
    let options = LabelOptions::default();
    let mut written = Vec::new();

    for product in products {
        let code = match normalize(&product.barcode) {
            Ok(code) => code,
            Err(err) => {
                warn!(product_id = %product.id, error = %err, "stored barcode not normalizable");
                continue;
            }
        };

        let frame = match render_label(&code, &options) {
            Ok(frame) => frame,
            Err(RenderError::UnencodableCode { .. }) => {
                warn!(
                    product_id = %product.id,
                    barcode = %product.barcode,
                    "barcode not printable as a symbol, sheet only"
                );
                continue;
            }
        };

        let path = dir.join(format!("label_{}.pgm", code));
        frame.save_pgm(&path)?;
        written.push(path);
    }

    Ok(written)
}

fn clip(text: &str, width: usize) -> String {
    if text.len() <= width {
        text.to_string()
    } else {
        let mut clipped: String = text.chars().take(width.saturating_sub(1)).collect();
        clipped.push('…');
        clipped
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn product(name: &str, sku: &str, barcode: &str, stock: i64) -> Product {
        let now = Utc::now();
        Product {
            id: uuid::Uuid::new_v4().to_string(),
            sku: sku.to_string(),
            barcode: barcode.to_string(),
            name: name.to_string(),
            category: "Lash".to_string(),
            cost_cents: 1000,
            current_stock: stock,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_sheet_lists_every_product() {
        let products = vec![
            product("Lash Kit", "LAS-LASHKIT-0807", "000123456789", 10),
            product("Gel Polish Red", "NAI-GELPOLIS-0807", "555000111222", 60),
        ];

        let sheet = code_sheet("Aurora Beauty", &products);
        assert!(sheet.contains("AURORA BEAUTY — PRODUCT CODE SHEET"));
        assert!(sheet.contains("000123456789"));
        assert!(sheet.contains("LAS-LASHKIT-0807"));
        assert!(sheet.contains("Gel Polish Red"));
        assert!(sheet.contains("2 products listed"));
    }

    #[test]
    fn test_sheet_clips_long_names() {
        let long_name = "An Extremely Long Product Name That Cannot Possibly Fit";
        let products = vec![product(long_name, "SKU-1", "000123456789", 1)];

        let sheet = code_sheet("Shop", &products);
        assert!(!sheet.contains(long_name));
        assert!(sheet.contains('…'));
    }

    #[test]
    fn test_export_labels_skips_unprintable_barcodes() {
        let dir = std::env::temp_dir().join(format!("beacon-labels-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();

        let products = vec![
            product("Printable", "SKU-1", "000123456789", 1),
            // Externally supplied 8-char code: sheet only, no symbol.
            product("Sheet Only", "SKU-2", "ABC12345", 1),
        ];

        let written = export_labels(&dir, &products).unwrap();
        assert_eq!(written.len(), 1);
        assert!(written[0].ends_with("label_000123456789.pgm"));
        assert!(written[0].exists());

        std::fs::remove_dir_all(&dir).ok();
    }
}
