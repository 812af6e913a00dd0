//! # Scan Resolver
//!
//! Maps a normalized code to exactly one resolution outcome.
//!
//! ## Resolution Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      One Code, One Outcome                              │
//! │                                                                         │
//! │  raw text ──► normalize ──── rejected ──► Malformed (NO store query)   │
//! │                  │                                                      │
//! │                  ▼                                                      │
//! │             barcode index ── hit ──► Found(product) + eligible actions │
//! │                  │                                                      │
//! │                miss                                                     │
//! │                  ▼                                                      │
//! │             SKU index ────── hit ──► Found(product)                    │
//! │                  │                                                      │
//! │                miss                                                     │
//! │                  ▼                                                      │
//! │             Unknown(code) ──► surface offers "create this product"     │
//! │                                                                         │
//! │  Total: every input lands in exactly one arm; nothing falls through.  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use tracing::debug;

use beacon_core::code::{normalize, Code};
use beacon_core::error::CoreError;
use beacon_core::types::Product;
use beacon_db::Database;

use crate::error::EngineResult;

// =============================================================================
// Outcome Types
// =============================================================================

/// The three resolution outcomes.
#[derive(Debug, Clone)]
pub enum ScanOutcome {
    /// The code matched a product on either index.
    Found(Product),
    /// Well-formed code with no matching product; the surface offers to
    /// create one with this code as its barcode.
    Unknown(Code),
    /// Normalization rejected the input before any store query.
    Malformed { raw: String, reason: String },
}

/// Actions the surface may offer for a found product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductAction {
    StockIn,
    StockOut,
    Sale,
    RegenerateCode,
}

/// The actions eligible for a product right now.
///
/// Stock-out and sale need stock on hand; offering them on an empty
/// product would only manufacture `InsufficientStock` failures.
pub fn eligible_actions(product: &Product) -> Vec<ProductAction> {
    let mut actions = vec![ProductAction::StockIn];
    if product.current_stock > 0 {
        actions.push(ProductAction::StockOut);
        actions.push(ProductAction::Sale);
    }
    actions.push(ProductAction::RegenerateCode);
    actions
}

// =============================================================================
// Resolver
// =============================================================================

/// Resolves codes against the product store.
///
/// Holds a store handle, never product state: each cycle queries fresh so
/// a stock change on another channel is visible to the next scan.
#[derive(Debug, Clone)]
pub struct ScanResolver {
    db: Database,
}

impl ScanResolver {
    pub fn new(db: Database) -> Self {
        ScanResolver { db }
    }

    /// Resolves raw channel text. Malformed input short-circuits before
    /// any store query.
    pub async fn resolve_raw(&self, raw: &str) -> EngineResult<ScanOutcome> {
        match normalize(raw) {
            Ok(code) => self.resolve(&code).await,
            Err(CoreError::MalformedCode { reason }) => Ok(ScanOutcome::Malformed {
                raw: raw.to_string(),
                reason,
            }),
            Err(other) => Err(other.into()),
        }
    }

    /// Resolves an already-normalized code: barcode index first, then SKU.
    pub async fn resolve(&self, code: &Code) -> EngineResult<ScanOutcome> {
        let products = self.db.products();

        if let Some(product) = products.find_by_barcode(code).await? {
            debug!(code = %code, product_id = %product.id, "resolved via barcode index");
            return Ok(ScanOutcome::Found(product));
        }

        if let Some(product) = products.find_by_sku(code).await? {
            debug!(code = %code, product_id = %product.id, "resolved via SKU index");
            return Ok(ScanOutcome::Found(product));
        }

        debug!(code = %code, "code unknown to the store");
        Ok(ScanOutcome::Unknown(code.clone()))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
