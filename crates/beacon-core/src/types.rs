//! # Domain Types
//!
//! Core domain types used throughout Beacon POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │   SaleRecord    │   │   ScanEvent     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  channel        │       │
//! │  │  sku (business) │   │  product_id     │   │  raw payload    │       │
//! │  │  barcode        │   │  quantity       │   │  decode method  │       │
//! │  │  cost_cents     │   │  profit_cents   │   │  code + time    │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐                              │
//! │  │  SourceChannel  │   │  DecodeMethod   │                              │
//! │  │  ─────────────  │   │  ─────────────  │                              │
//! │  │  Camera         │   │  Structured     │                              │
//! │  │  Image          │   │  Fallback       │                              │
//! │  │  Scanner        │   │  Manual         │                              │
//! │  │  Manual         │   └─────────────────┘                              │
//! │  └─────────────────┘                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every product has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business keys: `barcode` and `sku` - human/scanner facing, each unique,
//!   replaceable through the regenerate-code flow

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::code::Code;
use crate::money::Money;

// =============================================================================
// Product
// =============================================================================

/// A product in the inventory.
///
/// Owned by the product store; the scan pipeline only ever holds transient
/// copies for the duration of one resolve/dispatch cycle and never caches
/// them across scans.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Stock Keeping Unit - business identifier, stored normalized.
    pub sku: String,

    /// Numeric inventory barcode, stored normalized.
    pub barcode: String,

    /// Display name shown to the operator and on the code sheet.
    pub name: String,

    /// Category label (feeds the SKU prefix on regeneration).
    pub category: String,

    /// Unit cost basis in cents (for profit calculations).
    pub cost_cents: i64,

    /// Current stock level. Never negative.
    pub current_stock: i64,

    /// Whether product is active (soft delete).
    ///
    /// Products with sale history are never physically deleted, so old
    /// ledger rows keep resolving.
    pub is_active: bool,

    /// When the product was created.
    pub created_at: DateTime<Utc>,

    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the unit cost basis as a Money type.
    #[inline]
    pub fn cost(&self) -> Money {
        Money::from_cents(self.cost_cents)
    }

    /// Checks whether `quantity` units can be taken from stock.
    pub fn can_take(&self, quantity: i64) -> bool {
        quantity > 0 && self.current_stock >= quantity
    }
}

// =============================================================================
// Sale Record
// =============================================================================

/// One row of the append-only sale ledger.
///
/// Unit price and the derived revenue/profit are frozen at sale time; later
/// cost changes on the product never rewrite history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleRecord {
    pub id: String,
    pub product_id: String,
    /// Units sold.
    pub quantity: i64,
    /// Unit selling price in cents at time of sale.
    pub unit_price_cents: i64,
    /// quantity × unit price.
    pub revenue_cents: i64,
    /// quantity × (unit price − unit cost).
    pub profit_cents: i64,
    pub sold_at: DateTime<Utc>,
}

impl SaleRecord {
    /// Returns the recorded revenue as Money.
    #[inline]
    pub fn revenue(&self) -> Money {
        Money::from_cents(self.revenue_cents)
    }

    /// Returns the recorded profit as Money.
    #[inline]
    pub fn profit(&self) -> Money {
        Money::from_cents(self.profit_cents)
    }
}

// =============================================================================
// Scan Event
// =============================================================================

/// Which acquisition channel produced a code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceChannel {
    /// Continuous camera frames.
    Camera,
    /// One-shot decode of an uploaded image.
    Image,
    /// External USB wedge scanner (keyboard emulation).
    Scanner,
    /// Text typed by the operator.
    Manual,
}

/// Which decode tier produced a code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecodeMethod {
    /// Symbology-aware structured decoder.
    Structured,
    /// Geometric fallback decoder (repeatable key, not a payload decode).
    Fallback,
    /// Already-textual input: wedge scanner burst or manual entry.
    Manual,
}

/// Ephemeral record of one acquisition.
///
/// Exists only for the duration of a single resolve/dispatch cycle; it is
/// never persisted. `raw` keeps the pre-normalization payload for operator
/// feedback ("could not read '⏎'").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanEvent {
    pub channel: SourceChannel,
    pub method: DecodeMethod,
    /// Payload as delivered by the channel, before normalization.
    pub raw: String,
    /// The normalized code.
    pub code: Code,
    pub at: DateTime<Utc>,
}

// =============================================================================
// Generated Code Record
// =============================================================================

/// Audit record pairing a product with its derived codes and the
/// generation inputs used to reproduce the derivation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedCodeRecord {
    pub product_id: String,
    pub sku: Code,
    pub barcode: Code,
    /// Category token fed to the SKU derivation.
    pub category_token: String,
    /// Name token fed to the SKU derivation.
    pub name_token: String,
    /// MMDD token fed to the SKU derivation.
    pub date_token: String,
    /// Seed used for the barcode draw; replaying it against the same
    /// existing-code set reproduces the barcode. `None` when the barcode
    /// was supplied by the operator instead of generated.
    pub barcode_seed: Option<u64>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product(stock: i64) -> Product {
        Product {
            id: "p1".to_string(),
            sku: "LAS-LASHKIT-0807".to_string(),
            barcode: "000123456789".to_string(),
            name: "Lash Kit".to_string(),
            category: "Lash".to_string(),
            cost_cents: 15000,
            current_stock: stock,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_can_take() {
        let p = product(10);
        assert!(p.can_take(10));
        assert!(p.can_take(1));
        assert!(!p.can_take(11));
        assert!(!p.can_take(0));
        assert!(!p.can_take(-3));
    }

    #[test]
    fn test_sale_record_money_views() {
        let record = SaleRecord {
            id: "s1".to_string(),
            product_id: "p1".to_string(),
            quantity: 2,
            unit_price_cents: 25000,
            revenue_cents: 50000,
            profit_cents: 20000,
            sold_at: Utc::now(),
        };
        assert_eq!(record.revenue().cents(), 50000);
        assert_eq!(record.profit().cents(), 20000);
    }
}
