//! # Transaction Dispatcher
//!
//! Executes the operator's chosen action against the product store.
//!
//! ## Serialization
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                  Why Every Mutation Takes The Lock                      │
//! │                                                                         │
//! │  Camera match and manual entry can dispatch for the SAME product in    │
//! │  the same instant:                                                      │
//! │                                                                         │
//! │    camera:  read stock 10 ──────────────► write 7   (sold 3)           │
//! │    manual:       read stock 10 ─────────────► write 8   (sold 2)  ❌   │
//! │                                                                         │
//! │  Lost update: 5 units left the shelf, stock shows 8. The write lock    │
//! │  makes read-check-write one critical section:                          │
//! │                                                                         │
//! │    camera:  [lock] 10 → 7 [unlock]                                     │
//! │    manual:              [lock] 7 → 5 [unlock]   ✓                      │
//! │                                                                         │
//! │  The lock is global, not per-product: a one-register shop has no       │
//! │  contention worth sharding for.                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use chrono::Utc;

use beacon_core::code::normalize;
use beacon_core::codegen::{generate_barcode, generate_sku};
use beacon_core::error::CoreError;
use beacon_core::money::Money;
use beacon_core::types::{GeneratedCodeRecord, Product, SaleRecord};
use beacon_core::validation::{
    validate_category, validate_cents, validate_initial_stock, validate_product_name,
    validate_quantity,
};
use beacon_db::{Database, DbError};

use crate::error::EngineResult;

// =============================================================================
// Actions
// =============================================================================

/// One dispatchable operator action.
#[derive(Debug, Clone)]
pub enum Action {
    /// Receive stock.
    StockIn { product_id: String, quantity: i64 },
    /// Remove stock without a sale (damage, shrinkage, returns to vendor).
    StockOut { product_id: String, quantity: i64 },
    /// Sell: stock decrement + ledger append, atomically.
    Sale {
        product_id: String,
        quantity: i64,
        unit_price: Money,
    },
    /// Create a product, deriving codes where not supplied.
    CreateProduct { attrs: NewProduct },
    /// Re-derive a product's SKU and barcode.
    RegenerateCode { product_id: String },
}

/// Attributes for product creation.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub category: String,
    pub cost: Money,
    pub initial_stock: i64,
    /// Barcode to adopt (e.g. the unknown code just scanned). When absent
    /// a fresh 12-digit code is generated.
    pub barcode: Option<String>,
}

/// What a successful dispatch did.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum DispatchSummary {
    StockChanged {
        product_id: String,
        sku: String,
        new_stock: i64,
    },
    SaleRecorded {
        record: SaleRecord,
        new_stock: i64,
    },
    ProductCreated {
        product: Product,
        codes: GeneratedCodeRecord,
    },
    CodeRegenerated {
        product_id: String,
        codes: GeneratedCodeRecord,
    },
}

// =============================================================================
// Dispatcher
// =============================================================================

/// Executes actions against the store, one at a time.
pub struct TransactionDispatcher {
    db: Database,
    write_lock: Mutex<()>,
}

impl TransactionDispatcher {
    pub fn new(db: Database) -> Self {
        TransactionDispatcher {
            db,
            write_lock: Mutex::new(()),
        }
    }

    /// Applies one action.
    ///
    /// Validation happens before the lock; everything that reads or writes
    /// the store happens inside it.
    pub async fn apply(&self, action: Action) -> EngineResult<DispatchSummary> {
        match action {
            Action::StockIn {
                product_id,
                quantity,
            } => {
                validate_quantity(quantity).map_err(CoreError::from)?;
                self.stock_change(&product_id, quantity).await
            }
            Action::StockOut {
                product_id,
                quantity,
            } => {
                validate_quantity(quantity).map_err(CoreError::from)?;
                self.stock_change(&product_id, -quantity).await
            }
            Action::Sale {
                product_id,
                quantity,
                unit_price,
            } => self.sale(&product_id, quantity, unit_price).await,
            Action::CreateProduct { attrs } => self.create_product(attrs).await,
            Action::RegenerateCode { product_id } => self.regenerate_codes(&product_id).await,
        }
    }

    // =========================================================================
    // Stock In / Out
    // =========================================================================

    /// Shared stock mutation: positive delta is stock-in, negative is
    /// stock-out. Quantity sign and range were validated in `apply`.
    async fn stock_change(&self, product_id: &str, delta: i64) -> EngineResult<DispatchSummary> {
        let _guard = self.write_lock.lock().await;

        let product = self.require_active(product_id).await?;
        if delta < 0 && !product.can_take(-delta) {
            return Err(CoreError::InsufficientStock {
                sku: product.sku,
                available: product.current_stock,
                requested: -delta,
            }
            .into());
        }

        let new_stock = self.db.products().update_stock(product_id, delta).await?;

        info!(
            product_id = %product_id,
            sku = %product.sku,
            delta = %delta,
            new_stock = %new_stock,
            "stock updated"
        );

        Ok(DispatchSummary::StockChanged {
            product_id: product_id.to_string(),
            sku: product.sku,
            new_stock,
        })
    }

    // =========================================================================
    // Sale
    // =========================================================================

    async fn sale(
        &self,
        product_id: &str,
        quantity: i64,
        unit_price: Money,
    ) -> EngineResult<DispatchSummary> {
        validate_quantity(quantity).map_err(CoreError::from)?;
        validate_cents("unit price", unit_price.cents()).map_err(CoreError::from)?;

        let _guard = self.write_lock.lock().await;

        let product = self.require_active(product_id).await?;
        if !product.can_take(quantity) {
            return Err(CoreError::InsufficientStock {
                sku: product.sku,
                available: product.current_stock,
                requested: quantity,
            }
            .into());
        }

        // Decrement + ledger append commit together inside the repository
        // transaction.
        let record = self
            .db
            .sales()
            .record_sale(product_id, quantity, unit_price)
            .await?;

        let new_stock = product.current_stock - quantity;
        info!(
            product_id = %product_id,
            quantity = %quantity,
            revenue = %record.revenue(),
            profit = %record.profit(),
            "sale dispatched"
        );

        Ok(DispatchSummary::SaleRecorded { record, new_stock })
    }

    // =========================================================================
    // Create Product
    // =========================================================================

    async fn create_product(&self, attrs: NewProduct) -> EngineResult<DispatchSummary> {
        validate_product_name(&attrs.name).map_err(CoreError::from)?;
        validate_category(&attrs.category).map_err(CoreError::from)?;
        validate_cents("cost", attrs.cost.cents()).map_err(CoreError::from)?;
        validate_initial_stock(attrs.initial_stock).map_err(CoreError::from)?;

        let _guard = self.write_lock.lock().await;

        let products = self.db.products();
        let taken = products.list_codes().await?;

        let now = Utc::now();
        let sku = generate_sku(&attrs.category, &attrs.name, now.date_naive())?;
        if taken.contains(&sku.code) {
            return Err(DbError::duplicate("sku", sku.code.as_str()).into());
        }

        let (barcode, barcode_seed) = match &attrs.barcode {
            Some(raw) => {
                let code = normalize(raw)?;
                if taken.contains(&code) {
                    return Err(DbError::duplicate("barcode", code.as_str()).into());
                }
                (code, None)
            }
            None => {
                let seed = entropy_seed();
                (generate_barcode(&taken, seed)?, Some(seed))
            }
        };

        let product = Product {
            id: Uuid::new_v4().to_string(),
            sku: sku.code.as_str().to_string(),
            barcode: barcode.as_str().to_string(),
            name: attrs.name.trim().to_string(),
            category: attrs.category.trim().to_string(),
            cost_cents: attrs.cost.cents(),
            current_stock: attrs.initial_stock,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        // UNIQUE indices are the backstop for anything the pre-checks
        // could not see.
        products.insert(&product).await?;

        let codes = GeneratedCodeRecord {
            product_id: product.id.clone(),
            sku: sku.code,
            barcode,
            category_token: sku.category_token,
            name_token: sku.name_token,
            date_token: sku.date_token,
            barcode_seed,
        };

        info!(
            product_id = %product.id,
            sku = %codes.sku,
            barcode = %codes.barcode,
            "product created"
        );

        Ok(DispatchSummary::ProductCreated { product, codes })
    }

    // =========================================================================
    // Regenerate Codes
    // =========================================================================

    async fn regenerate_codes(&self, product_id: &str) -> EngineResult<DispatchSummary> {
        let _guard = self.write_lock.lock().await;

        let products = self.db.products();
        let product = self.require_active(product_id).await?;

        // The product's own codes must not block its regeneration: a
        // same-day regenerate legitimately re-derives the same SKU.
        let mut taken = products.list_codes().await?;
        for own in [&product.sku, &product.barcode] {
            if let Ok(code) = normalize(own) {
                taken.remove(&code);
            }
        }

        let sku = generate_sku(&product.category, &product.name, Utc::now().date_naive())?;
        if taken.contains(&sku.code) {
            return Err(DbError::duplicate("sku", sku.code.as_str()).into());
        }

        let seed = entropy_seed();
        let barcode = generate_barcode(&taken, seed)?;

        products
            .update_codes(product_id, &sku.code, &barcode)
            .await?;

        info!(
            product_id = %product_id,
            sku = %sku.code,
            barcode = %barcode,
            "codes regenerated"
        );

        Ok(DispatchSummary::CodeRegenerated {
            product_id: product_id.to_string(),
            codes: GeneratedCodeRecord {
                product_id: product_id.to_string(),
                sku: sku.code,
                barcode,
                category_token: sku.category_token,
                name_token: sku.name_token,
                date_token: sku.date_token,
                barcode_seed: Some(seed),
            },
        })
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// Fetches a product that must exist and be active.
    async fn require_active(&self, product_id: &str) -> EngineResult<Product> {
        let product = self
            .db
            .products()
            .get_by_id(product_id)
            .await?
            .filter(|p| p.is_active)
            .ok_or_else(|| DbError::not_found("Product", product_id))?;
        Ok(product)
    }
}

/// Barcode entropy: wall-clock nanos salted with a UUID word, the same
/// trick receipt numbering uses. The draw itself stays pure in core.
fn entropy_seed() -> u64 {
    let nanos = Utc::now().timestamp_nanos_opt().unwrap_or(0) as u64;
    let (hi, _) = Uuid::new_v4().as_u64_pair();
    nanos ^ hi
}
