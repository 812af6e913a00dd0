//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Dual-Index Lookup
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │              How A Scanned Code Finds A Product                         │
//! │                                                                         │
//! │  Code "000123456789"  ──► find_by_barcode ──► UNIQUE(barcode) index    │
//! │  Code "LAS-LASHKIT-0807" ─► find_by_sku ───► UNIQUE(sku) index         │
//! │                                                                         │
//! │  The resolver tries barcode first, then SKU: a wedge scanner reads     │
//! │  printed barcodes, but operators type SKUs, and both must land on      │
//! │  the same product row.                                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashSet;

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, warn};
use uuid::Uuid;

use beacon_core::code::{normalize, Code};
use beacon_core::types::Product;

use crate::error::{DbError, DbResult};

/// Every product column, in schema order. Shared by the queries below so
/// `query_as::<_, Product>` always sees the same shape.
const PRODUCT_COLUMNS: &str =
    "id, sku, barcode, name, category, cost_cents, current_stock, is_active, \
     created_at, updated_at";

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Looks a product up by its barcode.
    ///
    /// Only active products resolve: scanning a soft-deleted product's
    /// label behaves like an unknown code.
    pub async fn find_by_barcode(&self, code: &Code) -> DbResult<Option<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE barcode = ?1 AND is_active = 1"
        );
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(code.as_str())
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Looks a product up by its SKU.
    pub async fn find_by_sku(&self, code: &Code) -> DbResult<Option<Product>> {
        let sql =
            format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE sku = ?1 AND is_active = 1");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(code.as_str())
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Gets a product by its ID, active or not.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Every code currently reserved, across both indices.
    ///
    /// Includes soft-deleted products on purpose: their codes stay tied to
    /// sale history and must never be re-issued to new products.
    pub async fn list_codes(&self) -> DbResult<HashSet<Code>> {
        let rows: Vec<(String, String)> =
            sqlx::query_as("SELECT sku, barcode FROM products")
                .fetch_all(&self.pool)
                .await?;

        let mut codes = HashSet::with_capacity(rows.len() * 2);
        for (sku, barcode) in rows {
            for value in [sku, barcode] {
                match normalize(&value) {
                    Ok(code) => {
                        codes.insert(code);
                    }
                    // Rows predating normalization would trip this; they
                    // cannot collide with normalized codes anyway.
                    Err(err) => warn!(value = %value, error = %err, "unnormalizable stored code"),
                }
            }
        }

        Ok(codes)
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - barcode or SKU already taken
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(sku = %product.sku, barcode = %product.barcode, "inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, sku, barcode, name, category,
                cost_cents, current_stock, is_active,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&product.id)
        .bind(&product.sku)
        .bind(&product.barcode)
        .bind(&product.name)
        .bind(&product.category)
        .bind(product.cost_cents)
        .bind(product.current_stock)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Applies a stock delta (positive = stock in, negative = stock out).
    ///
    /// Runs read-check-update in one transaction so the level can never be
    /// driven negative, whatever the caller believed the stock was.
    ///
    /// ## Returns
    /// * `Ok(new_stock)` on success
    /// * `Err(DbError::NotFound)` - no such product
    /// * `Err(DbError::CheckViolation)` - delta would underflow stock
    pub async fn update_stock(&self, id: &str, delta: i64) -> DbResult<i64> {
        debug!(id = %id, delta = %delta, "updating stock");

        let mut tx = self.pool.begin().await?;

        let stock: Option<i64> =
            sqlx::query_scalar("SELECT current_stock FROM products WHERE id = ?1")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;

        let stock = stock.ok_or_else(|| DbError::not_found("Product", id))?;
        let new_stock = stock + delta;
        if new_stock < 0 {
            return Err(DbError::check(format!(
                "stock for {} would go negative: {} {:+}",
                id, stock, delta
            )));
        }

        sqlx::query(
            "UPDATE products SET current_stock = ?2, updated_at = ?3 WHERE id = ?1",
        )
        .bind(id)
        .bind(new_stock)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(new_stock)
    }

    /// Replaces a product's SKU and barcode (the regenerate-code flow).
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - a new code is already taken
    pub async fn update_codes(&self, id: &str, sku: &Code, barcode: &Code) -> DbResult<()> {
        debug!(id = %id, sku = %sku, barcode = %barcode, "replacing product codes");

        let result = sqlx::query(
            "UPDATE products SET sku = ?2, barcode = ?3, updated_at = ?4 WHERE id = ?1",
        )
        .bind(id)
        .bind(sku.as_str())
        .bind(barcode.as_str())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Soft-deletes a product.
    ///
    /// ## Why Soft Delete?
    /// Sale ledger rows reference the product; physically deleting it would
    /// orphan the shop's sales reports.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "soft-deleting product");

        let result = sqlx::query(
            "UPDATE products SET is_active = 0, updated_at = ?2 WHERE id = ?1",
        )
        .bind(id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Lists active products, name-ordered (feeds the code sheet).
    pub async fn list_active(&self, limit: u32) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE is_active = 1 ORDER BY name LIMIT ?1"
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Counts active products.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }
}

/// Generates a new product ID.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn db() -> Database {
        Database::connect(DbConfig::in_memory()).await.unwrap()
    }

    fn product(sku: &str, barcode: &str, stock: i64) -> Product {
        let now = Utc::now();
        Product {
            id: generate_product_id(),
            sku: sku.to_string(),
            barcode: barcode.to_string(),
            name: "Lash Kit".to_string(),
            category: "Lash".to_string(),
            cost_cents: 15000,
            current_stock: stock,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_insert_and_dual_lookup() {
        let repo = db().await.products();
        let p = product("LAS-LASHKIT-0807", "000123456789", 10);
        repo.insert(&p).await.unwrap();

        let by_barcode = repo
            .find_by_barcode(&normalize("000123456789").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_barcode.id, p.id);

        let by_sku = repo
            .find_by_sku(&normalize("LAS-LASHKIT-0807").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_sku.id, p.id);
    }

    #[tokio::test]
    async fn test_duplicate_codes_rejected() {
        let repo = db().await.products();
        repo.insert(&product("SKU-A", "111111111111", 0))
            .await
            .unwrap();

        // Same barcode, different SKU
        let err = repo
            .insert(&product("SKU-B", "111111111111", 0))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));

        // Same SKU, different barcode
        let err = repo
            .insert(&product("SKU-A", "222222222222", 0))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_update_stock_guards_underflow() {
        let database = db().await;
        let repo = database.products();
        let p = product("SKU-A", "111111111111", 10);
        repo.insert(&p).await.unwrap();

        assert_eq!(repo.update_stock(&p.id, -3).await.unwrap(), 7);
        assert_eq!(repo.update_stock(&p.id, 5).await.unwrap(), 12);

        let err = repo.update_stock(&p.id, -20).await.unwrap_err();
        assert!(matches!(err, DbError::CheckViolation { .. }));

        // Stock untouched by the failed mutation.
        let fresh = repo.get_by_id(&p.id).await.unwrap().unwrap();
        assert_eq!(fresh.current_stock, 12);
    }

    #[tokio::test]
    async fn test_update_stock_missing_product() {
        let repo = db().await.products();
        let err = repo.update_stock("no-such-id", 1).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_soft_delete_hides_but_reserves_codes() {
        let repo = db().await.products();
        let p = product("SKU-A", "111111111111", 0);
        repo.insert(&p).await.unwrap();
        repo.soft_delete(&p.id).await.unwrap();

        // Lookup behaves like an unknown code...
        let found = repo
            .find_by_barcode(&normalize("111111111111").unwrap())
            .await
            .unwrap();
        assert!(found.is_none());

        // ...but the codes stay reserved against regeneration.
        let codes = repo.list_codes().await.unwrap();
        assert!(codes.contains(&normalize("111111111111").unwrap()));
        assert!(codes.contains(&normalize("SKU-A").unwrap()));
    }

    #[tokio::test]
    async fn test_update_codes() {
        let repo = db().await.products();
        let p = product("SKU-A", "111111111111", 0);
        repo.insert(&p).await.unwrap();

        repo.update_codes(
            &p.id,
            &normalize("SKU-A2").unwrap(),
            &normalize("333333333333").unwrap(),
        )
        .await
        .unwrap();

        let fresh = repo.get_by_id(&p.id).await.unwrap().unwrap();
        assert_eq!(fresh.sku, "SKU-A2");
        assert_eq!(fresh.barcode, "333333333333");
    }
}
