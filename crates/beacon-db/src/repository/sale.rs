//! # Sale Repository
//!
//! The atomic sale transaction and ledger queries.
//!
//! ## Sale Atomicity
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    record_sale, One Transaction                         │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │  ├── SELECT cost_cents, current_stock      (missing? → rollback)       │
//! │  ├── stock < quantity?                     (yes? → rollback)           │
//! │  ├── UPDATE products SET current_stock -= quantity                     │
//! │  └── INSERT INTO sales (…, revenue, profit, …)                         │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Either the stock decrement AND the ledger row land together, or       │
//! │  neither does. A decrement without a sale row (or the reverse) can     │
//! │  never be observed, even across a crash mid-transaction.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use beacon_core::money::Money;
use beacon_core::types::SaleRecord;

use crate::error::{DbError, DbResult};

/// Every sale column, in schema order.
const SALE_COLUMNS: &str =
    "id, product_id, quantity, unit_price_cents, revenue_cents, profit_cents, sold_at";

/// Repository for the sale ledger.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Records a sale: decrements stock and appends the ledger row in one
    /// transaction.
    ///
    /// Revenue and profit are frozen here from the product's current cost
    /// basis — later cost edits never rewrite history.
    ///
    /// ## Returns
    /// * `Ok(SaleRecord)` - the appended ledger row
    /// * `Err(DbError::NotFound)` - no such product
    /// * `Err(DbError::CheckViolation)` - insufficient stock; nothing
    ///   was mutated
    pub async fn record_sale(
        &self,
        product_id: &str,
        quantity: i64,
        unit_price: Money,
    ) -> DbResult<SaleRecord> {
        debug!(product_id = %product_id, quantity = %quantity, "recording sale");

        let mut tx = self.pool.begin().await?;

        let row: Option<(i64, i64)> =
            sqlx::query_as("SELECT cost_cents, current_stock FROM products WHERE id = ?1")
                .bind(product_id)
                .fetch_optional(&mut *tx)
                .await?;

        let (cost_cents, stock) =
            row.ok_or_else(|| DbError::not_found("Product", product_id))?;

        if stock < quantity {
            // Dropping the transaction rolls it back; stock and ledger
            // stay exactly as they were.
            return Err(DbError::check(format!(
                "insufficient stock for sale: available {}, requested {}",
                stock, quantity
            )));
        }

        let unit_cost = Money::from_cents(cost_cents);
        let record = SaleRecord {
            id: Uuid::new_v4().to_string(),
            product_id: product_id.to_string(),
            quantity,
            unit_price_cents: unit_price.cents(),
            revenue_cents: unit_price.revenue(quantity).cents(),
            profit_cents: unit_price.profit(unit_cost, quantity).cents(),
            sold_at: Utc::now(),
        };

        sqlx::query(
            "UPDATE products SET current_stock = current_stock - ?2, updated_at = ?3 \
             WHERE id = ?1",
        )
        .bind(product_id)
        .bind(quantity)
        .bind(record.sold_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, product_id, quantity, unit_price_cents,
                revenue_cents, profit_cents, sold_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&record.id)
        .bind(&record.product_id)
        .bind(record.quantity)
        .bind(record.unit_price_cents)
        .bind(record.revenue_cents)
        .bind(record.profit_cents)
        .bind(record.sold_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(sale_id = %record.id, revenue = %record.revenue_cents, "sale recorded");
        Ok(record)
    }

    /// All ledger rows for one product, oldest first.
    pub async fn list_for_product(&self, product_id: &str) -> DbResult<Vec<SaleRecord>> {
        let sql = format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE product_id = ?1 ORDER BY sold_at"
        );
        let records = sqlx::query_as::<_, SaleRecord>(&sql)
            .bind(product_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(records)
    }

    /// The most recent ledger rows, newest first (dashboard feed).
    pub async fn list_recent(&self, limit: u32) -> DbResult<Vec<SaleRecord>> {
        let sql = format!("SELECT {SALE_COLUMNS} FROM sales ORDER BY sold_at DESC LIMIT ?1");
        let records = sqlx::query_as::<_, SaleRecord>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(records)
    }

    /// Total profit across the ledger.
    pub async fn total_profit_cents(&self) -> DbResult<i64> {
        let total: Option<i64> =
            sqlx::query_scalar("SELECT SUM(profit_cents) FROM sales")
                .fetch_one(&self.pool)
                .await?;

        Ok(total.unwrap_or(0))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::product::generate_product_id;
    use beacon_core::types::Product;

    async fn db_with_product(stock: i64) -> (Database, String) {
        let db = Database::connect(DbConfig::in_memory()).await.unwrap();
        let now = Utc::now();
        let product = Product {
            id: generate_product_id(),
            sku: "LAS-LASHKIT-0807".to_string(),
            barcode: "000123456789".to_string(),
            name: "Lash Kit".to_string(),
            category: "Lash".to_string(),
            cost_cents: 15000,
            current_stock: stock,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.products().insert(&product).await.unwrap();
        (db, product.id)
    }

    #[tokio::test]
    async fn test_sale_decrements_stock_and_appends_ledger() {
        let (db, product_id) = db_with_product(10).await;

        let record = db
            .sales()
            .record_sale(&product_id, 2, Money::from_cents(25000))
            .await
            .unwrap();

        // Profit: 2 × (250.00 − 150.00) = 200.00
        assert_eq!(record.revenue_cents, 50000);
        assert_eq!(record.profit_cents, 20000);

        let product = db.products().get_by_id(&product_id).await.unwrap().unwrap();
        assert_eq!(product.current_stock, 8);

        let ledger = db.sales().list_for_product(&product_id).await.unwrap();
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger[0].id, record.id);
    }

    #[tokio::test]
    async fn test_failed_sale_mutates_nothing() {
        let (db, product_id) = db_with_product(1).await;

        let err = db
            .sales()
            .record_sale(&product_id, 5, Money::from_cents(25000))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::CheckViolation { .. }));

        // Stock untouched, ledger empty: the transaction rolled back whole.
        let product = db.products().get_by_id(&product_id).await.unwrap().unwrap();
        assert_eq!(product.current_stock, 1);
        assert!(db
            .sales()
            .list_for_product(&product_id)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_sale_against_missing_product() {
        let (db, _) = db_with_product(1).await;
        let err = db
            .sales()
            .record_sale("no-such-id", 1, Money::from_cents(100))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_total_profit_accumulates() {
        let (db, product_id) = db_with_product(10).await;
        let sales = db.sales();

        sales
            .record_sale(&product_id, 1, Money::from_cents(20000))
            .await
            .unwrap();
        sales
            .record_sale(&product_id, 2, Money::from_cents(18000))
            .await
            .unwrap();

        // 1×(200−150) + 2×(180−150) = 50.00 + 60.00
        assert_eq!(sales.total_profit_cents().await.unwrap(), 11000);
    }
}
