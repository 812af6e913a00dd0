//! # Database Pool Management
//!
//! Connection pool creation and configuration for SQLite.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  DbConfig::new(path)  ──or──  DbConfig::in_memory()                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Database::connect(config).await                                        │
//! │  ├── open/create the SQLite file (WAL, foreign keys on)                │
//! │  ├── build the connection pool                                         │
//! │  └── run embedded migrations                                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  db.products() / db.sales()  ← repository handles per call             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  db.close().await on shutdown                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! WAL journal mode lets the dashboard read while a sale commits; NORMAL
//! synchronous keeps the file safe from corruption at the cost of possibly
//! losing the last transaction on power failure — acceptable for a
//! single-register shop.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::product::ProductRepository;
use crate::repository::sale::SaleRepository;

// =============================================================================
// Configuration
// =============================================================================

/// Database configuration.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Path to the SQLite database file (created if missing).
    pub database_path: PathBuf,

    /// Maximum pooled connections. A single-register shop needs few.
    pub max_connections: u32,

    /// Acquire timeout.
    pub connect_timeout: Duration,

    /// Whether to run migrations on connect.
    pub run_migrations: bool,
}

impl DbConfig {
    /// Configuration for an on-disk store at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 4,
            connect_timeout: Duration::from_secs(30),
            run_migrations: true,
        }
    }

    /// In-memory database for isolated tests.
    ///
    /// ## Note
    /// A `:memory:` SQLite database exists per connection, so the pool is
    /// pinned to a single connection — otherwise each connection would see
    /// its own empty schema.
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(":memory:"),
            max_connections: 1,
            connect_timeout: Duration::from_secs(5),
            run_migrations: true,
        }
    }
}

// =============================================================================
// Database Handle
// =============================================================================

/// Main database handle providing repository access.
///
/// Cloning is cheap (the pool is internally reference-counted); the engine
/// layer holds one clone per component rather than a global.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens the database and prepares it for use.
    ///
    /// ## What This Does
    /// 1. Creates the database file if it doesn't exist
    /// 2. Applies SQLite options: WAL journal, NORMAL synchronous,
    ///    foreign keys enforced
    /// 3. Builds the connection pool
    /// 4. Runs embedded migrations (unless disabled)
    pub async fn connect(config: DbConfig) -> DbResult<Self> {
        info!(
            path = %config.database_path.display(),
            "opening product store"
        );

        let url = format!("sqlite://{}?mode=rwc", config.database_path.display());
        let options = SqliteConnectOptions::from_str(&url)
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.connect_timeout)
            .connect_with(options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        debug!(max_connections = config.max_connections, "pool ready");

        let db = Database { pool };

        if config.run_migrations {
            migrations::run_migrations(&db.pool).await?;
        }

        Ok(db)
    }

    /// Returns the product repository.
    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(self.pool.clone())
    }

    /// Returns the sale-ledger repository.
    pub fn sales(&self) -> SaleRepository {
        SaleRepository::new(self.pool.clone())
    }

    /// Returns the raw pool for queries no repository covers.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// True when the database answers a trivial query.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }

    /// Closes the pool. Repository calls fail afterwards.
    pub async fn close(&self) {
        info!("closing product store");
        self.pool.close().await;
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
