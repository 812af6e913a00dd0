//! # Seed Data Generator
//!
//! Populates the database with sample shop stock for development.
//!
//! ## Usage
//! ```bash
//! # Seed the default database file
//! cargo run -p beacon-db --bin seed
//!
//! # Specify database path
//! cargo run -p beacon-db --bin seed -- --db ./data/beacon.db
//! ```
//!
//! Each product gets a derived SKU (`CAT-NAMESLUG-MMDD`), a generated
//! 12-digit barcode unique across the catalog, a cost basis, and an
//! initial stock level.

use std::collections::HashSet;
use std::env;

use chrono::Utc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use beacon_core::codegen::{generate_barcode, generate_sku};
use beacon_core::types::Product;
use beacon_db::{Database, DbConfig};

/// Sample catalog: (category, name, cost_cents, initial_stock).
const CATALOG: &[(&str, &str, i64, i64)] = &[
    ("Lash", "Lash Kit", 15000, 10),
    ("Lash", "Volume Lash Tray", 9000, 24),
    ("Lash", "Lash Adhesive", 4500, 40),
    ("Lash", "Lash Primer", 3800, 18),
    ("Nails", "Gel Polish Red", 2500, 60),
    ("Nails", "Gel Polish Nude", 2500, 55),
    ("Nails", "Cuticle Oil", 1800, 35),
    ("Nails", "Nail File Pack", 900, 80),
    ("Skin", "Rose Water Toner", 3200, 25),
    ("Skin", "Vitamin C Serum", 7800, 15),
    ("Skin", "Clay Mask", 4100, 20),
    ("Hair", "Argan Oil", 5600, 22),
    ("Hair", "Silk Scrunchie Set", 1500, 45),
    ("Tools", "Tweezer Pro", 3400, 12),
    ("Tools", "Makeup Sponge", 700, 90),
];

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init();

    let db_path = parse_db_path().unwrap_or_else(|| "./beacon.db".to_string());

    let db = match Database::connect(DbConfig::new(&db_path)).await {
        Ok(db) => db,
        Err(err) => {
            error!(path = %db_path, error = %err, "cannot open database");
            std::process::exit(1);
        }
    };

    let products = db.products();
    let today = Utc::now().date_naive();
    let mut taken = match products.list_codes().await {
        Ok(codes) => codes,
        Err(err) => {
            error!(error = %err, "cannot read existing codes");
            std::process::exit(1);
        }
    };

    let mut inserted = 0usize;
    for (index, &(category, name, cost_cents, stock)) in CATALOG.iter().enumerate() {
        let sku = match generate_sku(category, name, today) {
            Ok(sku) => sku,
            Err(err) => {
                error!(name = %name, error = %err, "skipping unsluggable product");
                continue;
            }
        };
        if taken.contains(&sku.code) {
            info!(sku = %sku.code, "already seeded, skipping");
            continue;
        }

        // Entropy the same way receipts get theirs: wall clock, salted per
        // row so same-second runs don't collide.
        let seed =
            Utc::now().timestamp_nanos_opt().unwrap_or(0) as u64 ^ ((index as u64) << 32);
        let barcode = match generate_barcode(&taken, seed) {
            Ok(code) => code,
            Err(err) => {
                error!(name = %name, error = %err, "barcode generation failed");
                continue;
            }
        };

        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            sku: sku.code.as_str().to_string(),
            barcode: barcode.as_str().to_string(),
            name: name.to_string(),
            category: category.to_string(),
            cost_cents,
            current_stock: stock,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        match products.insert(&product).await {
            Ok(()) => {
                taken.insert(sku.code);
                taken.insert(barcode);
                inserted += 1;
            }
            Err(err) => error!(name = %name, error = %err, "insert failed"),
        }
    }

    info!(inserted, path = %db_path, "seed complete");
}

fn parse_db_path() -> Option<String> {
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--db" {
            return args.next();
        }
    }
    None
}
