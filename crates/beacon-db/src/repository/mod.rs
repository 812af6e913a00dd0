//! # Repository Module
//!
//! Database repository implementations for Beacon POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  beacon-engine (resolver / dispatcher)                                  │
//! │       │                                                                 │
//! │       │  db.products().find_by_barcode(&code)                           │
//! │       │  db.sales().record_sale(...)                                    │
//! │       ▼                                                                 │
//! │  ProductRepository / SaleRepository                                     │
//! │       │  SQL isolated here, typed errors out                            │
//! │       ▼                                                                 │
//! │  SQLite                                                                 │
//! │                                                                         │
//! │  The engine never sees SQL, and tests swap in an in-memory store       │
//! │  through the same handles.                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`product::ProductRepository`] - lookup by barcode/SKU, inventory
//!   mutation, code regeneration, soft delete
//! - [`sale::SaleRepository`] - the atomic sale transaction and ledger
//!   queries

pub mod product;
pub mod sale;
