//! # Repository Module
//!
//! Database repository implementations for the storefront.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  ream-api service                                                      │
//! │       │                                                                 │
//! │       │  db.papers().list(&query)                                      │
//! │       ▼                                                                 │
//! │  PaperRepository                                                       │
//! │  ├── list(&self, query)              catalog page + total              │
//! │  ├── find_by_ids(&self, ids)         planning reads                    │
//! │  ├── insert_many(&self, papers)      one transaction                   │
//! │  ├── discontinue(&self, ids)         single UPDATE                     │
//! │  └── apply_stock_changes(&self, ..)  compare-and-set, all or nothing   │
//! │       │                                                                 │
//! │       │  SQL                                                            │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Repositories never decide business rules. They read, and they apply   │
//! │  plans computed by ream-core, reporting when a plan went stale.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`PaperRepository`](paper::PaperRepository) - Catalog and stock writes
//! - [`PropertyRepository`](property::PropertyRepository) - Tags and paper counts
//! - [`CustomerRepository`](customer::CustomerRepository) - Customer records
//! - [`OrderRepository`](order::OrderRepository) - Orders, entries, status writes

use sqlx::{QueryBuilder, Sqlite};

pub mod customer;
pub mod order;
pub mod paper;
pub mod property;

/// Most ids bound into a single `IN (...)` list. SQLite caps host parameters
/// per statement (32766, or 999 before 3.32), and bulk requests are
/// unbounded, so every id-list lookup walks its input in chunks of this size.
pub(crate) const BIND_CHUNK: usize = 500;

pub(crate) fn push_id_list(qb: &mut QueryBuilder<'_, Sqlite>, ids: &[i64]) {
    let mut list = qb.separated(", ");
    for id in ids {
        list.push_bind(*id);
    }
}
