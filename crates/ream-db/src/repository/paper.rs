//! # Paper Repository
//!
//! Database operations for papers: the catalog listing, creation and the
//! two stock mutations (restock writes and discontinue).
//!
//! ## Catalog Query
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    How a Catalog Page Is Built                          │
//! │                                                                         │
//! │  PaperQuery { search, discontinued, properties, price, sort, page }    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  WHERE  name LIKE '%term%'            (search, case-insensitive)        │
//! │    AND  discontinued = ?              (tri-state, skipped when None)    │
//! │    AND  price_cents BETWEEN ...       (each bound optional, inclusive)  │
//! │    AND  property filter               (see below)                       │
//! │       │                                                                 │
//! │       ├──► SELECT COUNT(*)            → total_items                     │
//! │       │                                                                 │
//! │       └──► ORDER BY <field> <dir>, id ASC                               │
//! │            LIMIT page_size OFFSET (page - 1) * page_size                │
//! │                 │                                                       │
//! │                 ▼                                                       │
//! │            attach properties for the page's papers                      │
//! │                                                                         │
//! │  Property filter:                                                       │
//! │    OR  → EXISTS a link to any selected property                         │
//! │    AND → COUNT(DISTINCT linked selected properties) = #selected         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Both queries run in one read transaction so the count and the page see
//! the same snapshot.

use std::collections::HashMap;

use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, warn};

use super::{push_id_list, BIND_CHUNK};
use crate::error::DbResult;
use ream_core::inventory::StockChange;
use ream_core::{FilterType, NewPaper, Page, Paper, PaperQuery, Property, SortField, SortOrder};

const PAPER_COLUMNS: &str = "p.id, p.name, p.price_cents, p.stock, p.discontinued";

/// Repository for paper database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = PaperRepository::new(pool);
///
/// let papers = repo.find_by_ids(&[7, 9]).await?;
/// let paper = repo.get_by_id(7).await?;
/// ```
#[derive(Debug, Clone)]
pub struct PaperRepository {
    pool: SqlitePool,
}

impl PaperRepository {
    /// Creates a new PaperRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PaperRepository { pool }
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// Lists one page of the filtered, sorted catalog.
    ///
    /// Read-only. Paging values are assumed validated; a page past the end
    /// returns no items and the real total.
    pub async fn list(&self, query: &PaperQuery) -> DbResult<Page<Paper>> {
        debug!(
            page = query.page,
            page_size = query.page_size,
            search = ?query.search_term(),
            discontinued = ?query.discontinued,
            properties = ?query.property_ids,
            filter_type = ?query.filter_type,
            "Listing catalog"
        );

        let mut tx = self.pool.begin().await?;

        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM papers p");
        push_catalog_filters(&mut count, query);
        let total_items = count.build_query_scalar::<i64>().fetch_one(&mut *tx).await?;

        let mut select = QueryBuilder::<Sqlite>::new(format!("SELECT {PAPER_COLUMNS} FROM papers p"));
        push_catalog_filters(&mut select, query);
        push_catalog_order(&mut select, query);
        select
            .push(" LIMIT ")
            .push_bind(query.limit())
            .push(" OFFSET ")
            .push_bind(query.offset());
        let mut items = select.build_query_as::<Paper>().fetch_all(&mut *tx).await?;

        attach_properties(&mut tx, &mut items).await?;
        tx.commit().await?;

        debug!(total_items, returned = items.len(), "Catalog page built");
        Ok(Page { items, total_items })
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    /// Loads papers by id without their properties. Used for planning stock
    /// mutations, where only stock and the discontinued flag matter.
    pub async fn find_by_ids(&self, ids: &[i64]) -> DbResult<Vec<Paper>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = self.pool.acquire().await?;
        select_by_ids(&mut conn, ids).await
    }

    /// Returns the stored names matching any of `names`, case-insensitively.
    pub async fn existing_names(&self, names: &[String]) -> DbResult<Vec<String>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = self.pool.acquire().await?;
        let mut existing = Vec::new();

        // The column collates NOCASE, so IN compares case-insensitively.
        for chunk in names.chunks(BIND_CHUNK) {
            let mut qb = QueryBuilder::<Sqlite>::new("SELECT name FROM papers WHERE name IN (");
            let mut list = qb.separated(", ");
            for name in chunk {
                list.push_bind(name.clone());
            }
            qb.push(")");

            existing.extend(qb.build_query_scalar::<String>().fetch_all(&mut *conn).await?);
        }

        Ok(existing)
    }

    /// Total number of papers. The seed binary refuses to run on a non-empty
    /// catalog.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM papers")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Inserts papers and their property links in one transaction.
    ///
    /// Returns the created papers with properties attached, in input order.
    pub async fn insert_many(&self, papers: &[NewPaper]) -> DbResult<Vec<Paper>> {
        debug!(count = papers.len(), "Inserting papers");

        let mut tx = self.pool.begin().await?;
        let mut ids = Vec::with_capacity(papers.len());

        for paper in papers {
            let id = sqlx::query(
                "INSERT INTO papers (name, price_cents, stock, discontinued) VALUES (?1, ?2, ?3, 0)",
            )
            .bind(&paper.name)
            .bind(paper.price_cents)
            .bind(paper.stock)
            .execute(&mut *tx)
            .await?
            .last_insert_rowid();

            for property_id in &paper.property_ids {
                sqlx::query(
                    "INSERT OR IGNORE INTO paper_properties (paper_id, property_id) VALUES (?1, ?2)",
                )
                .bind(id)
                .bind(*property_id)
                .execute(&mut *tx)
                .await?;
            }

            ids.push(id);
        }

        let mut created = select_by_ids(&mut tx, &ids).await?;
        attach_properties(&mut tx, &mut created).await?;
        tx.commit().await?;

        // select_by_ids orders by id, which is insertion order here.
        Ok(created)
    }

    /// Marks papers discontinued. Re-discontinuing is a no-op.
    ///
    /// Returns the number of rows matched. Large id lists are updated in
    /// chunks inside one transaction, so the batch still lands all at once.
    pub async fn discontinue(&self, ids: &[i64]) -> DbResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        debug!(count = ids.len(), "Discontinuing papers");

        let mut tx = self.pool.begin().await?;
        let mut matched = 0;

        for chunk in ids.chunks(BIND_CHUNK) {
            let mut qb =
                QueryBuilder::<Sqlite>::new("UPDATE papers SET discontinued = 1 WHERE id IN (");
            push_id_list(&mut qb, chunk);
            qb.push(")");

            matched += qb.build().execute(&mut *tx).await?.rows_affected();
        }

        tx.commit().await?;
        Ok(matched)
    }

    /// Applies planned stock values with compare-and-set, all or nothing.
    ///
    /// Each row is written only if its stock still equals the value the plan
    /// was computed from and it is still active. Returns `false` (and writes
    /// nothing) when any row moved underneath the plan.
    pub async fn apply_stock_changes(&self, changes: &[StockChange]) -> DbResult<bool> {
        let mut tx = self.pool.begin().await?;

        for change in changes {
            let result = sqlx::query(
                "UPDATE papers SET stock = ?1 WHERE id = ?2 AND stock = ?3 AND discontinued = 0",
            )
            .bind(change.new)
            .bind(change.paper_id)
            .bind(change.previous)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                warn!(paper_id = change.paper_id, "Stock changed since planning");
                tx.rollback().await?;
                return Ok(false);
            }
        }

        tx.commit().await?;
        Ok(true)
    }
}

// =============================================================================
// Query Helpers
// =============================================================================

/// Escapes LIKE wildcards so the term matches literally.
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn push_catalog_filters(qb: &mut QueryBuilder<'_, Sqlite>, query: &PaperQuery) {
    qb.push(" WHERE 1 = 1");

    // LIKE is case-insensitive for ASCII in SQLite.
    if let Some(term) = query.search_term() {
        qb.push(" AND p.name LIKE ")
            .push_bind(like_pattern(term))
            .push(" ESCAPE '\\'");
    }

    if let Some(discontinued) = query.discontinued {
        qb.push(" AND p.discontinued = ").push_bind(discontinued);
    }

    if let Some(min) = query.price_min {
        qb.push(" AND p.price_cents >= ").push_bind(min);
    }

    if let Some(max) = query.price_max {
        qb.push(" AND p.price_cents <= ").push_bind(max);
    }

    if query.property_ids.is_empty() {
        return;
    }

    match query.filter_type {
        FilterType::Or => {
            qb.push(
                " AND EXISTS (SELECT 1 FROM paper_properties pp \
                 WHERE pp.paper_id = p.id AND pp.property_id IN (",
            );
            push_id_list(qb, &query.property_ids);
            qb.push("))");
        }
        FilterType::And => {
            let mut selected = query.property_ids.clone();
            selected.sort_unstable();
            selected.dedup();

            qb.push(
                " AND (SELECT COUNT(DISTINCT pp.property_id) FROM paper_properties pp \
                 WHERE pp.paper_id = p.id AND pp.property_id IN (",
            );
            push_id_list(qb, &selected);
            qb.push(")) = ").push_bind(selected.len() as i64);
        }
    }
}

fn push_catalog_order(qb: &mut QueryBuilder<'_, Sqlite>, query: &PaperQuery) {
    let column = match query.sort.field {
        SortField::Id => "p.id",
        SortField::Name => "p.name",
        SortField::Price => "p.price_cents",
        SortField::Stock => "p.stock",
    };
    let direction = match query.sort.order {
        SortOrder::Asc => "ASC",
        SortOrder::Desc => "DESC",
    };

    qb.push(format!(" ORDER BY {column} {direction}"));
    if query.sort.field != SortField::Id {
        qb.push(", p.id ASC");
    }
}

/// Papers among `ids`, ordered by id.
async fn select_by_ids(conn: &mut sqlx::SqliteConnection, ids: &[i64]) -> DbResult<Vec<Paper>> {
    let mut papers = Vec::new();

    for chunk in ids.chunks(BIND_CHUNK) {
        let mut qb = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {PAPER_COLUMNS} FROM papers p WHERE p.id IN ("
        ));
        push_id_list(&mut qb, chunk);
        qb.push(")");

        papers.extend(qb.build_query_as::<Paper>().fetch_all(&mut *conn).await?);
    }

    papers.sort_by_key(|p| p.id);
    Ok(papers)
}

/// Loads the properties of `papers` and attaches them, ordered by property
/// name.
async fn attach_properties(conn: &mut sqlx::SqliteConnection, papers: &mut [Paper]) -> DbResult<()> {
    let ids: Vec<i64> = papers.iter().map(|p| p.id).collect();
    let mut by_paper: HashMap<i64, Vec<Property>> = HashMap::new();

    // Each paper falls in exactly one chunk, so per-paper order survives.
    for chunk in ids.chunks(BIND_CHUNK) {
        let mut qb = QueryBuilder::<Sqlite>::new(
            "SELECT pp.paper_id, pr.id, pr.name FROM paper_properties pp \
             JOIN properties pr ON pr.id = pp.property_id WHERE pp.paper_id IN (",
        );
        push_id_list(&mut qb, chunk);
        qb.push(") ORDER BY pr.name, pr.id");

        let rows = qb
            .build_query_as::<(i64, i64, String)>()
            .fetch_all(&mut *conn)
            .await?;
        for (paper_id, id, name) in rows {
            by_paper.entry(paper_id).or_default().push(Property { id, name });
        }
    }

    for paper in papers.iter_mut() {
        paper.properties = by_paper.remove(&paper.id).unwrap_or_default();
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
impl PaperRepository {
    /// One paper with its properties.
    pub(crate) async fn get_by_id(&self, id: i64) -> DbResult<Option<Paper>> {
        let mut conn = self.pool.acquire().await?;
        let mut papers = select_by_ids(&mut conn, &[id]).await?;
        attach_properties(&mut conn, &mut papers).await?;
        Ok(papers.pop())
    }
}
