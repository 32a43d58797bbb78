//! # Property Repository
//!
//! Properties are shared tags linked to papers through `paper_properties`.
//! A single join row represents both directions of the association, so a
//! link added from either side shows up on both.

use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use super::{push_id_list, BIND_CHUNK};
use crate::error::DbResult;
use ream_core::{NewProperty, Property, PropertySummary};

#[derive(Debug, Clone)]
pub struct PropertyRepository {
    pool: SqlitePool,
}

impl PropertyRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PropertyRepository { pool }
    }

    /// Every property ordered by name, with how many papers carry it.
    pub async fn list_with_counts(&self) -> DbResult<Vec<PropertySummary>> {
        let properties = sqlx::query_as::<_, PropertySummary>(
            r#"
            SELECT pr.id, pr.name, COUNT(pp.paper_id) AS paper_count
            FROM properties pr
            LEFT JOIN paper_properties pp ON pp.property_id = pr.id
            GROUP BY pr.id, pr.name
            ORDER BY pr.name, pr.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(properties)
    }

    /// Loads properties by id, ordered by id. Unknown ids are skipped.
    pub async fn find_by_ids(&self, ids: &[i64]) -> DbResult<Vec<Property>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = self.pool.acquire().await?;
        let mut properties = Vec::new();

        for chunk in ids.chunks(BIND_CHUNK) {
            let mut qb =
                QueryBuilder::<Sqlite>::new("SELECT id, name FROM properties WHERE id IN (");
            push_id_list(&mut qb, chunk);
            qb.push(")");

            properties.extend(qb.build_query_as::<Property>().fetch_all(&mut *conn).await?);
        }

        properties.sort_by_key(|p| p.id);
        Ok(properties)
    }

    /// Looks up a property by name, case-insensitively.
    pub async fn find_by_name(&self, name: &str) -> DbResult<Option<Property>> {
        let property = sqlx::query_as::<_, Property>("SELECT id, name FROM properties WHERE name = ?1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        Ok(property)
    }

    /// Inserts a property and links it to `paper_ids` in one transaction.
    pub async fn insert(&self, property: &NewProperty) -> DbResult<Property> {
        debug!(name = %property.name, papers = ?property.paper_ids, "Inserting property");

        let mut tx = self.pool.begin().await?;

        let id = sqlx::query("INSERT INTO properties (name) VALUES (?1)")
            .bind(&property.name)
            .execute(&mut *tx)
            .await?
            .last_insert_rowid();

        for paper_id in &property.paper_ids {
            sqlx::query(
                "INSERT OR IGNORE INTO paper_properties (paper_id, property_id) VALUES (?1, ?2)",
            )
            .bind(*paper_id)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(Property {
            id,
            name: property.name.clone(),
        })
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM properties")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use ream_core::NewPaper;

    #[tokio::test]
    async fn test_link_is_visible_from_both_sides() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let papers = db
            .papers()
            .insert_many(&[NewPaper {
                name: "Onion Skin".to_string(),
                price_cents: 250,
                stock: 3,
                property_ids: Vec::new(),
            }])
            .await
            .unwrap();

        let thin = db
            .properties()
            .insert(&NewProperty {
                name: "Thin".to_string(),
                paper_ids: vec![papers[0].id],
            })
            .await
            .unwrap();
        db.properties()
            .insert(&NewProperty {
                name: "Acid Free".to_string(),
                paper_ids: Vec::new(),
            })
            .await
            .unwrap();

        let paper = db.papers().get_by_id(papers[0].id).await.unwrap().unwrap();
        assert_eq!(paper.properties, vec![thin.clone()]);

        let summaries = db.properties().list_with_counts().await.unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].name, "Acid Free");
        assert_eq!(summaries[0].paper_count, 0);
        assert_eq!(summaries[1].paper_count, 1);

        let found = db.properties().find_by_name("THIN").await.unwrap();
        assert_eq!(found, Some(thin));
    }

    #[tokio::test]
    async fn test_find_by_ids_skips_unknown() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let gloss = db
            .properties()
            .insert(&NewProperty {
                name: "Gloss".to_string(),
                paper_ids: Vec::new(),
            })
            .await
            .unwrap();

        let found = db.properties().find_by_ids(&[gloss.id, 99]).await.unwrap();
        assert_eq!(found, vec![gloss]);
        assert_eq!(db.properties().count().await.unwrap(), 1);
    }
}
