//! Catalog listing plus paper and property creation.

use std::collections::HashSet;

use tracing::{debug, info};

use crate::dto::{PaperCreateModel, PropertyCreateModel};
use crate::error::{ApiResult, PersistenceContext};
use ream_core::bulk::{dedupe_with_report, missing_ids};
use ream_core::validation::{
    validate_paper_name, validate_price_cents, validate_property_name, validate_stock,
};
use ream_core::{
    CoreError, NewPaper, NewProperty, Page, Paper, PaperQuery, Property, PropertySummary,
    ValidationError,
};
use ream_db::Database;

#[derive(Debug, Clone)]
pub struct CatalogService {
    db: Database,
}

impl CatalogService {
    pub fn new(db: Database) -> Self {
        CatalogService { db }
    }

    /// One filtered, sorted page of the catalog.
    pub async fn list_papers(&self, query: &PaperQuery) -> ApiResult<Page<Paper>> {
        self.db
            .papers()
            .list(query)
            .await
            .with_operation("listing papers")
    }

    /// Creates a batch of papers. One bad item rejects the batch.
    pub async fn create_papers(&self, models: &[PaperCreateModel]) -> ApiResult<Vec<Paper>> {
        debug!(count = models.len(), "Creating papers");

        if models.is_empty() {
            return Err(CoreError::invalid("At least one paper is required").into());
        }

        let mut papers = Vec::with_capacity(models.len());
        let mut seen = HashSet::new();
        for model in models {
            let name = validate_paper_name(&model.name)?;
            validate_price_cents(model.price_cents)?;
            validate_stock(model.stock)?;

            if !seen.insert(name.to_lowercase()) {
                return Err(duplicate_name(name).into());
            }

            papers.push(NewPaper {
                name,
                price_cents: model.price_cents,
                stock: model.stock,
                property_ids: dedupe_with_report(&model.property_ids).unique,
            });
        }

        let names: Vec<String> = papers.iter().map(|p| p.name.clone()).collect();
        let taken = self
            .db
            .papers()
            .existing_names(&names)
            .await
            .with_operation("checking paper names")?;
        if let Some(name) = taken.into_iter().next() {
            return Err(duplicate_name(name).into());
        }

        let mut property_ids: Vec<i64> = papers
            .iter()
            .flat_map(|p| p.property_ids.iter().copied())
            .collect();
        property_ids.sort_unstable();
        property_ids.dedup();
        self.require_properties(&property_ids).await?;

        let created = self
            .db
            .papers()
            .insert_many(&papers)
            .await
            .with_operation("creating papers")?;

        info!(count = created.len(), "Papers created");
        Ok(created)
    }

    /// Creates a property, optionally linked to existing papers.
    pub async fn create_property(&self, model: &PropertyCreateModel) -> ApiResult<Property> {
        debug!(name = %model.name, papers = ?model.paper_ids, "Creating property");

        let name = validate_property_name(&model.name)?;

        let existing = self
            .db
            .properties()
            .find_by_name(&name)
            .await
            .with_operation("checking property names")?;
        if existing.is_some() {
            return Err(CoreError::Validation(ValidationError::Duplicate {
                field: "Property".to_string(),
                value: name,
            })
            .into());
        }

        let paper_ids = dedupe_with_report(&model.paper_ids).unique;
        let found: Vec<i64> = self
            .db
            .papers()
            .find_by_ids(&paper_ids)
            .await
            .with_operation("loading papers to link")?
            .into_iter()
            .map(|p| p.id)
            .collect();
        let unknown = missing_ids(&paper_ids, &found);
        if !unknown.is_empty() {
            return Err(CoreError::invalid(format!("Unknown paper ids: {unknown:?}")).into());
        }

        let property = self
            .db
            .properties()
            .insert(&NewProperty { name, paper_ids })
            .await
            .with_operation("creating the property")?;

        info!(property_id = property.id, "Property created");
        Ok(property)
    }

    pub async fn list_properties(&self) -> ApiResult<Vec<PropertySummary>> {
        self.db
            .properties()
            .list_with_counts()
            .await
            .with_operation("listing properties")
    }

    async fn require_properties(&self, ids: &[i64]) -> ApiResult<()> {
        let found: Vec<i64> = self
            .db
            .properties()
            .find_by_ids(ids)
            .await
            .with_operation("loading properties")?
            .into_iter()
            .map(|p| p.id)
            .collect();

        let unknown = missing_ids(ids, &found);
        if !unknown.is_empty() {
            return Err(CoreError::invalid(format!("Unknown property ids: {unknown:?}")).into());
        }
        Ok(())
    }
}

fn duplicate_name(name: String) -> CoreError {
    CoreError::Validation(ValidationError::Duplicate {
        field: "Paper".to_string(),
        value: name,
    })
}
