//! `/api/Paper` routes: catalog, properties and stock.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, patch};
use axum::{Json, Router};
use serde::Deserialize;

use crate::dto::{
    PagedResponse, PaperCreateModel, PaperDto, PropertyCreateModel, PropertyDto,
    PropertySummaryDto,
};
use crate::error::ApiResult;
use crate::routes::{AppJson, AppPath, AppQuery};
use crate::AppState;
use ream_core::validation::{
    parse_property_filter, validate_page, validate_page_size, validate_price_range,
    validate_search_query,
};
use ream_core::{CatalogSort, CoreError, FilterType, PaperQuery, RestockRequest, DEFAULT_PAGE_SIZE};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/Paper", get(list_papers).post(create_papers))
        .route("/api/Paper/property", get(list_properties).post(create_property))
        .route("/api/Paper/discontinue", patch(discontinue_many))
        .route("/api/Paper/{id}/discontinue", patch(discontinue_one))
        .route("/api/Paper/restock", patch(restock_many))
        .route("/api/Paper/{id}/restock", patch(restock_one))
}

// =============================================================================
// Catalog
// =============================================================================

/// Raw catalog query string. Everything is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogParams {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub search: Option<String>,
    pub discontinued: Option<bool>,
    pub order_by: Option<String>,
    /// Sort direction, `asc` or `desc`.
    pub sort_by: Option<String>,
    /// Comma-separated property ids.
    pub filter: Option<String>,
    pub filter_type: Option<String>,
    pub price_min: Option<i64>,
    pub price_max: Option<i64>,
}

impl CatalogParams {
    /// Validates the raw parameters into a catalog query.
    pub fn into_query(self) -> ApiResult<PaperQuery> {
        let page = validate_page(self.page.unwrap_or(1))?;
        let page_size = validate_page_size(self.page_size.unwrap_or(i64::from(DEFAULT_PAGE_SIZE)))?;
        let search = validate_search_query(self.search.as_deref())?;

        let property_ids = match self.filter.as_deref() {
            Some(raw) => parse_property_filter(raw)?,
            None => Vec::new(),
        };

        let filter_type = match self.filter_type.as_deref().map(str::trim) {
            None | Some("") => FilterType::default(),
            Some(raw) => FilterType::parse(raw).ok_or_else(|| {
                CoreError::invalid(format!("filterType must be 'and' or 'or', got '{raw}'"))
            })?,
        };

        validate_price_range(self.price_min, self.price_max)?;

        Ok(PaperQuery {
            page,
            page_size,
            search,
            discontinued: self.discontinued,
            sort: CatalogSort::parse(self.order_by.as_deref(), self.sort_by.as_deref()),
            property_ids,
            filter_type,
            price_min: self.price_min,
            price_max: self.price_max,
        })
    }
}

async fn list_papers(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<CatalogParams>,
) -> ApiResult<Json<PagedResponse<PaperDto>>> {
    let query = params.into_query()?;
    let page = state.catalog().list_papers(&query).await?;

    Ok(Json(PagedResponse::from_page(page, query.page_size, query.page)))
}

async fn create_papers(
    State(state): State<AppState>,
    AppJson(models): AppJson<Vec<PaperCreateModel>>,
) -> ApiResult<(StatusCode, Json<Vec<PaperDto>>)> {
    let created = state.catalog().create_papers(&models).await?;

    Ok((
        StatusCode::CREATED,
        Json(created.into_iter().map(PaperDto::from).collect()),
    ))
}

// =============================================================================
// Properties
// =============================================================================

async fn list_properties(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<PropertySummaryDto>>> {
    let properties = state.catalog().list_properties().await?;
    Ok(Json(properties.into_iter().map(PropertySummaryDto::from).collect()))
}

async fn create_property(
    State(state): State<AppState>,
    AppJson(model): AppJson<PropertyCreateModel>,
) -> ApiResult<(StatusCode, Json<PropertyDto>)> {
    let property = state.catalog().create_property(&model).await?;
    Ok((StatusCode::CREATED, Json(PropertyDto::from(property))))
}

// =============================================================================
// Stock
// =============================================================================

async fn discontinue_many(
    State(state): State<AppState>,
    AppJson(ids): AppJson<Vec<i64>>,
) -> ApiResult<StatusCode> {
    state.inventory().discontinue(&ids).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn discontinue_one(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> ApiResult<StatusCode> {
    state.inventory().discontinue_one(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn restock_many(
    State(state): State<AppState>,
    AppJson(requests): AppJson<Vec<RestockRequest>>,
) -> ApiResult<StatusCode> {
    state.inventory().restock(&requests).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
struct RestockParams {
    amount: i32,
}

async fn restock_one(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
    AppQuery(params): AppQuery<RestockParams>,
) -> ApiResult<StatusCode> {
    state.inventory().restock_one(id, params.amount).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ream_core::{SortField, SortOrder};

    #[test]
    fn test_defaults() {
        let query = CatalogParams::default().into_query().unwrap();
        assert_eq!(query, PaperQuery::default());
    }

    #[test]
    fn test_full_parameter_set() {
        let params = CatalogParams {
            page: Some(2),
            page_size: Some(25),
            search: Some("  kraft ".to_string()),
            discontinued: Some(false),
            order_by: Some("Price".to_string()),
            sort_by: Some("desc".to_string()),
            filter: Some("3,1".to_string()),
            filter_type: Some("AND".to_string()),
            price_min: Some(100),
            price_max: Some(900),
        };

        let query = params.into_query().unwrap();
        assert_eq!(query.page, 2);
        assert_eq!(query.page_size, 25);
        assert_eq!(query.search.as_deref(), Some("kraft"));
        assert_eq!(query.sort.field, SortField::Price);
        assert_eq!(query.sort.order, SortOrder::Desc);
        assert_eq!(query.property_ids, vec![3, 1]);
        assert_eq!(query.filter_type, FilterType::And);
    }

    #[test]
    fn test_rejections() {
        let bad = [
            CatalogParams {
                page: Some(0),
                ..Default::default()
            },
            CatalogParams {
                page_size: Some(1001),
                ..Default::default()
            },
            CatalogParams {
                filter: Some("1,x".to_string()),
                ..Default::default()
            },
            CatalogParams {
                filter_type: Some("xor".to_string()),
                ..Default::default()
            },
            CatalogParams {
                price_min: Some(500),
                price_max: Some(100),
                ..Default::default()
            },
        ];

        for params in bad {
            assert!(params.into_query().is_err());
        }
    }

    #[test]
    fn test_unknown_order_by_falls_back_to_id() {
        let query = CatalogParams {
            order_by: Some("colour".to_string()),
            sort_by: Some("desc".to_string()),
            ..Default::default()
        }
        .into_query()
        .unwrap();

        assert_eq!(query.sort.field, SortField::Id);
        assert_eq!(query.sort.order, SortOrder::Asc);
    }
}
