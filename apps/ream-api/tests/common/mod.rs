//! Shared fixtures for the ream-api integration tests.

#![allow(dead_code)]

use std::path::Path;

use ream_api::{ApiConfig, AppState};
use ream_core::{
    Customer, NewCustomer, NewPaper, NewProperty, Paper, PaperQuery, Property, MAX_PAGE_SIZE,
};
use ream_db::{Database, DbConfig};

/// Config with millisecond backoff so retry paths stay fast.
pub fn test_config() -> ApiConfig {
    let mut config = ApiConfig::default();
    config.inventory.initial_backoff_ms = 1;
    config.inventory.max_backoff_ms = 5;
    config
}

pub async fn memory_state() -> AppState {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    AppState::new(db, test_config())
}

pub async fn file_state(path: &Path) -> AppState {
    let mut config = test_config();
    config.database.path = path.to_path_buf();
    config.database.max_connections = 8;
    AppState::connect(config).await.unwrap()
}

pub async fn paper(state: &AppState, name: &str, price_cents: i64, stock: i32) -> Paper {
    paper_with_properties(state, name, price_cents, stock, &[]).await
}

pub async fn paper_with_properties(
    state: &AppState,
    name: &str,
    price_cents: i64,
    stock: i32,
    property_ids: &[i64],
) -> Paper {
    state
        .db
        .papers()
        .insert_many(&[NewPaper {
            name: name.to_string(),
            price_cents,
            stock,
            property_ids: property_ids.to_vec(),
        }])
        .await
        .unwrap()
        .remove(0)
}

pub async fn property(state: &AppState, name: &str) -> Property {
    state
        .db
        .properties()
        .insert(&NewProperty {
            name: name.to_string(),
            paper_ids: Vec::new(),
        })
        .await
        .unwrap()
}

pub async fn customer(state: &AppState, name: &str) -> Customer {
    state
        .db
        .customers()
        .insert(&NewCustomer {
            name: name.to_string(),
            ..NewCustomer::default()
        })
        .await
        .unwrap()
}

/// The stored row for `id`, without properties.
pub async fn stored_paper(state: &AppState, id: i64) -> Paper {
    state.db.papers().find_by_ids(&[id]).await.unwrap().remove(0)
}

/// The catalog view of `id`, properties attached.
pub async fn listed_paper(state: &AppState, id: i64) -> Paper {
    state
        .catalog()
        .list_papers(&PaperQuery {
            page_size: MAX_PAGE_SIZE,
            ..PaperQuery::default()
        })
        .await
        .unwrap()
        .items
        .into_iter()
        .find(|p| p.id == id)
        .unwrap()
}

pub async fn stock_of(state: &AppState, id: i64) -> i32 {
    stored_paper(state, id).await.stock
}
