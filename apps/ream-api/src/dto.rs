//! # View Projection
//!
//! Request and response shapes of the HTTP contract. Domain types never
//! cross the wire directly; every response is projected here so storage
//! details (join rows, snake_case columns) stay internal.
//!
//! TypeScript bindings for the storefront client are exported by ts-rs
//! when the test suite runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use ream_core::{
    Customer, Order, OrderEntry, OrderLine, OrderStatus, Page, PagingInfo, Paper, Property,
    PropertySummary,
};

// =============================================================================
// Catalog
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PaperDto {
    pub id: i64,
    pub name: String,
    pub price_cents: i64,
    pub stock: i32,
    pub discontinued: bool,
    pub properties: Vec<PropertyDto>,
}

impl From<Paper> for PaperDto {
    fn from(paper: Paper) -> Self {
        PaperDto {
            id: paper.id,
            name: paper.name,
            price_cents: paper.price_cents,
            stock: paper.stock,
            discontinued: paper.discontinued,
            properties: paper.properties.into_iter().map(PropertyDto::from).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDto {
    pub id: i64,
    pub name: String,
}

impl From<Property> for PropertyDto {
    fn from(property: Property) -> Self {
        PropertyDto {
            id: property.id,
            name: property.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PropertySummaryDto {
    pub id: i64,
    pub name: String,
    pub paper_count: i64,
}

impl From<PropertySummary> for PropertySummaryDto {
    fn from(summary: PropertySummary) -> Self {
        PropertySummaryDto {
            id: summary.id,
            name: summary.name,
            paper_count: summary.paper_count,
        }
    }
}

/// Body item of `POST /api/Paper`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PaperCreateModel {
    pub name: String,
    pub price_cents: i64,
    pub stock: i32,
    #[serde(default)]
    pub property_ids: Vec<i64>,
}

/// Body of `POST /api/Paper/property`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PropertyCreateModel {
    pub name: String,
    #[serde(default)]
    pub paper_ids: Vec<i64>,
}

// =============================================================================
// Orders
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderDto {
    pub id: i64,
    pub customer_id: i64,
    #[ts(as = "String")]
    pub order_date: DateTime<Utc>,
    #[ts(as = "String")]
    pub delivery_date: DateTime<Utc>,
    pub status: OrderStatus,
    pub total_amount_cents: i64,
    pub order_entries: Vec<OrderEntryDto>,
}

impl From<Order> for OrderDto {
    fn from(order: Order) -> Self {
        OrderDto {
            id: order.id,
            customer_id: order.customer_id,
            order_date: order.order_date,
            delivery_date: order.delivery_date,
            status: order.status,
            total_amount_cents: order.total_amount_cents,
            order_entries: order.entries.into_iter().map(OrderEntryDto::from).collect(),
        }
    }
}

/// An order line priced from the snapshot taken at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderEntryDto {
    pub id: i64,
    pub product_id: i64,
    pub quantity: i32,
    pub unit_price_cents: i64,
    pub line_total_cents: i64,
}

impl From<OrderEntry> for OrderEntryDto {
    fn from(entry: OrderEntry) -> Self {
        OrderEntryDto {
            id: entry.id,
            product_id: entry.product_id,
            quantity: entry.quantity,
            unit_price_cents: entry.unit_price_cents,
            line_total_cents: entry.line_total().cents(),
        }
    }
}

/// Body of `POST /api/Order`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreateModel {
    pub customer_id: i64,
    pub order_entries: Vec<OrderLine>,
}

// =============================================================================
// Customers
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDto {
    pub id: i64,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    /// Present only when the caller asked for order history.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub orders: Option<Vec<OrderDto>>,
}

impl CustomerDto {
    pub fn new(customer: Customer, orders: Option<Vec<Order>>) -> Self {
        CustomerDto {
            id: customer.id,
            name: customer.name,
            address: customer.address,
            phone: customer.phone,
            email: customer.email,
            orders: orders.map(|orders| orders.into_iter().map(OrderDto::from).collect()),
        }
    }
}

// =============================================================================
// Paging
// =============================================================================

/// A page of items plus the paging metadata the client renders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PagedResponse<T> {
    pub items: Vec<T>,
    pub paging_info: PagingInfo,
}

impl<T> PagedResponse<T> {
    /// Projects a store page into a response.
    pub fn from_page<U>(page: Page<U>, page_size: u32, current_page: u32) -> Self
    where
        U: Into<T>,
    {
        PagedResponse {
            paging_info: PagingInfo::new(page.total_items, page_size, current_page),
            items: page.items.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_paper_projection_is_camel_case() {
        let paper = Paper {
            id: 7,
            name: "A4 Copy".to_string(),
            price_cents: 499,
            stock: 3,
            discontinued: false,
            properties: vec![Property {
                id: 1,
                name: "A4".to_string(),
            }],
        };

        let body = serde_json::to_value(PaperDto::from(paper)).unwrap();
        assert_eq!(body["priceCents"], 499);
        assert_eq!(body["properties"][0]["name"], "A4");
    }

    #[test]
    fn test_order_entry_uses_snapshot_price() {
        let date = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let order = Order {
            id: 1,
            customer_id: 2,
            order_date: date,
            delivery_date: date,
            status: OrderStatus::Shipped,
            total_amount_cents: 1500,
            entries: vec![OrderEntry {
                id: 10,
                order_id: 1,
                product_id: 7,
                quantity: 3,
                unit_price_cents: 500,
            }],
        };

        let body = serde_json::to_value(OrderDto::from(order)).unwrap();
        assert_eq!(body["status"], "Shipped");
        assert_eq!(body["orderEntries"][0]["lineTotalCents"], 1500);
    }

    #[test]
    fn test_customer_orders_omitted_unless_requested() {
        let customer = Customer {
            id: 1,
            name: "Ada Stationers".to_string(),
            address: None,
            phone: None,
            email: None,
        };

        let body = serde_json::to_value(CustomerDto::new(customer.clone(), None)).unwrap();
        assert!(body.get("orders").is_none());

        let body = serde_json::to_value(CustomerDto::new(customer, Some(Vec::new()))).unwrap();
        assert_eq!(body["orders"], serde_json::json!([]));
    }

    #[test]
    fn test_paged_response_past_last_page() {
        let page: Page<Property> = Page {
            items: Vec::new(),
            total_items: 21,
        };

        let response: PagedResponse<PropertyDto> = PagedResponse::from_page(page, 10, 9);
        assert!(response.items.is_empty());
        assert_eq!(response.paging_info.total_pages, 3);
        assert_eq!(response.paging_info.current_page, 9);
    }
}
