//! # Domain Types
//!
//! Core domain types used throughout the storefront.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐  many-to-many  ┌─────────────────┐                │
//! │  │     Paper       │◄──────────────►│    Property     │                │
//! │  │  id, name       │                │  id, name       │                │
//! │  │  price_cents    │                └─────────────────┘                │
//! │  │  stock          │                                                    │
//! │  │  discontinued   │                                                    │
//! │  └────────▲────────┘                                                    │
//! │           │ product_id                                                  │
//! │  ┌────────┴────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   OrderEntry    │──►│     Order       │──►│    Customer     │       │
//! │  │  quantity       │   │  status         │   │  name, contact  │       │
//! │  │  unit_price     │   │  total_amount   │   └─────────────────┘       │
//! │  └─────────────────┘   └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Ids are store-assigned positive integers. A non-positive id never exists.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Paper
// =============================================================================

/// A sellable paper product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Paper {
    /// Store-assigned identifier.
    pub id: i64,

    /// Display name, unique case-insensitively.
    pub name: String,

    /// Price in cents (always > 0).
    pub price_cents: i64,

    /// Units on hand (never negative).
    pub stock: i32,

    /// One-way flag: once set the paper can neither be ordered nor restocked.
    pub discontinued: bool,

    /// Associated properties, loaded separately from the join table.
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    #[serde(default)]
    pub properties: Vec<Property>,
}

impl Paper {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Checks if `quantity` units can be sold right now.
    pub fn can_fulfil(&self, quantity: i32) -> bool {
        !self.discontinued && quantity <= self.stock
    }
}

// =============================================================================
// Property
// =============================================================================

/// A tag shared across many papers ("A4", "Recycled", "120gsm", ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub id: i64,
    pub name: String,
}

/// A property together with the number of papers carrying it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PropertySummary {
    pub id: i64,
    pub name: String,
    pub paper_count: i64,
}

// =============================================================================
// Customer
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

// =============================================================================
// Order Status
// =============================================================================

/// Lifecycle of an order: `Pending → Shipped → Delivered`.
///
/// ## Transitions
/// ```text
/// Pending ──► Shipped ──► Delivered
///    │                        ▲
///    └────────────────────────┘
/// ```
/// Moving forward (including skipping `Shipped`) and re-applying the current
/// status are allowed. Moving backwards is not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
pub enum OrderStatus {
    /// Created, stock already reserved.
    Pending,
    /// Handed to the carrier.
    Shipped,
    /// Terminal.
    Delivered,
}

impl OrderStatus {
    /// Every status in lifecycle order.
    pub const ALL: [OrderStatus; 3] = [
        OrderStatus::Pending,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
    ];

    /// Position in the lifecycle.
    const fn rank(self) -> u8 {
        match self {
            OrderStatus::Pending => 0,
            OrderStatus::Shipped => 1,
            OrderStatus::Delivered => 2,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Delivered => "Delivered",
        }
    }

    /// Returns true if an order in `self` may be set to `next`.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        next.rank() >= self.rank()
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "status".to_string(),
                allowed: OrderStatus::ALL.iter().map(|s| s.to_string()).collect(),
            })
    }
}

// =============================================================================
// Order
// =============================================================================

/// A customer order. `total_amount_cents` is computed once at creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: i64,
    pub customer_id: i64,
    #[ts(as = "String")]
    pub order_date: DateTime<Utc>,
    #[ts(as = "String")]
    pub delivery_date: DateTime<Utc>,
    pub status: OrderStatus,
    pub total_amount_cents: i64,
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    #[serde(default)]
    pub entries: Vec<OrderEntry>,
}

impl Order {
    #[inline]
    pub fn total_amount(&self) -> Money {
        Money::from_cents(self.total_amount_cents)
    }
}

/// A line of an order.
///
/// Uses the snapshot pattern: the unit price is frozen when the order is
/// created, so later price changes never alter historical totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderEntry {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: i32,
    /// Unit price in cents at time of order (frozen).
    pub unit_price_cents: i64,
}

impl OrderEntry {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Line total (unit price × quantity). Bounded by the checked total
    /// computed at creation, so it cannot overflow for persisted entries.
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.unit_price_cents * i64::from(self.quantity))
    }
}

// =============================================================================
// Command Inputs
// =============================================================================

/// One line of a bulk restock request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RestockRequest {
    pub paper_id: i64,
    pub amount: i32,
}

/// One requested line of a new order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: i64,
    pub quantity: i32,
}

/// A validated paper ready to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPaper {
    pub name: String,
    pub price_cents: i64,
    pub stock: i32,
    pub property_ids: Vec<i64>,
}

/// A validated property ready to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProperty {
    pub name: String,
    pub paper_ids: Vec<i64>,
}

/// A customer ready to be inserted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewCustomer {
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

// =============================================================================
// Catalog Query
// =============================================================================

/// Column the catalog is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum SortField {
    #[default]
    Id,
    Name,
    Price,
    Stock,
}

/// Direction of the catalog ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// How multiple selected properties combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum FilterType {
    /// The paper must carry every selected property.
    And,
    /// The paper must carry at least one selected property.
    #[default]
    Or,
}

impl FilterType {
    /// Parses a filter type, case-insensitively. Unknown values are `None`.
    pub fn parse(raw: &str) -> Option<FilterType> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "and" => Some(FilterType::And),
            "or" => Some(FilterType::Or),
            _ => None,
        }
    }
}

/// Resolved ordering of the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CatalogSort {
    pub field: SortField,
    pub order: SortOrder,
}

impl CatalogSort {
    /// Resolves the raw `orderBy` / `sortBy` query values.
    ///
    /// An unknown `order_by` falls back to Id ascending whatever the
    /// direction says. An unknown direction means ascending.
    pub fn parse(order_by: Option<&str>, sort_order: Option<&str>) -> CatalogSort {
        let field = match order_by.map(|s| s.trim().to_ascii_lowercase()) {
            None => Some(SortField::Id),
            Some(raw) => match raw.as_str() {
                "" | "id" => Some(SortField::Id),
                "name" => Some(SortField::Name),
                "price" => Some(SortField::Price),
                "stock" => Some(SortField::Stock),
                _ => None,
            },
        };

        let Some(field) = field else {
            return CatalogSort::default();
        };

        let order = match sort_order.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("desc") => SortOrder::Desc,
            _ => SortOrder::Asc,
        };

        CatalogSort { field, order }
    }
}

/// A validated catalog listing request.
///
/// Paging values are assumed in range; the HTTP layer rejects the rest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaperQuery {
    /// 1-based page number.
    pub page: u32,
    pub page_size: u32,
    /// Case-insensitive substring of the name; empty means no filter.
    pub search: Option<String>,
    /// `None` lists both active and discontinued papers.
    pub discontinued: Option<bool>,
    pub sort: CatalogSort,
    /// Selected properties; empty means no property filter.
    pub property_ids: Vec<i64>,
    pub filter_type: FilterType,
    /// Inclusive lower price bound in cents.
    pub price_min: Option<i64>,
    /// Inclusive upper price bound in cents.
    pub price_max: Option<i64>,
}

impl Default for PaperQuery {
    fn default() -> Self {
        PaperQuery {
            page: 1,
            page_size: crate::DEFAULT_PAGE_SIZE,
            search: None,
            discontinued: None,
            sort: CatalogSort::default(),
            property_ids: Vec::new(),
            filter_type: FilterType::default(),
            price_min: None,
            price_max: None,
        }
    }
}

impl PaperQuery {
    /// Rows skipped before the requested page.
    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.page_size)
    }

    /// Rows taken for the requested page.
    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }

    /// The trimmed search term, if any.
    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
    }
}

// =============================================================================
// Paging
// =============================================================================

/// One page of results plus the size of the filtered set.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_items: i64,
}

/// Pagination metadata returned alongside a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PagingInfo {
    pub total_items: i64,
    pub items_per_page: u32,
    pub current_page: u32,
    pub total_pages: i64,
}

impl PagingInfo {
    /// Builds paging metadata; `total_pages = ceil(total_items / page_size)`.
    pub fn new(total_items: i64, items_per_page: u32, current_page: u32) -> Self {
        let per_page = i64::from(items_per_page.max(1));
        let total_items = total_items.max(0);
        PagingInfo {
            total_items,
            items_per_page,
            current_page,
            total_pages: (total_items + per_page - 1) / per_page,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_transitions() {
        use OrderStatus::*;
        assert!(Pending.can_transition_to(Shipped));
        assert!(Pending.can_transition_to(Delivered));
        assert!(Shipped.can_transition_to(Delivered));
        assert!(Shipped.can_transition_to(Shipped));
        assert!(!Delivered.can_transition_to(Pending));
        assert!(!Shipped.can_transition_to(Pending));
        assert!(!Delivered.can_transition_to(Shipped));
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!("pending".parse::<OrderStatus>().unwrap(), OrderStatus::Pending);
        assert_eq!(" Shipped ".parse::<OrderStatus>().unwrap(), OrderStatus::Shipped);
        assert_eq!("DELIVERED".parse::<OrderStatus>().unwrap(), OrderStatus::Delivered);
        assert!("lost".parse::<OrderStatus>().is_err());
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
    }

    #[test]
    fn test_catalog_sort_parsing() {
        let sort = CatalogSort::parse(Some("Price"), Some("DESC"));
        assert_eq!(sort.field, SortField::Price);
        assert_eq!(sort.order, SortOrder::Desc);

        let sort = CatalogSort::parse(Some("name"), Some("sideways"));
        assert_eq!(sort.order, SortOrder::Asc);

        // Unknown column ignores the requested direction.
        let sort = CatalogSort::parse(Some("colour"), Some("desc"));
        assert_eq!(sort, CatalogSort { field: SortField::Id, order: SortOrder::Asc });

        assert_eq!(CatalogSort::parse(None, None), CatalogSort::default());
    }

    #[test]
    fn test_paging_info() {
        assert_eq!(PagingInfo::new(0, 10, 1).total_pages, 0);
        assert_eq!(PagingInfo::new(10, 10, 1).total_pages, 1);
        assert_eq!(PagingInfo::new(11, 10, 1).total_pages, 2);
        assert_eq!(PagingInfo::new(1, 1000, 1).total_pages, 1);
        for total in 0..50_i64 {
            for size in 1..12_u32 {
                let info = PagingInfo::new(total, size, 1);
                let expected = (total as f64 / size as f64).ceil() as i64;
                assert_eq!(info.total_pages, expected);
            }
        }
    }

    #[test]
    fn test_query_offsets() {
        let query = PaperQuery {
            page: 3,
            page_size: 25,
            ..PaperQuery::default()
        };
        assert_eq!(query.offset(), 50);
        assert_eq!(query.limit(), 25);

        let query = PaperQuery {
            search: Some("   ".to_string()),
            ..PaperQuery::default()
        };
        assert_eq!(query.search_term(), None);
    }

    #[test]
    fn test_paper_can_fulfil() {
        let mut paper = Paper {
            id: 7,
            name: "A4 Copy".to_string(),
            price_cents: 499,
            stock: 3,
            discontinued: false,
            properties: Vec::new(),
        };
        assert!(paper.can_fulfil(3));
        assert!(!paper.can_fulfil(5));
        paper.discontinued = true;
        assert!(!paper.can_fulfil(1));
    }

    #[test]
    fn test_entry_line_total() {
        let entry = OrderEntry {
            id: 1,
            order_id: 1,
            product_id: 7,
            quantity: 4,
            unit_price_cents: 250,
        };
        assert_eq!(entry.line_total(), Money::from_cents(1000));
    }
}
