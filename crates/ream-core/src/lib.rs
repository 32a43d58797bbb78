//! # ream-core: Pure Domain Logic for the Ream Storefront
//!
//! Every stock and order rule of the storefront lives here as a pure
//! function. Nothing in this crate touches the database or the network.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Ream Architecture                               │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Storefront client (out of scope)                   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ HTTP /api/...                          │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 ream-api (routes + services)                    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                ★ ream-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌───────────┐ ┌──────────────┐     │   │
//! │  │   │  types   │ │   bulk   │ │ inventory │ │   ordering   │     │   │
//! │  │   │ Paper    │ │ dedupe   │ │ restock   │ │ order plan   │     │   │
//! │  │   │ Order    │ │ valid ids│ │ discont.  │ │ status FSM   │     │   │
//! │  │   └──────────┘ └──────────┘ └───────────┘ └──────────────┘     │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 ream-db (SQLite repositories)                   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Entities (Paper, Property, Customer, Order) and query types
//! - [`money`] - Integer-cent money
//! - [`error`] - Domain error taxonomy
//! - [`validation`] - Field-level input validation
//! - [`bulk`] - Shared id normalisation for bulk operations
//! - [`inventory`] - Restock and discontinue planning
//! - [`ordering`] - Order planning and the status state machine

// =============================================================================
// Module Declarations
// =============================================================================

pub mod bulk;
pub mod error;
pub mod inventory;
pub mod money;
pub mod ordering;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ErrorKind, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Upper bound for a paper's stock. Restocking clamps here instead of
/// wrapping.
pub const MAX_STOCK: i32 = i32::MAX;

/// Largest page a catalog or order listing may request.
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Page size used when the caller does not specify one.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Days between order creation and the promised delivery date.
pub const DEFAULT_DELIVERY_DAYS: u32 = 3;

/// Longest delivery promise the service may be configured with (ten years).
pub const MAX_DELIVERY_DAYS: u32 = 3650;

/// Paper name length bounds (characters, after trimming).
pub const PAPER_NAME_MIN: usize = 2;
pub const PAPER_NAME_MAX: usize = 255;

/// Property name length bounds (characters, after trimming).
pub const PROPERTY_NAME_MIN: usize = 2;
pub const PROPERTY_NAME_MAX: usize = 255;
